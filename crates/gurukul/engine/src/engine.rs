//! Enrollment engine: the main entry point
//!
//! The engine coordinates the catalog, payment desk, transition table,
//! progress calculator, certificate issuer, and store. Every operation is
//! request-driven and runs to completion: read a snapshot, check
//! preconditions, commit through the store's compare-and-swap guards, and
//! only then dispatch notifications. A notification failure never rolls
//! back a committed transition.

use crate::{
    transitions, CertificateIssuer, CourseCatalog, FileStore, InMemoryEnrollmentStore, Notifier,
    PaymentDesk, PaymentPolicy, ProgressCalculator, ProgressView,
};
use gurukul_types::{
    CertificateId, Course, CourseId, Enrollment, EnrollmentError, EnrollmentId, EnrollmentResult,
    GradeResult, ItemId, ItemKind, ModuleId, NotificationEvent, Payment, PaymentId, PaymentPhase,
    PaymentProof, PaymentReviewStatus, StudentDetails, StudentId, SubmissionKind,
    VerificationDecision,
};
use crate::transitions::PaymentEvent;
use std::sync::Arc;

/// The enrollment lifecycle and progress-gating engine.
pub struct EnrollmentEngine {
    catalog: CourseCatalog,
    store: InMemoryEnrollmentStore,
    desk: PaymentDesk,
    progress: ProgressCalculator,
    issuer: CertificateIssuer,
    files: Arc<dyn FileStore>,
    notifier: Arc<dyn Notifier>,
}

impl EnrollmentEngine {
    /// Create an engine with the default payment policy.
    pub fn new(files: Arc<dyn FileStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_policy(PaymentPolicy::default(), files, notifier)
    }

    pub fn with_policy(
        policy: PaymentPolicy,
        files: Arc<dyn FileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            catalog: CourseCatalog::new(),
            store: InMemoryEnrollmentStore::new(),
            desk: PaymentDesk::new(policy),
            progress: ProgressCalculator::new(),
            issuer: CertificateIssuer::new(),
            files,
            notifier,
        }
    }

    // ── Course Catalog ───────────────────────────────────────────────

    /// Publish a course version into the catalog.
    pub fn publish_course(&self, course: Course) -> EnrollmentResult<()> {
        self.catalog.publish(course)
    }

    /// Fetch a specific published course version.
    pub fn course(&self, id: &CourseId, version: u32) -> EnrollmentResult<Course> {
        self.catalog.get(id, version)
    }

    // ── Enrollment Lifecycle ─────────────────────────────────────────

    /// Enroll a student into the latest version of a course.
    pub fn submit_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        details: StudentDetails,
        referral_code: Option<String>,
    ) -> EnrollmentResult<Enrollment> {
        validate_details(&details)?;
        let course = self.catalog.latest(&course_id)?;

        let mut enrollment = Enrollment::new(
            student_id,
            course_id,
            course.version,
            course.fee_minor,
            details,
        );
        if let Some(code) = referral_code {
            enrollment = enrollment.with_referral_code(code);
        }

        let enrollment = self.store.insert_enrollment(enrollment)?;
        tracing::info!(
            enrollment_id = %enrollment.id,
            student = %enrollment.student_id,
            course = %enrollment.course_id,
            version = enrollment.course_version,
            "Enrollment created"
        );
        Ok(enrollment)
    }

    /// Submit a bank-transfer proof for the given phase.
    ///
    /// Retrying with the same transaction id returns the existing pending
    /// record; a transaction id reused after finalization is a
    /// `DuplicateSubmission`.
    pub async fn submit_payment(
        &self,
        enrollment_id: &EnrollmentId,
        mut proof: PaymentProof,
        phase: PaymentPhase,
    ) -> EnrollmentResult<Payment> {
        self.desk.validate_proof(&proof)?;
        let snapshot = self.store.enrollment(enrollment_id)?;

        if let Some(existing) = self
            .store
            .payment_by_transaction(enrollment_id, &proof.transaction_id)?
        {
            if existing.status == PaymentReviewStatus::Submitted && existing.phase == phase {
                tracing::debug!(
                    enrollment_id = %enrollment_id,
                    payment_id = %existing.id,
                    "Duplicate submission returned existing pending record"
                );
                return Ok(existing);
            }
            return Err(EnrollmentError::DuplicateSubmission {
                transaction_id: proof.transaction_id,
            });
        }

        let next = transitions::apply(snapshot.payment_status, PaymentEvent::submission(phase))?;

        let screenshot_url = match proof.screenshot.take() {
            Some(upload) => Some(self.files.store(upload).await?),
            None => None,
        };

        let payment = Payment::submitted(enrollment_id.clone(), phase, proof, screenshot_url);
        let payment = self.store.record_submission(payment, snapshot.version, next)?;

        tracing::info!(
            enrollment_id = %enrollment_id,
            payment_id = %payment.id,
            phase = %phase,
            amount = payment.amount_minor,
            "Payment proof submitted"
        );
        Ok(payment)
    }

    /// Record an admin decision on a submitted proof.
    ///
    /// Approving a partial payment below the 10% floor fails; the admin
    /// rejects with remarks instead. Of two racing calls on the same proof
    /// exactly one wins and the other observes `AlreadyFinalized`.
    pub async fn verify_payment(
        &self,
        payment_id: &PaymentId,
        decision: VerificationDecision,
        amount_minor: Option<u64>,
        remarks: Option<String>,
    ) -> EnrollmentResult<Payment> {
        let payment = self.store.payment(payment_id)?;
        if payment.is_finalized() {
            return Err(EnrollmentError::AlreadyFinalized {
                payment: payment_id.clone(),
                status: payment.status,
            });
        }

        let snapshot = self.store.enrollment(&payment.enrollment_id)?;
        let event = PaymentEvent::decision(payment.phase, decision);
        let next = transitions::apply(snapshot.payment_status, event)?;

        // The amount credited on approval: the admin's confirmed figure,
        // falling back to the declared transfer for a partial and to the
        // outstanding balance for a full payment.
        let credited = match payment.phase {
            PaymentPhase::Partial => amount_minor.unwrap_or(payment.amount_minor),
            PaymentPhase::Full => snapshot.amount_remaining_minor(),
        };

        let rejection_remarks = match decision {
            VerificationDecision::Approve => {
                if payment.phase == PaymentPhase::Partial {
                    self.desk
                        .check_partial_floor(credited, snapshot.course_fee_minor)?;
                }
                None
            }
            VerificationDecision::Reject => Some(
                remarks
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| {
                        EnrollmentError::validation("remarks", "rejection requires remarks")
                    })?,
            ),
        };

        let phase = payment.phase;
        let finalized = self.store.finalize_payment(
            payment_id,
            snapshot.version,
            |payment, enrollment| {
                match decision {
                    VerificationDecision::Approve => {
                        payment.finalize_verified(remarks.clone());
                        enrollment.credit_payment(credited);
                        enrollment
                            .set_payment_status(next, format!("{} payment verified", phase));
                    }
                    VerificationDecision::Reject => {
                        payment.finalize_rejected(
                            rejection_remarks.clone().unwrap_or_default(),
                        );
                        enrollment
                            .set_payment_status(next, format!("{} payment rejected", phase));
                    }
                }
                Ok(payment.clone())
            },
        )?;

        tracing::info!(
            payment_id = %payment_id,
            enrollment_id = %finalized.enrollment_id,
            phase = %phase,
            decision = %decision,
            next_status = %next,
            "Payment verification recorded"
        );

        let notification = match decision {
            VerificationDecision::Approve => NotificationEvent::PaymentVerified {
                enrollment_id: finalized.enrollment_id.clone(),
                payment_id: finalized.id.clone(),
                phase,
                amount_minor: credited,
            },
            VerificationDecision::Reject => NotificationEvent::PaymentRejected {
                enrollment_id: finalized.enrollment_id.clone(),
                payment_id: finalized.id.clone(),
                phase,
                remarks: finalized.admin_remarks.clone().unwrap_or_default(),
            },
        };
        self.dispatch(&snapshot.student_id, notification).await;

        Ok(finalized)
    }

    // ── Progress ─────────────────────────────────────────────────────

    /// Record a graded submission's outcome against the enrollment.
    ///
    /// Only accepted grades advance progress. Completing an item in a
    /// locked module fails with `ModuleLocked`; repeating a completed item
    /// fails with the success-equivalent `AlreadyCompleted` and changes
    /// nothing.
    pub fn record_completion(
        &self,
        enrollment_id: &EnrollmentId,
        module_id: Option<ModuleId>,
        item_id: ItemId,
        kind: SubmissionKind,
        grade: &GradeResult,
    ) -> EnrollmentResult<ProgressView> {
        let snapshot = self.store.enrollment(enrollment_id)?;
        let course = self
            .catalog
            .get(&snapshot.course_id, snapshot.course_version)?;

        if !grade.accepted {
            tracing::debug!(
                enrollment_id = %enrollment_id,
                item = %item_id,
                "Rejected grade recorded nothing"
            );
            return Ok(self.progress.compute(&course, &snapshot));
        }

        let updated = match kind {
            SubmissionKind::Task | SubmissionKind::Quiz => {
                let module_id = module_id.ok_or_else(|| {
                    EnrollmentError::validation(
                        "module_id",
                        "task and quiz completions need their owning module",
                    )
                })?;
                let item_kind = match kind {
                    SubmissionKind::Task => ItemKind::Task,
                    _ => ItemKind::Quiz,
                };
                self.progress
                    .check_item_in_module(&course, &module_id, &item_id, item_kind)?;
                self.progress
                    .check_module_accessible(&course, &snapshot, &module_id)?;
                if snapshot.has_completed(&item_id) {
                    return Err(EnrollmentError::AlreadyCompleted { item: item_id });
                }

                self.store
                    .update_enrollment(enrollment_id, snapshot.version, |enrollment| {
                        if enrollment.has_completed(&item_id) {
                            return Err(EnrollmentError::AlreadyCompleted {
                                item: item_id.clone(),
                            });
                        }
                        match item_kind {
                            ItemKind::Task => {
                                enrollment.completed_tasks.insert(item_id.clone());
                            }
                            ItemKind::Quiz => {
                                enrollment.completed_quizzes.insert(item_id.clone());
                            }
                        }
                        enrollment.record_event(
                            "item_completed",
                            format!("{} {} completed", item_kind, item_id),
                        );

                        if let Some(module) = course.module(&module_id) {
                            let done =
                                module.gated_items().all(|i| enrollment.has_completed(i));
                            if done && enrollment.completed_modules.insert(module_id.clone()) {
                                enrollment.record_event(
                                    "module_completed",
                                    format!("module {} completed", module_id),
                                );
                            }
                        }

                        let view = self.progress.compute(&course, enrollment);
                        enrollment.progress_percent = view.progress_percent;
                        enrollment.touch();
                        Ok(enrollment.clone())
                    })?
            }
            SubmissionKind::Capstone => {
                self.progress
                    .check_capstone_accessible(&course, &snapshot, &item_id)?;
                if snapshot.capstone_passed {
                    return Err(EnrollmentError::AlreadyCompleted { item: item_id });
                }

                self.store
                    .update_enrollment(enrollment_id, snapshot.version, |enrollment| {
                        if enrollment.capstone_passed {
                            return Err(EnrollmentError::AlreadyCompleted {
                                item: item_id.clone(),
                            });
                        }
                        enrollment.capstone_passed = true;
                        enrollment.record_event(
                            "capstone_passed",
                            format!("capstone {} graded as passed", item_id),
                        );
                        enrollment.touch();
                        Ok(enrollment.clone())
                    })?
            }
        };

        let view = self.progress.compute(&course, &updated);
        tracing::info!(
            enrollment_id = %enrollment_id,
            progress = view.progress_percent,
            capstone_accessible = view.capstone_accessible,
            "Completion recorded"
        );
        Ok(view)
    }

    /// Derive the current progress view for an enrollment.
    pub fn progress(&self, enrollment_id: &EnrollmentId) -> EnrollmentResult<ProgressView> {
        let enrollment = self.store.enrollment(enrollment_id)?;
        let course = self
            .catalog
            .get(&enrollment.course_id, enrollment.course_version)?;
        Ok(self.progress.compute(&course, &enrollment))
    }

    // ── Certificate ──────────────────────────────────────────────────

    /// Issue the certificate, once, when all three conditions hold.
    ///
    /// Conditions are re-derived from live state on every call. Repeated
    /// calls return the already-issued id; of racing calls one issues and
    /// the rest observe the issued certificate.
    pub async fn issue_certificate(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> EnrollmentResult<CertificateId> {
        let snapshot = self.store.enrollment(enrollment_id)?;
        if snapshot.is_completed {
            if let Some(existing) = snapshot.certificate_id {
                return Ok(existing);
            }
        }

        let course = self
            .catalog
            .get(&snapshot.course_id, snapshot.course_version)?;
        let gaps = self.progress.certificate_gaps(&course, &snapshot);
        if !gaps.is_empty() {
            return Err(EnrollmentError::NotEligible { unmet: gaps });
        }

        let attempt =
            self.store
                .update_enrollment(enrollment_id, snapshot.version, |enrollment| {
                    if let Some(existing) = &enrollment.certificate_id {
                        return Ok((existing.clone(), false));
                    }
                    let gaps = self.progress.certificate_gaps(&course, enrollment);
                    if !gaps.is_empty() {
                        return Err(EnrollmentError::NotEligible { unmet: gaps });
                    }

                    let date = chrono::Utc::now();
                    let certificate = self.issuer.derive(&enrollment.id, date);
                    enrollment.is_completed = true;
                    enrollment.completion_date = Some(date);
                    enrollment.certificate_id = Some(certificate.clone());
                    enrollment.record_event(
                        "certificate_issued",
                        format!("certificate {} issued", certificate),
                    );
                    enrollment.touch();
                    Ok((certificate, true))
                });

        let (certificate, newly_issued) = match attempt {
            Ok(result) => result,
            // A concurrent issuance won the version race; take its result.
            Err(EnrollmentError::ConflictRetry(_)) => {
                let fresh = self.store.enrollment(enrollment_id)?;
                match fresh.certificate_id {
                    Some(existing) if fresh.is_completed => (existing, false),
                    _ => return Err(EnrollmentError::ConflictRetry(enrollment_id.clone())),
                }
            }
            Err(other) => return Err(other),
        };

        if newly_issued {
            tracing::info!(
                enrollment_id = %enrollment_id,
                certificate_id = %certificate,
                "Certificate issued"
            );
            self.dispatch(
                &snapshot.student_id,
                NotificationEvent::CertificateIssued {
                    enrollment_id: enrollment_id.clone(),
                    certificate_id: certificate.clone(),
                },
            )
            .await;
        }

        Ok(certificate)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Read an enrollment snapshot.
    pub fn enrollment(&self, id: &EnrollmentId) -> EnrollmentResult<Enrollment> {
        self.store.enrollment(id)
    }

    /// Read a payment snapshot.
    pub fn payment(&self, id: &PaymentId) -> EnrollmentResult<Payment> {
        self.store.payment(id)
    }

    /// All payments submitted for an enrollment, oldest first.
    pub fn payments_for(&self, id: &EnrollmentId) -> EnrollmentResult<Vec<Payment>> {
        self.store.payments_for(id)
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn dispatch(&self, student: &StudentId, event: NotificationEvent) {
        let name = event.event_name();
        if let Err(error) = self.notifier.notify(student, event).await {
            tracing::warn!(
                student = %student,
                event = name,
                %error,
                "Notification delivery failed"
            );
        }
    }
}

fn validate_details(details: &StudentDetails) -> EnrollmentResult<()> {
    if details.full_name.trim().is_empty() {
        return Err(EnrollmentError::validation(
            "full_name",
            "name must not be empty",
        ));
    }
    let email = details.email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(EnrollmentError::validation(
            "email",
            format!("'{}' is not a valid email address", details.email),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_validation() {
        assert!(validate_details(&StudentDetails::new("Asha", "asha@example.com")).is_ok());
        assert!(validate_details(&StudentDetails::new("", "asha@example.com")).is_err());
        assert!(validate_details(&StudentDetails::new("Asha", "not-an-email")).is_err());
        assert!(validate_details(&StudentDetails::new("Asha", "a@b")).is_err());
    }
}
