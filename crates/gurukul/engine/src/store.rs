//! In-memory enrollment and payment store
//!
//! All mutations are read-modify-write safe: callers read a snapshot, run
//! their precondition checks, then commit through a closure that the store
//! re-guards under the write lock. An enrollment mutation commits only if
//! the enrollment's `version` still matches what the caller read
//! (`ConflictRetry` otherwise), and a payment finalization commits only if
//! the record is still `Submitted` (`AlreadyFinalized` otherwise), so of
//! two racing verifications exactly one wins. Closures run against clones
//! and the result is written back only on success; a failed operation
//! leaves no persisted side effect.

use gurukul_types::{
    CourseId, Enrollment, EnrollmentError, EnrollmentId, EnrollmentResult, Payment, PaymentId,
    PaymentPhase, PaymentReviewStatus, PaymentStatus, StudentId,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store used for tests, local demos, and embedding.
#[derive(Debug, Default)]
pub struct InMemoryEnrollmentStore {
    inner: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    enrollments: HashMap<EnrollmentId, Enrollment>,
    by_student_course: HashMap<(StudentId, CourseId), EnrollmentId>,
    payments: HashMap<PaymentId, Payment>,
    by_enrollment: HashMap<EnrollmentId, Vec<PaymentId>>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Enrollments ──────────────────────────────────────────────────

    /// Insert a new enrollment, enforcing one enrollment per
    /// (student, course) pair.
    pub fn insert_enrollment(&self, enrollment: Enrollment) -> EnrollmentResult<Enrollment> {
        let mut state = self.write()?;
        let pair = (enrollment.student_id.clone(), enrollment.course_id.clone());
        if state.by_student_course.contains_key(&pair) {
            return Err(EnrollmentError::AlreadyEnrolled {
                student: pair.0,
                course: pair.1,
            });
        }
        state.by_student_course.insert(pair, enrollment.id.clone());
        state
            .enrollments
            .insert(enrollment.id.clone(), enrollment.clone());
        Ok(enrollment)
    }

    /// Read a snapshot of an enrollment.
    pub fn enrollment(&self, id: &EnrollmentId) -> EnrollmentResult<Enrollment> {
        let state = self.read()?;
        state
            .enrollments
            .get(id)
            .cloned()
            .ok_or_else(|| EnrollmentError::EnrollmentNotFound(id.clone()))
    }

    /// Look up the enrollment binding a student to a course.
    pub fn enrollment_for(
        &self,
        student: &StudentId,
        course: &CourseId,
    ) -> EnrollmentResult<Option<Enrollment>> {
        let state = self.read()?;
        Ok(state
            .by_student_course
            .get(&(student.clone(), course.clone()))
            .and_then(|id| state.enrollments.get(id))
            .cloned())
    }

    /// Apply a mutation to an enrollment, compare-and-swap on its version.
    ///
    /// The closure runs against a clone; on success the clone is committed
    /// with a bumped version, on error nothing is persisted. Fails with
    /// `ConflictRetry` if the enrollment changed since the caller read
    /// `expected_version`.
    pub fn update_enrollment<T>(
        &self,
        id: &EnrollmentId,
        expected_version: u64,
        mutate: impl FnOnce(&mut Enrollment) -> EnrollmentResult<T>,
    ) -> EnrollmentResult<T> {
        let mut state = self.write()?;
        let current = state
            .enrollments
            .get(id)
            .ok_or_else(|| EnrollmentError::EnrollmentNotFound(id.clone()))?;
        if current.version != expected_version {
            return Err(EnrollmentError::ConflictRetry(id.clone()));
        }

        let mut candidate = current.clone();
        let out = mutate(&mut candidate)?;
        candidate.version += 1;
        state.enrollments.insert(id.clone(), candidate);
        Ok(out)
    }

    // ── Payments ─────────────────────────────────────────────────────

    /// Read a snapshot of a payment.
    pub fn payment(&self, id: &PaymentId) -> EnrollmentResult<Payment> {
        let state = self.read()?;
        state
            .payments
            .get(id)
            .cloned()
            .ok_or_else(|| EnrollmentError::PaymentNotFound(id.clone()))
    }

    /// All payments submitted for an enrollment, oldest first.
    pub fn payments_for(&self, enrollment: &EnrollmentId) -> EnrollmentResult<Vec<Payment>> {
        let state = self.read()?;
        Ok(state
            .by_enrollment
            .get(enrollment)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.payments.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// The payment carrying a transaction id, if this enrollment used it.
    pub fn payment_by_transaction(
        &self,
        enrollment: &EnrollmentId,
        transaction_id: &str,
    ) -> EnrollmentResult<Option<Payment>> {
        Ok(self
            .payments_for(enrollment)?
            .into_iter()
            .find(|p| p.transaction_id == transaction_id))
    }

    /// The not-yet-reviewed payment for a phase, if any.
    pub fn pending_payment(
        &self,
        enrollment: &EnrollmentId,
        phase: PaymentPhase,
    ) -> EnrollmentResult<Option<Payment>> {
        Ok(self
            .payments_for(enrollment)?
            .into_iter()
            .find(|p| p.phase == phase && p.status == PaymentReviewStatus::Submitted))
    }

    /// Commit a payment submission together with the enrollment's move to
    /// its verification-pending state, atomically.
    ///
    /// Under the write lock this re-checks the version (`ConflictRetry`)
    /// and the transaction id: a concurrent retry that already committed
    /// the same transaction id gets the existing pending record back
    /// instead of creating a duplicate.
    pub fn record_submission(
        &self,
        payment: Payment,
        expected_version: u64,
        next_status: PaymentStatus,
    ) -> EnrollmentResult<Payment> {
        let mut state = self.write()?;
        let enrollment_id = payment.enrollment_id.clone();
        let current = state
            .enrollments
            .get(&enrollment_id)
            .ok_or_else(|| EnrollmentError::EnrollmentNotFound(enrollment_id.clone()))?;

        if let Some(existing_id) = state
            .by_enrollment
            .get(&enrollment_id)
            .into_iter()
            .flatten()
            .find(|id| {
                state
                    .payments
                    .get(*id)
                    .is_some_and(|p| p.transaction_id == payment.transaction_id)
            })
        {
            let existing = &state.payments[existing_id];
            if existing.status == PaymentReviewStatus::Submitted && existing.phase == payment.phase
            {
                return Ok(existing.clone());
            }
            return Err(EnrollmentError::DuplicateSubmission {
                transaction_id: payment.transaction_id,
            });
        }

        if current.version != expected_version {
            return Err(EnrollmentError::ConflictRetry(enrollment_id));
        }

        let mut candidate = current.clone();
        candidate.set_payment_status(
            next_status,
            format!(
                "{} payment proof {} submitted",
                payment.phase, payment.transaction_id
            ),
        );
        candidate.version += 1;
        state.enrollments.insert(enrollment_id.clone(), candidate);

        state
            .by_enrollment
            .entry(enrollment_id)
            .or_default()
            .push(payment.id.clone());
        state.payments.insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    /// Finalize a `Submitted` payment and mutate its enrollment atomically.
    ///
    /// Exactly one of any number of racing calls wins: the record's
    /// `Submitted` status is re-checked under the write lock and the losers
    /// observe `AlreadyFinalized`. The enrollment version is
    /// compare-and-swapped like `update_enrollment`.
    pub fn finalize_payment<T>(
        &self,
        payment_id: &PaymentId,
        expected_version: u64,
        mutate: impl FnOnce(&mut Payment, &mut Enrollment) -> EnrollmentResult<T>,
    ) -> EnrollmentResult<T> {
        let mut state = self.write()?;
        let payment = state
            .payments
            .get(payment_id)
            .ok_or_else(|| EnrollmentError::PaymentNotFound(payment_id.clone()))?;
        if payment.is_finalized() {
            return Err(EnrollmentError::AlreadyFinalized {
                payment: payment_id.clone(),
                status: payment.status,
            });
        }

        let enrollment_id = payment.enrollment_id.clone();
        let enrollment = state
            .enrollments
            .get(&enrollment_id)
            .ok_or_else(|| EnrollmentError::EnrollmentNotFound(enrollment_id.clone()))?;
        if enrollment.version != expected_version {
            return Err(EnrollmentError::ConflictRetry(enrollment_id));
        }

        let mut payment_candidate = payment.clone();
        let mut enrollment_candidate = enrollment.clone();
        let out = mutate(&mut payment_candidate, &mut enrollment_candidate)?;

        enrollment_candidate.version += 1;
        state
            .payments
            .insert(payment_id.clone(), payment_candidate);
        state
            .enrollments
            .insert(enrollment_id, enrollment_candidate);
        Ok(out)
    }

    pub fn enrollment_count(&self) -> usize {
        self.read().map(|s| s.enrollments.len()).unwrap_or(0)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn read(&self) -> EnrollmentResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.inner.read().map_err(|_| EnrollmentError::StorePoisoned)
    }

    fn write(&self) -> EnrollmentResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.inner.write().map_err(|_| EnrollmentError::StorePoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gurukul_types::{BankDetails, PaymentProof, StudentDetails};

    fn enrollment() -> Enrollment {
        Enrollment::new(
            StudentId::new("s1"),
            CourseId::new("c1"),
            1,
            50_000,
            StudentDetails::new("Asha Rao", "asha@example.com"),
        )
    }

    fn proof(txn: &str) -> PaymentProof {
        PaymentProof::new(
            BankDetails::new("Asha Rao", "123456789012", "HDFC0001234"),
            txn,
            6_000,
        )
    }

    #[test]
    fn second_enrollment_for_same_pair_rejected() {
        let store = InMemoryEnrollmentStore::new();
        store.insert_enrollment(enrollment()).unwrap();
        let err = store.insert_enrollment(enrollment()).unwrap_err();
        assert!(matches!(err, EnrollmentError::AlreadyEnrolled { .. }));
        assert_eq!(store.enrollment_count(), 1);
    }

    #[test]
    fn stale_version_fails_with_conflict_retry() {
        let store = InMemoryEnrollmentStore::new();
        let e = store.insert_enrollment(enrollment()).unwrap();

        // A first writer commits against version 0.
        store
            .update_enrollment(&e.id, 0, |e| {
                e.credit_payment(1_000);
                Ok(())
            })
            .unwrap();

        // A second writer still holding version 0 must be told to retry.
        let err = store
            .update_enrollment(&e.id, 0, |e| {
                e.credit_payment(1_000);
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err, EnrollmentError::ConflictRetry(e.id.clone()));

        // After re-reading, the retry succeeds.
        let fresh = store.enrollment(&e.id).unwrap();
        store
            .update_enrollment(&e.id, fresh.version, |e| {
                e.credit_payment(1_000);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn failed_mutation_persists_nothing() {
        let store = InMemoryEnrollmentStore::new();
        let e = store.insert_enrollment(enrollment()).unwrap();

        let err = store
            .update_enrollment(&e.id, 0, |e| {
                e.credit_payment(999_999);
                Err::<(), _>(EnrollmentError::validation("x", "forced failure"))
            })
            .unwrap_err();
        assert!(matches!(err, EnrollmentError::Validation { .. }));

        let after = store.enrollment(&e.id).unwrap();
        assert_eq!(after.amount_paid_minor, 0);
        assert_eq!(after.version, 0);
    }

    #[test]
    fn duplicate_transaction_id_returns_existing_pending_record() {
        let store = InMemoryEnrollmentStore::new();
        let e = store.insert_enrollment(enrollment()).unwrap();

        let first = Payment::submitted(e.id.clone(), PaymentPhase::Partial, proof("TXN-1"), None);
        let committed = store
            .record_submission(first, 0, PaymentStatus::PartialVerificationPending)
            .unwrap();

        // Retrying with the same transaction id gets the same record back.
        let retry = Payment::submitted(e.id.clone(), PaymentPhase::Partial, proof("TXN-1"), None);
        let fresh = store.enrollment(&e.id).unwrap();
        let returned = store
            .record_submission(retry, fresh.version, PaymentStatus::PartialVerificationPending)
            .unwrap();
        assert_eq!(returned.id, committed.id);
        assert_eq!(store.payments_for(&e.id).unwrap().len(), 1);
    }

    #[test]
    fn reused_transaction_id_on_finalized_payment_is_a_duplicate() {
        let store = InMemoryEnrollmentStore::new();
        let e = store.insert_enrollment(enrollment()).unwrap();

        let payment =
            Payment::submitted(e.id.clone(), PaymentPhase::Partial, proof("TXN-1"), None);
        let payment = store
            .record_submission(payment, 0, PaymentStatus::PartialVerificationPending)
            .unwrap();

        let fresh = store.enrollment(&e.id).unwrap();
        store
            .finalize_payment(&payment.id, fresh.version, |p, e| {
                p.finalize_rejected("unreadable screenshot".into());
                e.set_payment_status(PaymentStatus::Unpaid, "partial proof rejected");
                Ok(())
            })
            .unwrap();

        let fresh = store.enrollment(&e.id).unwrap();
        let retry = Payment::submitted(e.id.clone(), PaymentPhase::Partial, proof("TXN-1"), None);
        let err = store
            .record_submission(retry, fresh.version, PaymentStatus::PartialVerificationPending)
            .unwrap_err();
        assert!(matches!(err, EnrollmentError::DuplicateSubmission { .. }));
    }

    #[test]
    fn second_finalization_observes_already_finalized() {
        let store = InMemoryEnrollmentStore::new();
        let e = store.insert_enrollment(enrollment()).unwrap();
        let payment =
            Payment::submitted(e.id.clone(), PaymentPhase::Partial, proof("TXN-1"), None);
        let payment = store
            .record_submission(payment, 0, PaymentStatus::PartialVerificationPending)
            .unwrap();

        let fresh = store.enrollment(&e.id).unwrap();
        store
            .finalize_payment(&payment.id, fresh.version, |p, e| {
                p.finalize_verified(None);
                e.credit_payment(p.amount_minor);
                e.set_payment_status(PaymentStatus::PartialPaid, "partial proof verified");
                Ok(())
            })
            .unwrap();

        let fresh = store.enrollment(&e.id).unwrap();
        let err = store
            .finalize_payment(&payment.id, fresh.version, |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(
            err,
            EnrollmentError::AlreadyFinalized {
                status: PaymentReviewStatus::Verified,
                ..
            }
        ));
    }
}
