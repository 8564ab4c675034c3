//! Enrollments: the record binding a student to a course
//!
//! An enrollment tracks the payment lifecycle, the completed-item sets that
//! drive unlocking, and an ordered history of every state change. Amounts
//! are integer minor currency units. The `version` counter guards
//! read-modify-write cycles: the store refuses a mutation whose caller read
//! a stale version.

use crate::{CertificateId, CourseId, EnrollmentId, ItemId, ModuleId, StudentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Payment Status ───────────────────────────────────────────────────

/// The payment lifecycle state of an enrollment.
///
/// Legal transitions are owned by the engine's transition table; this enum
/// only names the states and answers simple queries about them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Enrolled, no payment submitted yet
    #[default]
    Unpaid,
    /// Partial payment proof submitted, awaiting admin verification
    PartialVerificationPending,
    /// Partial payment verified; learning content is open
    PartialPaid,
    /// Remaining-balance proof submitted, awaiting admin verification
    FullVerificationPending,
    /// Entire course fee verified
    FullyPaid,
}

impl PaymentStatus {
    /// Whether an admin decision is currently awaited.
    pub fn is_verification_pending(&self) -> bool {
        matches!(
            self,
            Self::PartialVerificationPending | Self::FullVerificationPending
        )
    }

    /// Whether the full course fee has been verified.
    pub fn is_fully_paid(&self) -> bool {
        matches!(self, Self::FullyPaid)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unpaid => "unpaid",
            Self::PartialVerificationPending => "partial-verification-pending",
            Self::PartialPaid => "partial-paid",
            Self::FullVerificationPending => "full-verification-pending",
            Self::FullyPaid => "fully-paid",
        };
        write!(f, "{}", name)
    }
}

// ── Student Details ──────────────────────────────────────────────────

/// Personal details captured at enrollment submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentDetails {
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl StudentDetails {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

// ── Enrollment ───────────────────────────────────────────────────────

/// The record binding one student to one course.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    /// The course version this enrollment was created against; progress is
    /// always derived from this snapshot, never from later edits
    pub course_version: u32,
    pub details: StudentDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    /// Current payment lifecycle state
    pub payment_status: PaymentStatus,
    /// Full course fee in minor units, copied from the course at creation
    pub course_fee_minor: u64,
    /// Total verified amount in minor units
    pub amount_paid_minor: u64,
    /// Quiz item ids with an accepted grade
    pub completed_quizzes: BTreeSet<ItemId>,
    /// Task item ids with an accepted grade
    pub completed_tasks: BTreeSet<ItemId>,
    /// Modules whose every gated item is complete
    pub completed_modules: BTreeSet<ModuleId>,
    /// Derived completion percentage, persisted as a read-optimization only;
    /// unlock decisions always recompute from the completed sets
    pub progress_percent: u8,
    /// Whether a capstone submission has been graded as passed
    pub capstone_passed: bool,
    /// Terminal flag set at certificate issuance
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_id: Option<CertificateId>,
    /// Optimistic-concurrency counter, bumped by the store on every commit
    pub version: u64,
    /// Ordered audit trail of every state change
    pub history: Vec<EnrollmentEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Create a new enrollment in the `Unpaid` state.
    pub fn new(
        student_id: StudentId,
        course_id: CourseId,
        course_version: u32,
        course_fee_minor: u64,
        details: StudentDetails,
    ) -> Self {
        let now = Utc::now();
        let mut enrollment = Self {
            id: EnrollmentId::generate(),
            student_id,
            course_id,
            course_version,
            details,
            referral_code: None,
            payment_status: PaymentStatus::Unpaid,
            course_fee_minor,
            amount_paid_minor: 0,
            completed_quizzes: BTreeSet::new(),
            completed_tasks: BTreeSet::new(),
            completed_modules: BTreeSet::new(),
            progress_percent: 0,
            capstone_passed: false,
            is_completed: false,
            completion_date: None,
            certificate_id: None,
            version: 0,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        enrollment.record_event("enrolled", "Enrollment created");
        enrollment
    }

    pub fn with_referral_code(mut self, code: impl Into<String>) -> Self {
        self.referral_code = Some(code.into());
        self
    }

    /// Outstanding balance in minor units; never negative.
    pub fn amount_remaining_minor(&self) -> u64 {
        self.course_fee_minor.saturating_sub(self.amount_paid_minor)
    }

    /// Move to a new payment state, recording the audit event.
    pub fn set_payment_status(&mut self, status: PaymentStatus, reason: impl Into<String>) {
        let from = self.payment_status;
        self.payment_status = status;
        self.touch();
        self.record_event(
            "payment_status_changed",
            format!("{} -> {}: {}", from, status, reason.into()),
        );
    }

    /// Credit a verified amount toward the course fee.
    pub fn credit_payment(&mut self, amount_minor: u64) {
        self.amount_paid_minor = self.amount_paid_minor.saturating_add(amount_minor);
        self.touch();
        self.record_event(
            "payment_credited",
            format!(
                "credited {} minor units, {} remaining",
                amount_minor,
                self.amount_remaining_minor()
            ),
        );
    }

    /// Whether the given item id is already in the matching completed set.
    pub fn has_completed(&self, item: &ItemId) -> bool {
        self.completed_tasks.contains(item) || self.completed_quizzes.contains(item)
    }

    /// Count of completed gated items.
    pub fn completed_item_count(&self) -> usize {
        self.completed_tasks.len() + self.completed_quizzes.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append an entry to the audit trail.
    pub fn record_event(&mut self, event_type: impl Into<String>, description: impl Into<String>) {
        self.history.push(EnrollmentEvent {
            sequence: self.history.len() as u64,
            event_type: event_type.into(),
            description: description.into(),
            timestamp: Utc::now(),
        });
    }
}

// ── Audit Trail ──────────────────────────────────────────────────────

/// An entry in an enrollment's audit trail.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnrollmentEvent {
    /// Monotonically increasing sequence number
    pub sequence: u64,
    pub event_type: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_enrollment() -> Enrollment {
        Enrollment::new(
            StudentId::new("stu-1"),
            CourseId::new("rust-101"),
            1,
            50_000,
            StudentDetails::new("Asha Rao", "asha@example.com"),
        )
    }

    #[test]
    fn test_new_enrollment_is_unpaid() {
        let e = make_enrollment();
        assert_eq!(e.payment_status, PaymentStatus::Unpaid);
        assert_eq!(e.amount_remaining_minor(), 50_000);
        assert_eq!(e.version, 0);
        assert!(!e.is_completed);
    }

    #[test]
    fn test_remaining_never_negative() {
        let mut e = make_enrollment();
        e.credit_payment(60_000);
        assert_eq!(e.amount_remaining_minor(), 0);
    }

    #[test]
    fn test_history_sequence_is_monotonic() {
        let mut e = make_enrollment();
        e.set_payment_status(PaymentStatus::PartialVerificationPending, "proof submitted");
        e.credit_payment(5_000);
        for (i, event) in e.history.iter().enumerate() {
            assert_eq!(event.sequence, i as u64);
        }
        assert!(e.history.len() >= 3);
    }

    #[test]
    fn test_verification_pending_query() {
        assert!(PaymentStatus::PartialVerificationPending.is_verification_pending());
        assert!(PaymentStatus::FullVerificationPending.is_verification_pending());
        assert!(!PaymentStatus::PartialPaid.is_verification_pending());
        assert!(PaymentStatus::FullyPaid.is_fully_paid());
    }
}
