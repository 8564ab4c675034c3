//! Error types for the enrollment core
//!
//! Everything an operation can reject with, in one taxonomy. The
//! idempotency signals (`DuplicateSubmission`, `AlreadyCompleted`,
//! `AlreadyFinalized`) are success-equivalent to callers: the requested
//! outcome already holds and no state was changed. `ConflictRetry` asks the
//! caller to retry the whole operation; everything else is surfaced as-is.

use crate::{
    CourseId, EnrollmentId, ItemId, ModuleId, PaymentId, PaymentReviewStatus, PaymentStatus,
    StudentId,
};

/// Errors that can occur in enrollment operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentError {
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("course not found: {id} v{version}")]
    CourseNotFound { id: CourseId, version: u32 },

    #[error("enrollment not found: {0}")]
    EnrollmentNotFound(EnrollmentId),

    #[error("payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("student {student} is already enrolled in course {course}")]
    AlreadyEnrolled { student: StudentId, course: CourseId },

    #[error("operation '{event}' is not permitted in payment state {from}")]
    InvalidStateTransition { from: PaymentStatus, event: String },

    #[error("transaction id '{transaction_id}' was already used for this enrollment")]
    DuplicateSubmission { transaction_id: String },

    #[error("item {item} is already in the completed set")]
    AlreadyCompleted { item: ItemId },

    #[error("payment {payment} was already finalized as {status}")]
    AlreadyFinalized {
        payment: PaymentId,
        status: PaymentReviewStatus,
    },

    #[error("module {module} is locked; complete module {blocking} first")]
    ModuleLocked { module: ModuleId, blocking: ModuleId },

    #[error("capstone is locked; complete module {blocking} first")]
    CapstoneLocked { blocking: ModuleId },

    #[error("certificate is not issuable: {}", describe_gaps(.unmet))]
    NotEligible { unmet: Vec<EligibilityGap> },

    #[error("concurrent modification of enrollment {0}; retry the operation")]
    ConflictRetry(EnrollmentId),

    #[error("duplicate module order {order} in course definition")]
    DuplicateModuleOrder { order: u32 },

    #[error("duplicate module id in course definition: {0}")]
    DuplicateModuleId(ModuleId),

    #[error("duplicate item id in course definition: {0}")]
    DuplicateItemId(ItemId),

    #[error("course {id} v{version} is already registered")]
    CourseVersionExists { id: CourseId, version: u32 },

    #[error("enrollment store lock poisoned")]
    StorePoisoned,

    #[error("file storage failed: {0}")]
    FileStorage(String),

    #[error("notification dispatch failed: {0}")]
    Notification(String),
}

impl EnrollmentError {
    /// Build a field-level validation error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Idempotency signals report that the requested outcome already holds;
    /// callers treat them as success-equivalent.
    pub fn is_idempotency_signal(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSubmission { .. }
                | Self::AlreadyCompleted { .. }
                | Self::AlreadyFinalized { .. }
        )
    }
}

/// One unmet certificate-issuance condition.
///
/// The three conditions are independently necessary: full progress, a passed
/// capstone, and a fully paid enrollment.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EligibilityGap {
    /// Course progress has not reached 100%.
    ProgressIncomplete { percent: u8 },
    /// No capstone submission has been graded as passed.
    CapstoneNotPassed,
    /// The enrollment is not fully paid.
    PaymentIncomplete { status: PaymentStatus },
}

impl std::fmt::Display for EligibilityGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProgressIncomplete { percent } => {
                write!(f, "course progress at {}%, needs 100%", percent)
            }
            Self::CapstoneNotPassed => write!(f, "capstone not passed"),
            Self::PaymentIncomplete { status } => {
                write!(f, "payment incomplete (status {})", status)
            }
        }
    }
}

fn describe_gaps(gaps: &[EligibilityGap]) -> String {
    gaps.iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for enrollment operations
pub type EnrollmentResult<T> = Result<T, EnrollmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_signals() {
        assert!(EnrollmentError::AlreadyCompleted {
            item: ItemId::new("t1")
        }
        .is_idempotency_signal());
        assert!(!EnrollmentError::ConflictRetry(EnrollmentId::new("e1")).is_idempotency_signal());
    }

    #[test]
    fn test_not_eligible_lists_every_gap() {
        let err = EnrollmentError::NotEligible {
            unmet: vec![
                EligibilityGap::ProgressIncomplete { percent: 40 },
                EligibilityGap::CapstoneNotPassed,
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("40%"));
        assert!(msg.contains("capstone"));
    }
}
