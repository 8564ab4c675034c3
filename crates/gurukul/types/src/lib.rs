//! Domain types for the Gurukul enrollment core
//!
//! This crate holds the data model shared by every layer: course
//! definitions, the enrollment entity and its payment lifecycle, payment
//! proof records, submissions, notification events, and the error taxonomy.
//! Types validate their own structural invariants (unique module orders,
//! unique item ids); operational rules live in `gurukul-engine`.

#![deny(unsafe_code)]

pub mod course;
pub mod enrollment;
pub mod errors;
pub mod events;
pub mod ids;
pub mod payment;
pub mod submission;

pub use course::{CapstoneProject, Course, CourseModule, ItemKind, Lesson, QuizSpec, TaskSpec};
pub use enrollment::{Enrollment, EnrollmentEvent, PaymentStatus, StudentDetails};
pub use errors::{EligibilityGap, EnrollmentError, EnrollmentResult};
pub use events::NotificationEvent;
pub use ids::{
    CertificateId, CourseId, EnrollmentId, ItemId, ModuleId, PaymentId, StudentId, SubmissionId,
};
pub use payment::{
    BankDetails, Payment, PaymentPhase, PaymentProof, PaymentReviewStatus, ScreenshotUpload,
    VerificationDecision,
};
pub use submission::{GradeResult, Submission, SubmissionKind, SubmissionStatus};
