//! Enrollment engine for the Gurukul learning platform
//!
//! The engine owns the enrollment lifecycle: payment-status transitions,
//! sequential module unlocking, completion tracking, and certificate
//! issuance. It is request-driven: every operation runs to completion
//! against the store's concurrency guards and returns.
//!
//! # Key Principle
//!
//! **State transitions fire on evidence, never by fiat.** A student's
//! submitted proof or an admin's recorded decision moves the payment
//! lifecycle; a graded submission moves progress. The engine checks every
//! precondition against live state and rejects anything else.
//!
//! # Architecture
//!
//! [`EnrollmentEngine`] composes specialized components:
//!
//! - [`CourseCatalog`] — stores immutable published course versions
//! - [`PaymentDesk`] — validates payment proofs and owns the partial floor
//! - [`transitions`] — the enumerable payment-status transition table
//! - [`ProgressCalculator`] — derives unlocking and completion percentages
//! - [`CertificateIssuer`] — derives deterministic certificate ids
//! - [`InMemoryEnrollmentStore`] — compare-and-swap guarded persistence
//!
//! # Example
//!
//! ```rust
//! use gurukul_engine::{EnrollmentEngine, MemoryFileStore, RecordingNotifier};
//! use gurukul_types::*;
//! use std::sync::Arc;
//!
//! let engine = EnrollmentEngine::new(
//!     Arc::new(MemoryFileStore::new()),
//!     Arc::new(RecordingNotifier::new()),
//! );
//!
//! let mut course = Course::new(CourseId::new("rust-101"), 1, "Rust Basics", 50_000);
//! course
//!     .add_module(
//!         CourseModule::new(ModuleId::new("m1"), 0, "Ownership")
//!             .with_task(TaskSpec::new("t1", "Write a CLI")),
//!     )
//!     .unwrap();
//! engine.publish_course(course).unwrap();
//!
//! let enrollment = engine
//!     .submit_enrollment(
//!         StudentId::new("stu-1"),
//!         CourseId::new("rust-101"),
//!         StudentDetails::new("Asha Rao", "asha@example.com"),
//!         None,
//!     )
//!     .unwrap();
//!
//! assert_eq!(enrollment.payment_status, PaymentStatus::Unpaid);
//! ```

#![deny(unsafe_code)]

pub mod catalog;
pub mod certificate;
pub mod collaborators;
pub mod engine;
pub mod payment_desk;
pub mod progress;
pub mod store;
pub mod transitions;

pub use catalog::CourseCatalog;
pub use certificate::CertificateIssuer;
pub use collaborators::{FileStore, MemoryFileStore, Notifier, RecordingNotifier};
pub use engine::EnrollmentEngine;
pub use payment_desk::{PaymentDesk, PaymentPolicy};
pub use progress::{ModuleProgress, ProgressCalculator, ProgressView};
pub use store::InMemoryEnrollmentStore;
