//! Progress derivation and unlock gating
//!
//! A pure function of (course definition, completed sets, payment status).
//! Nothing here is cached: the stored `progress_percent` on an enrollment is
//! a read-optimization, and every unlock or eligibility decision recomputes
//! from the completed sets.
//!
//! Gating rules:
//! - A module is accessible iff every earlier module (by `order`) is fully
//!   complete. Sequential, no skipping.
//! - The capstone is accessible iff all modules are complete, regardless of
//!   payment status. Payment gates certification, not learning.
//! - The certificate needs all three: 100% progress, a passed capstone, and
//!   a fully paid enrollment.

use gurukul_types::{
    Course, CourseModule, EligibilityGap, Enrollment, EnrollmentError, EnrollmentResult, ItemId,
    ItemKind, ModuleId,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Derived progress state for one enrollment against its course snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressView {
    /// Rounded completion percentage over all gated items
    pub progress_percent: u8,
    pub completed_items: usize,
    pub total_items: usize,
    /// Per-module breakdown, in unlock order
    pub modules: Vec<ModuleProgress>,
    pub capstone_accessible: bool,
    pub capstone_passed: bool,
    pub certificate_issuable: bool,
}

impl ProgressView {
    /// Whether the module is currently accessible.
    pub fn is_accessible(&self, module: &ModuleId) -> bool {
        self.modules
            .iter()
            .any(|m| &m.module_id == module && m.accessible)
    }
}

/// Progress of a single module.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub module_id: ModuleId,
    pub order: u32,
    pub accessible: bool,
    pub completed: bool,
    pub completed_items: usize,
    pub total_items: usize,
}

/// Stateless calculator deriving a [`ProgressView`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ProgressCalculator;

impl ProgressCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Derive the full progress view for an enrollment.
    pub fn compute(&self, course: &Course, enrollment: &Enrollment) -> ProgressView {
        let mut modules = Vec::with_capacity(course.modules_in_order().len());
        let mut all_prior_complete = true;

        for module in course.modules_in_order() {
            let total = module.gated_item_count();
            let completed_items = module
                .gated_items()
                .filter(|item| enrollment.has_completed(item))
                .count();
            let completed = completed_items == total;

            modules.push(ModuleProgress {
                module_id: module.id.clone(),
                order: module.order,
                accessible: all_prior_complete,
                completed,
                completed_items,
                total_items: total,
            });

            all_prior_complete = all_prior_complete && completed;
        }

        let total_items = course.total_gated_items();
        let completed_items = enrollment.completed_item_count();
        let progress_percent = percentage(completed_items, total_items);

        // After the loop, all_prior_complete means every module is done.
        let capstone_accessible = all_prior_complete;
        let certificate_issuable = progress_percent == 100
            && enrollment.capstone_passed
            && enrollment.payment_status.is_fully_paid();

        debug!(
            enrollment_id = %enrollment.id,
            progress = progress_percent,
            completed = completed_items,
            total = total_items,
            capstone_accessible,
            "Progress recomputed"
        );

        ProgressView {
            progress_percent,
            completed_items,
            total_items,
            modules,
            capstone_accessible,
            capstone_passed: enrollment.capstone_passed,
            certificate_issuable,
        }
    }

    /// Check that the module owning a completion event is accessible, and
    /// name the earliest incomplete prior module if it is not.
    pub fn check_module_accessible(
        &self,
        course: &Course,
        enrollment: &Enrollment,
        module_id: &ModuleId,
    ) -> EnrollmentResult<()> {
        let target = course.module(module_id).ok_or_else(|| {
            EnrollmentError::validation("module_id", format!("unknown module {}", module_id))
        })?;

        for module in course.modules_in_order() {
            if module.order >= target.order {
                break;
            }
            if !module_complete(module, enrollment) {
                return Err(EnrollmentError::ModuleLocked {
                    module: module_id.clone(),
                    blocking: module.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Check that the capstone is unlocked: every module fully complete.
    pub fn check_capstone_accessible(
        &self,
        course: &Course,
        enrollment: &Enrollment,
        capstone_id: &ItemId,
    ) -> EnrollmentResult<()> {
        if course.capstone(capstone_id).is_none() {
            return Err(EnrollmentError::validation(
                "item_id",
                format!("unknown capstone {}", capstone_id),
            ));
        }
        if let Some(blocking) = course
            .modules_in_order()
            .iter()
            .find(|m| !module_complete(m, enrollment))
        {
            return Err(EnrollmentError::CapstoneLocked {
                blocking: blocking.id.clone(),
            });
        }
        Ok(())
    }

    /// Verify that `item_id` is a gated item of `module_id` with the right
    /// kind.
    pub fn check_item_in_module(
        &self,
        course: &Course,
        module_id: &ModuleId,
        item_id: &ItemId,
        kind: ItemKind,
    ) -> EnrollmentResult<()> {
        let module = course.module(module_id).ok_or_else(|| {
            EnrollmentError::validation("module_id", format!("unknown module {}", module_id))
        })?;
        if !module.contains_item(item_id, kind) {
            return Err(EnrollmentError::validation(
                "item_id",
                format!("module {} has no {} {}", module_id, kind, item_id),
            ));
        }
        Ok(())
    }

    /// The unmet certificate-issuance conditions, empty when issuable.
    ///
    /// All three conditions are re-derived from live state; the stored
    /// `progress_percent` and flags are never trusted here.
    pub fn certificate_gaps(&self, course: &Course, enrollment: &Enrollment) -> Vec<EligibilityGap> {
        let percent = percentage(enrollment.completed_item_count(), course.total_gated_items());
        let mut gaps = Vec::new();
        if percent < 100 {
            gaps.push(EligibilityGap::ProgressIncomplete { percent });
        }
        if !enrollment.capstone_passed {
            gaps.push(EligibilityGap::CapstoneNotPassed);
        }
        if !enrollment.payment_status.is_fully_paid() {
            gaps.push(EligibilityGap::PaymentIncomplete {
                status: enrollment.payment_status,
            });
        }
        gaps
    }
}

fn module_complete(module: &CourseModule, enrollment: &Enrollment) -> bool {
    module.gated_items().all(|item| enrollment.has_completed(item))
}

/// Completion percentage rounded to the nearest integer. A course with no
/// gated items counts as fully complete.
fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}
