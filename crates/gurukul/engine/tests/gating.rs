//! Property tests: gating, percentages, and the transition graph hold for
//! arbitrary courses and completion subsets.

use gurukul_engine::{progress::ProgressCalculator, transitions};
use gurukul_types::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Shape of a generated course: per module, (task count, quiz count).
fn arb_course_shape() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..4, 0usize..3), 1..6)
}

fn build_course(shape: &[(usize, usize)]) -> Course {
    let mut course = Course::new(CourseId::new("prop-course"), 1, "Property Course", 10_000);
    for (index, (tasks, quizzes)) in shape.iter().enumerate() {
        let mut module = CourseModule::new(
            ModuleId::new(format!("m{index}")),
            index as u32,
            format!("Module {index}"),
        );
        for t in 0..*tasks {
            module = module.with_task(TaskSpec::new(format!("t{index}-{t}"), "task"));
        }
        for q in 0..*quizzes {
            module = module.with_quiz(QuizSpec::new(format!("q{index}-{q}"), "quiz"));
        }
        course.add_module(module).expect("generated modules are unique");
    }
    course
}

fn enrollment_for(course: &Course) -> Enrollment {
    Enrollment::new(
        StudentId::new("prop-student"),
        course.id.clone(),
        course.version,
        course.fee_minor,
        StudentDetails::new("Prop Student", "prop@example.com"),
    )
}

/// Mark a random subset of the course's gated items as completed.
fn apply_mask(course: &Course, enrollment: &mut Enrollment, mask: &[bool]) {
    let mut bit = 0;
    for module in course.modules_in_order() {
        for task in &module.tasks {
            if mask.get(bit).copied().unwrap_or(false) {
                enrollment.completed_tasks.insert(task.id.clone());
            }
            bit += 1;
        }
        for quiz in &module.quizzes {
            if mask.get(bit).copied().unwrap_or(false) {
                enrollment.completed_quizzes.insert(quiz.id.clone());
            }
            bit += 1;
        }
    }
}

fn arb_event() -> impl Strategy<Value = transitions::PaymentEvent> {
    use gurukul_engine::transitions::PaymentEvent::*;
    prop_oneof![
        Just(SubmitPartial),
        Just(SubmitFull),
        Just(ApprovePartial),
        Just(ApproveFull),
        Just(RejectPartial),
        Just(RejectFull),
    ]
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// A module is accessible exactly when every earlier module is fully
    /// complete, for any completion subset.
    #[test]
    fn accessibility_matches_prefix_completion(
        shape in arb_course_shape(),
        mask in prop::collection::vec(any::<bool>(), 0..24),
    ) {
        let course = build_course(&shape);
        let mut enrollment = enrollment_for(&course);
        apply_mask(&course, &mut enrollment, &mask);

        let view = ProgressCalculator::new().compute(&course, &enrollment);

        let mut prior_all_complete = true;
        for (module, derived) in course.modules_in_order().iter().zip(&view.modules) {
            prop_assert_eq!(derived.accessible, prior_all_complete);
            let complete = module
                .gated_items()
                .all(|item| enrollment.has_completed(item));
            prop_assert_eq!(derived.completed, complete);
            prior_all_complete = prior_all_complete && complete;
        }

        // The capstone unlocks exactly when every module is complete.
        prop_assert_eq!(view.capstone_accessible, prior_all_complete);
    }

    /// The percentage is always 0..=100, equals the rounded ratio, and
    /// recomputation is stable.
    #[test]
    fn percentage_is_rounded_ratio(
        shape in arb_course_shape(),
        mask in prop::collection::vec(any::<bool>(), 0..24),
    ) {
        let course = build_course(&shape);
        let mut enrollment = enrollment_for(&course);
        apply_mask(&course, &mut enrollment, &mask);

        let calc = ProgressCalculator::new();
        let view = calc.compute(&course, &enrollment);

        prop_assert!(view.progress_percent <= 100);
        let expected = if view.total_items == 0 {
            100
        } else {
            ((view.completed_items as f64 / view.total_items as f64) * 100.0).round() as u8
        };
        prop_assert_eq!(view.progress_percent, expected);

        // Deriving twice from the same state yields the same view.
        let again = calc.compute(&course, &enrollment);
        prop_assert_eq!(view.progress_percent, again.progress_percent);
        prop_assert_eq!(view.completed_items, again.completed_items);
    }

    /// Any event sequence walks only edges of the transition table, and a
    /// rejected event leaves the state unchanged.
    #[test]
    fn payment_status_never_leaves_the_graph(
        events in prop::collection::vec(arb_event(), 0..12),
    ) {
        let mut state = PaymentStatus::Unpaid;
        for event in events {
            match transitions::apply(state, event) {
                Ok(next) => {
                    prop_assert!(transitions::EDGES
                        .iter()
                        .any(|(f, e, t)| *f == state && *e == event && *t == next));
                    state = next;
                }
                Err(EnrollmentError::InvalidStateTransition { from, .. }) => {
                    prop_assert_eq!(from, state);
                }
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }

    /// The outstanding balance is never negative and always equals
    /// fee minus paid, saturating at zero.
    #[test]
    fn remaining_balance_saturates(
        fee in 0u64..1_000_000,
        credits in prop::collection::vec(0u64..500_000, 0..6),
    ) {
        let course = Course::new(CourseId::new("c"), 1, "C", fee);
        let mut enrollment = enrollment_for(&course);
        for credit in credits {
            enrollment.credit_payment(credit);
            prop_assert_eq!(
                enrollment.amount_remaining_minor(),
                fee.saturating_sub(enrollment.amount_paid_minor)
            );
        }
    }
}
