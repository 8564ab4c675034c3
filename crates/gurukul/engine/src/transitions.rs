//! The payment-status transition table
//!
//! Every legal edge of the payment lifecycle is enumerated here as data, so
//! the graph is testable in isolation from request handling. Transitions
//! fire on evidence (a student's submitted proof, an admin's recorded
//! decision), never by fiat. Rejections step back exactly one state: a
//! rejected full payment reverts to `PartialPaid`, a rejected partial
//! payment to `Unpaid`.

use gurukul_types::{
    EnrollmentError, EnrollmentResult, PaymentPhase, PaymentStatus, VerificationDecision,
};

/// An event that can move an enrollment's payment status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentEvent {
    SubmitPartial,
    SubmitFull,
    ApprovePartial,
    ApproveFull,
    RejectPartial,
    RejectFull,
}

impl PaymentEvent {
    /// The event raised by a student submitting a proof for `phase`.
    pub fn submission(phase: PaymentPhase) -> Self {
        match phase {
            PaymentPhase::Partial => Self::SubmitPartial,
            PaymentPhase::Full => Self::SubmitFull,
        }
    }

    /// The event raised by an admin deciding a proof for `phase`.
    pub fn decision(phase: PaymentPhase, decision: VerificationDecision) -> Self {
        match (phase, decision) {
            (PaymentPhase::Partial, VerificationDecision::Approve) => Self::ApprovePartial,
            (PaymentPhase::Partial, VerificationDecision::Reject) => Self::RejectPartial,
            (PaymentPhase::Full, VerificationDecision::Approve) => Self::ApproveFull,
            (PaymentPhase::Full, VerificationDecision::Reject) => Self::RejectFull,
        }
    }
}

impl std::fmt::Display for PaymentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SubmitPartial => "submit-partial",
            Self::SubmitFull => "submit-full",
            Self::ApprovePartial => "approve-partial",
            Self::ApproveFull => "approve-full",
            Self::RejectPartial => "reject-partial",
            Self::RejectFull => "reject-full",
        };
        write!(f, "{}", name)
    }
}

/// The complete set of legal edges: (from, event, to).
pub const EDGES: &[(PaymentStatus, PaymentEvent, PaymentStatus)] = &[
    (
        PaymentStatus::Unpaid,
        PaymentEvent::SubmitPartial,
        PaymentStatus::PartialVerificationPending,
    ),
    (
        PaymentStatus::PartialVerificationPending,
        PaymentEvent::ApprovePartial,
        PaymentStatus::PartialPaid,
    ),
    (
        PaymentStatus::PartialVerificationPending,
        PaymentEvent::RejectPartial,
        PaymentStatus::Unpaid,
    ),
    (
        PaymentStatus::PartialPaid,
        PaymentEvent::SubmitFull,
        PaymentStatus::FullVerificationPending,
    ),
    (
        PaymentStatus::FullVerificationPending,
        PaymentEvent::ApproveFull,
        PaymentStatus::FullyPaid,
    ),
    (
        PaymentStatus::FullVerificationPending,
        PaymentEvent::RejectFull,
        PaymentStatus::PartialPaid,
    ),
];

/// Look up the state `event` leads to from `from`, if the edge is legal.
pub fn next_status(from: PaymentStatus, event: PaymentEvent) -> Option<PaymentStatus> {
    EDGES
        .iter()
        .find(|(f, e, _)| *f == from && *e == event)
        .map(|(_, _, to)| *to)
}

/// Apply `event` to `from`, or fail with the offending state and event.
pub fn apply(from: PaymentStatus, event: PaymentEvent) -> EnrollmentResult<PaymentStatus> {
    next_status(from, event).ok_or_else(|| EnrollmentError::InvalidStateTransition {
        from,
        event: event.to_string(),
    })
}
