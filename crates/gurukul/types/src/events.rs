//! Notification events emitted by the enrollment engine
//!
//! Delivery transport (email, push) is owned by the notification
//! collaborator; the engine only produces typed events.

use crate::{CertificateId, EnrollmentId, PaymentId, PaymentPhase};
use serde::{Deserialize, Serialize};

/// An event worth telling the student about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    PaymentVerified {
        enrollment_id: EnrollmentId,
        payment_id: PaymentId,
        phase: PaymentPhase,
        amount_minor: u64,
    },
    PaymentRejected {
        enrollment_id: EnrollmentId,
        payment_id: PaymentId,
        phase: PaymentPhase,
        remarks: String,
    },
    CertificateIssued {
        enrollment_id: EnrollmentId,
        certificate_id: CertificateId,
    },
}

impl NotificationEvent {
    /// Stable event name for logging and routing.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::PaymentVerified { .. } => "payment_verified",
            Self::PaymentRejected { .. } => "payment_rejected",
            Self::CertificateIssued { .. } => "certificate_issued",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_stable() {
        let event = NotificationEvent::CertificateIssued {
            enrollment_id: EnrollmentId::new("e1"),
            certificate_id: CertificateId::new("cert-1"),
        };
        assert_eq!(event.event_name(), "certificate_issued");
    }
}
