//! Payment proof records
//!
//! The platform never talks to a payment gateway: students transfer the fee
//! by bank and submit the transfer details plus an optional screenshot for
//! manual admin verification. One record per submitted proof.

use crate::{EnrollmentId, PaymentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a proof covers the initial partial payment or the remaining
/// balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentPhase {
    Partial,
    Full,
}

impl std::fmt::Display for PaymentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Partial => write!(f, "partial"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Review state of a submitted proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentReviewStatus {
    /// Awaiting admin verification
    #[default]
    Submitted,
    Verified,
    Rejected,
}

impl std::fmt::Display for PaymentReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        };
        write!(f, "{}", name)
    }
}

/// An admin's verdict on a submitted proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationDecision {
    Approve,
    Reject,
}

impl std::fmt::Display for VerificationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Bank-transfer details attached to a proof.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_holder: String,
    /// Digits only; length limits enforced by the payment desk
    pub account_number: String,
    /// Indian Financial System Code, `AAAA0XXXXXX`
    pub ifsc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}

impl BankDetails {
    pub fn new(
        account_holder: impl Into<String>,
        account_number: impl Into<String>,
        ifsc: impl Into<String>,
    ) -> Self {
        Self {
            account_holder: account_holder.into(),
            account_number: account_number.into(),
            ifsc: ifsc.into(),
            bank_name: None,
        }
    }

    pub fn with_bank_name(mut self, name: impl Into<String>) -> Self {
        self.bank_name = Some(name.into());
        self
    }
}

/// A screenshot of the bank transfer, handed to the storage collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScreenshotUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl ScreenshotUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Inbound shape of a payment submission, before validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentProof {
    pub bank: BankDetails,
    pub transaction_id: String,
    pub amount_minor: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<ScreenshotUpload>,
}

impl PaymentProof {
    pub fn new(bank: BankDetails, transaction_id: impl Into<String>, amount_minor: u64) -> Self {
        Self {
            bank,
            transaction_id: transaction_id.into(),
            amount_minor,
            screenshot: None,
        }
    }

    pub fn with_screenshot(mut self, screenshot: ScreenshotUpload) -> Self {
        self.screenshot = Some(screenshot);
        self
    }
}

/// A stored payment proof, linked to exactly one enrollment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub enrollment_id: EnrollmentId,
    pub phase: PaymentPhase,
    pub bank: BankDetails,
    /// Unique per enrollment; a retry with the same id returns this record
    pub transaction_id: String,
    /// Declared transfer amount in minor units
    pub amount_minor: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
    pub status: PaymentReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_remarks: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Create a freshly submitted record awaiting verification.
    pub fn submitted(
        enrollment_id: EnrollmentId,
        phase: PaymentPhase,
        proof: PaymentProof,
        screenshot_url: Option<String>,
    ) -> Self {
        Self {
            id: PaymentId::generate(),
            enrollment_id,
            phase,
            bank: proof.bank,
            transaction_id: proof.transaction_id,
            amount_minor: proof.amount_minor,
            screenshot_url,
            status: PaymentReviewStatus::Submitted,
            admin_remarks: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
        }
    }

    /// Whether an admin decision has already been recorded.
    pub fn is_finalized(&self) -> bool {
        self.status != PaymentReviewStatus::Submitted
    }

    /// Mark verified. The caller guarantees the record is still `Submitted`.
    pub fn finalize_verified(&mut self, remarks: Option<String>) {
        self.status = PaymentReviewStatus::Verified;
        self.admin_remarks = remarks;
        self.reviewed_at = Some(Utc::now());
    }

    /// Mark rejected with mandatory remarks.
    pub fn finalize_rejected(&mut self, remarks: String) {
        self.status = PaymentReviewStatus::Rejected;
        self.admin_remarks = Some(remarks);
        self.reviewed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proof() -> PaymentProof {
        PaymentProof::new(
            BankDetails::new("Asha Rao", "123456789012", "HDFC0001234"),
            "TXN-001",
            5_000,
        )
    }

    #[test]
    fn test_submitted_payment_awaits_review() {
        let p = Payment::submitted(
            EnrollmentId::new("e1"),
            PaymentPhase::Partial,
            proof(),
            None,
        );
        assert_eq!(p.status, PaymentReviewStatus::Submitted);
        assert!(!p.is_finalized());
        assert!(p.reviewed_at.is_none());
    }

    #[test]
    fn test_finalize_verified() {
        let mut p = Payment::submitted(
            EnrollmentId::new("e1"),
            PaymentPhase::Partial,
            proof(),
            None,
        );
        p.finalize_verified(Some("matched statement".into()));
        assert!(p.is_finalized());
        assert_eq!(p.status, PaymentReviewStatus::Verified);
        assert!(p.reviewed_at.is_some());
    }

    #[test]
    fn test_screenshot_roundtrips_through_json() {
        let shot = ScreenshotUpload::new("proof.png", "image/png", vec![1, 2, 3, 4, 5]);
        let p = proof().with_screenshot(shot);
        let json = serde_json::to_string(&p).unwrap();
        let back: PaymentProof = serde_json::from_str(&json).unwrap();
        assert_eq!(back.screenshot.unwrap().data, vec![1, 2, 3, 4, 5]);
    }
}
