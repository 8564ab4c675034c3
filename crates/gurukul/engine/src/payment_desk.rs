//! Payment proof validation
//!
//! The desk checks the shape of a submitted proof (bank detail formats,
//! required fields) and owns the partial-payment floor. It never stores
//! files and never talks to a gateway; screenshots go through the storage
//! collaborator and verification stays manual.

use gurukul_types::{EnrollmentError, EnrollmentResult, PaymentProof};
use regex::Regex;
use std::sync::OnceLock;

/// IFSC format: four bank letters, a literal zero, six branch characters.
fn ifsc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z]{4}0[A-Z0-9]{6}$").expect("IFSC pattern is valid")
    })
}

/// Tunable validation rules for payment proofs.
#[derive(Clone, Debug)]
pub struct PaymentPolicy {
    /// Minimum partial payment as basis points of the course fee
    pub min_partial_bps: u32,
    /// Account number length bounds (digits)
    pub min_account_digits: usize,
    pub max_account_digits: usize,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            min_partial_bps: 1_000,
            min_account_digits: 9,
            max_account_digits: 18,
        }
    }
}

/// Validates payment proofs against a [`PaymentPolicy`].
#[derive(Clone, Debug, Default)]
pub struct PaymentDesk {
    policy: PaymentPolicy,
}

impl PaymentDesk {
    pub fn new(policy: PaymentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PaymentPolicy {
        &self.policy
    }

    /// Field-level validation of a submitted proof.
    pub fn validate_proof(&self, proof: &PaymentProof) -> EnrollmentResult<()> {
        if proof.transaction_id.trim().is_empty() {
            return Err(EnrollmentError::validation(
                "transaction_id",
                "transaction id must not be empty",
            ));
        }
        if proof.amount_minor == 0 {
            return Err(EnrollmentError::validation(
                "amount_minor",
                "amount must be greater than zero",
            ));
        }
        if proof.bank.account_holder.trim().is_empty() {
            return Err(EnrollmentError::validation(
                "bank.account_holder",
                "account holder must not be empty",
            ));
        }

        let digits = proof.bank.account_number.len();
        if !proof.bank.account_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(EnrollmentError::validation(
                "bank.account_number",
                "account number must be numeric",
            ));
        }
        if digits < self.policy.min_account_digits || digits > self.policy.max_account_digits {
            return Err(EnrollmentError::validation(
                "bank.account_number",
                format!(
                    "account number must be {}-{} digits, got {}",
                    self.policy.min_account_digits, self.policy.max_account_digits, digits
                ),
            ));
        }

        if !ifsc_pattern().is_match(&proof.bank.ifsc) {
            return Err(EnrollmentError::validation(
                "bank.ifsc",
                format!("'{}' is not a valid IFSC code", proof.bank.ifsc),
            ));
        }

        Ok(())
    }

    /// The smallest acceptable partial payment for a course fee, rounded up
    /// so the floor is exact in integer minor units.
    pub fn min_partial_minor(&self, course_fee_minor: u64) -> u64 {
        (course_fee_minor * u64::from(self.policy.min_partial_bps)).div_ceil(10_000)
    }

    /// Enforce the partial floor on an approval amount.
    pub fn check_partial_floor(
        &self,
        amount_minor: u64,
        course_fee_minor: u64,
    ) -> EnrollmentResult<()> {
        let floor = self.min_partial_minor(course_fee_minor);
        if amount_minor < floor {
            return Err(EnrollmentError::validation(
                "amount_minor",
                format!(
                    "partial payment of {} is below the minimum of {} ({}% of the course fee); reject the proof with a reason instead",
                    amount_minor,
                    floor,
                    self.policy.min_partial_bps / 100
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gurukul_types::BankDetails;

    fn valid_proof() -> PaymentProof {
        PaymentProof::new(
            BankDetails::new("Asha Rao", "123456789012", "HDFC0001234"),
            "TXN-42",
            6_000,
        )
    }

    #[test]
    fn accepts_a_well_formed_proof() {
        PaymentDesk::default().validate_proof(&valid_proof()).unwrap();
    }

    #[test]
    fn rejects_bad_ifsc() {
        let desk = PaymentDesk::default();
        for ifsc in ["HDFC001234", "hdfc0001234", "HDF00012345", "HDFC1001234", ""] {
            let mut proof = valid_proof();
            proof.bank.ifsc = ifsc.into();
            let err = desk.validate_proof(&proof).unwrap_err();
            assert!(
                matches!(err, EnrollmentError::Validation { ref field, .. } if field == "bank.ifsc"),
                "{ifsc} should fail on the ifsc field"
            );
        }
    }

    #[test]
    fn rejects_non_numeric_account() {
        let mut proof = valid_proof();
        proof.bank.account_number = "12345ABC9012".into();
        let err = PaymentDesk::default().validate_proof(&proof).unwrap_err();
        assert!(matches!(err, EnrollmentError::Validation { ref field, .. }
            if field == "bank.account_number"));
    }

    #[test]
    fn rejects_short_account_number() {
        let mut proof = valid_proof();
        proof.bank.account_number = "12345678".into();
        assert!(PaymentDesk::default().validate_proof(&proof).is_err());
    }

    #[test]
    fn rejects_empty_transaction_id() {
        let mut proof = valid_proof();
        proof.transaction_id = "  ".into();
        assert!(PaymentDesk::default().validate_proof(&proof).is_err());
    }

    #[test]
    fn partial_floor_rounds_up() {
        let desk = PaymentDesk::default();
        // 10% of 505 is 50.5, floor must round up to 51
        assert_eq!(desk.min_partial_minor(505), 51);
        assert_eq!(desk.min_partial_minor(500), 50);

        assert!(desk.check_partial_floor(49, 500).is_err());
        desk.check_partial_floor(50, 500).unwrap();
    }
}
