//! HMAC-SHA256 transaction signature verification.
//!
//! Feeds that relay platform transactions through our own backend sign each
//! record with a shared secret. The signature covers
//! `RawTransaction::canonical_payload()` and travels hex-encoded in the
//! record's `signature` field.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::entitlement::{RawTransaction, TransactionEvent, Verification, VerificationError};
use crate::ports::Verifier;

type HmacSha256 = Hmac<Sha256>;

/// Verifier for HMAC-signed transaction records.
pub struct HmacTransactionVerifier {
    secret: SecretString,
}

impl HmacTransactionVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Hex signature of a record under `secret`.
    ///
    /// Used by feed producers and test fixtures.
    pub fn sign(secret: &str, raw: &RawTransaction) -> Result<String, VerificationError> {
        compute_signature(secret.as_bytes(), raw).map(hex::encode)
    }

    fn check(&self, raw: &RawTransaction) -> Result<(), VerificationError> {
        let header = raw
            .signature
            .as_deref()
            .ok_or(VerificationError::MissingSignature)?;

        let provided = hex::decode(header)
            .map_err(|_| VerificationError::MalformedPayload("signature is not valid hex".to_string()))?;

        let expected = compute_signature(self.secret.expose_secret().as_bytes(), raw)?;

        if !constant_time_compare(&expected, &provided) {
            return Err(VerificationError::InvalidSignature);
        }

        Ok(())
    }
}

#[async_trait]
impl Verifier for HmacTransactionVerifier {
    async fn verify(&self, raw: &RawTransaction) -> Verification<TransactionEvent> {
        match self.check(raw) {
            Ok(()) => Verification::verified(raw.clone()),
            Err(error) => {
                tracing::debug!(
                    transaction_id = %raw.transaction_id,
                    error = %error,
                    "HMAC verification failed"
                );
                Verification::unverified(raw.clone(), error)
            }
        }
    }
}

fn compute_signature(key: &[u8], raw: &RawTransaction) -> Result<Vec<u8>, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| VerificationError::MalformedPayload(format!("unusable signing key: {}", e)))?;
    mac.update(raw.canonical_payload().as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ProductId, Timestamp, TransactionId};

    const TEST_SECRET: &str = "feed_test_secret_12345";

    fn verifier() -> HmacTransactionVerifier {
        HmacTransactionVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    fn record() -> RawTransaction {
        RawTransaction::new(
            TransactionId::new("2000000042").unwrap(),
            ProductId::new("p.year").unwrap(),
            Timestamp::from_unix_secs(1_705_276_800).unwrap(),
        )
        .with_expiration(Timestamp::from_unix_secs(1_736_812_800).unwrap())
    }

    fn signed(raw: RawTransaction, secret: &str) -> RawTransaction {
        let signature = HmacTransactionVerifier::sign(secret, &raw).unwrap();
        raw.with_signature(signature)
    }

    #[tokio::test]
    async fn valid_signature_is_verified() {
        let result = verifier().verify(&signed(record(), TEST_SECRET)).await;
        assert!(result.is_verified());
    }

    #[tokio::test]
    async fn missing_signature_is_unverified() {
        let result = verifier().verify(&record()).await;
        assert_eq!(result.into_verified(), Err(VerificationError::MissingSignature));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid_signature() {
        let result = verifier().verify(&signed(record(), "other_secret")).await;
        assert_eq!(result.into_verified(), Err(VerificationError::InvalidSignature));
    }

    #[tokio::test]
    async fn tampered_record_is_invalid_signature() {
        let mut tampered = signed(record(), TEST_SECRET);
        tampered.revocation_date = None;
        tampered.expiration_date = Some(Timestamp::from_unix_secs(4_102_444_800).unwrap());

        let result = verifier().verify(&tampered).await;
        assert_eq!(result.into_verified(), Err(VerificationError::InvalidSignature));
    }

    #[tokio::test]
    async fn non_hex_signature_is_malformed() {
        let result = verifier().verify(&record().with_signature("not_hex!")).await;
        assert!(matches!(
            result.into_verified(),
            Err(VerificationError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn unverified_result_still_carries_payload() {
        let result = verifier().verify(&record()).await;
        let event = result.into_payload();
        assert_eq!(event.transaction_id.as_str(), "2000000042");
        assert!(!event.is_verified());
    }

    #[test]
    fn sign_is_deterministic() {
        let a = HmacTransactionVerifier::sign(TEST_SECRET, &record()).unwrap();
        let b = HmacTransactionVerifier::sign(TEST_SECRET, &record()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn constant_time_compare_handles_lengths() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2]));
        assert!(constant_time_compare(&[], &[]));
    }
}
