//! Generation certificates.
//!
//! A certificate binds a key to the per-basis statistics it was drawn from.
//! Hashes are SHA-256 over canonical JSON (object keys sorted), so a
//! certificate written to disk and read back verifies unchanged. Floats are
//! hashed in their shortest round-trip form, which relies on serde_json's
//! `float_roundtrip` parsing. This is a tamper-evidence record; it does not
//! prove where the entropy came from.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::CertificateError;
use crate::hex::bits_to_string;
use crate::metrics::{mean, population_std_dev};

/// Default lower bound on the foam signature spread.
pub const DEFAULT_MIN_FOAM_STRENGTH: f64 = 0.03;

/// Summary of the expectation values of the surviving bases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoamSignature {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl FoamSignature {
    /// Compute the signature; all fields are 0 for an empty slice.
    pub fn from_expectations(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
                range: 0.0,
            };
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            mean: mean(values),
            std: population_std_dev(values),
            min,
            max,
            range: max - min,
        }
    }
}

/// Verification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CertificatePolicy {
    pub min_foam_strength: f64,
}

impl Default for CertificatePolicy {
    fn default() -> Self {
        Self {
            min_foam_strength: DEFAULT_MIN_FOAM_STRENGTH,
        }
    }
}

/// Tamper-evident record of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// SHA-256 of the output bits rendered as a `0`/`1` string.
    pub entropy_hash: String,
    pub foam_signature: FoamSignature,
    /// SHA-256 of the canonical foam signature.
    pub foam_hash: String,
    pub n_bases: usize,
    pub device: String,
    /// Preparation angle of the entangled pair, when the device exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta_deg: Option<f64>,
    /// RFC 3339 issue time.
    pub timestamp: String,
    pub version: String,
    /// SHA-256 of every other field.
    pub fingerprint: String,
}

impl Certificate {
    /// Issue a certificate for `bits` drawn from bases with the given
    /// expectation values.
    pub fn issue(
        bits: &[u8],
        expectation_values: &[f64],
        device: impl Into<String>,
        theta_deg: Option<f64>,
    ) -> Result<Self, CertificateError> {
        let foam_signature = FoamSignature::from_expectations(expectation_values);
        let mut certificate = Self {
            entropy_hash: sha256_hex(bits_to_string(bits).as_bytes()),
            foam_hash: canonical_hash(&serde_json::to_value(foam_signature)?),
            foam_signature,
            n_bases: expectation_values.len(),
            device: device.into(),
            theta_deg,
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            fingerprint: String::new(),
        };
        certificate.fingerprint = certificate.compute_fingerprint()?;
        Ok(certificate)
    }

    /// Fingerprint over every field except the fingerprint itself.
    pub fn compute_fingerprint(&self) -> Result<String, CertificateError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("fingerprint");
        }
        Ok(canonical_hash(&value))
    }

    /// Check integrity and the foam strength threshold.
    pub fn verify(&self, policy: &CertificatePolicy) -> Result<(), CertificateError> {
        if self.compute_fingerprint()? != self.fingerprint {
            return Err(CertificateError::FingerprintMismatch);
        }
        if canonical_hash(&serde_json::to_value(self.foam_signature)?) != self.foam_hash {
            return Err(CertificateError::FoamHashMismatch);
        }
        if self.foam_signature.std < policy.min_foam_strength {
            return Err(CertificateError::WeakFoamSignature {
                std: self.foam_signature.std,
                minimum: policy.min_foam_strength,
            });
        }
        Ok(())
    }
}

// serde_json's default map is a BTreeMap, so `Value` serializes with sorted keys.
fn canonical_hash(value: &Value) -> String {
    sha256_hex(value.to_string().as_bytes())
}

fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Certificate {
        Certificate::issue(&[1, 0, 1, 1], &[0.9, -0.2, 0.1, 0.5], "sim", Some(45.0)).unwrap()
    }

    #[test]
    fn test_signature() {
        let sig = FoamSignature::from_expectations(&[0.5, -0.5, 0.0]);
        assert_eq!(sig.min, -0.5);
        assert_eq!(sig.max, 0.5);
        assert_eq!(sig.range, 1.0);
        assert!(sig.mean.abs() < 1e-12);
    }

    #[test]
    fn test_issued_certificate_verifies() {
        let cert = sample();
        assert_eq!(cert.n_bases, 4);
        assert_eq!(cert.entropy_hash.len(), 64);
        assert!(cert.verify(&CertificatePolicy::default()).is_ok());
    }

    #[test]
    fn test_theta_is_recorded_and_bound() {
        let cert = sample();
        assert_eq!(cert.theta_deg, Some(45.0));

        let mut edited = cert.clone();
        edited.theta_deg = Some(30.0);
        assert!(matches!(
            edited.verify(&CertificatePolicy::default()),
            Err(CertificateError::FingerprintMismatch)
        ));
    }

    #[test]
    fn test_theta_omitted_when_unknown() {
        let cert = Certificate::issue(&[1, 0], &[0.5, -0.5], "remote", None).unwrap();
        let json = serde_json::to_value(&cert).unwrap();
        assert!(json.get("theta_deg").is_none());

        let parsed: Certificate = serde_json::from_value(json).unwrap();
        assert!(parsed.verify(&CertificatePolicy::default()).is_ok());
    }

    #[test]
    fn test_tampering_detected() {
        let mut cert = sample();
        cert.device = "other".into();
        assert!(matches!(
            cert.verify(&CertificatePolicy::default()),
            Err(CertificateError::FingerprintMismatch)
        ));

        let mut cert = sample();
        cert.foam_signature.std = 0.9;
        cert.fingerprint = cert.compute_fingerprint().unwrap();
        assert!(matches!(
            cert.verify(&CertificatePolicy::default()),
            Err(CertificateError::FoamHashMismatch)
        ));
    }

    #[test]
    fn test_weak_signature_rejected() {
        let cert = Certificate::issue(&[1, 0], &[0.04, 0.04, 0.04], "sim", None).unwrap();
        assert!(matches!(
            cert.verify(&CertificatePolicy::default()),
            Err(CertificateError::WeakFoamSignature { .. })
        ));
        let lenient = CertificatePolicy {
            min_foam_strength: 0.0,
        };
        assert!(cert.verify(&lenient).is_ok());
    }
}
