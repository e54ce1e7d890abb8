//!
//! # Fingerprints
//!
//! Content hash over named byte blobs, used as change detection key.
//! Pure function of its input: no randomness, clock or platform dependency.
//! Collisions are treated as "no change".
//!
use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::CertificateKeyPair;

pub const CA_CERTIFICATE_LABEL: &str = "ca-certificate";
pub const CA_PRIVATE_KEY_LABEL: &str = "ca-private-key";
pub const BOOTSTRAP_CONFIGURATION_LABEL: &str = "bootstrap-configuration";

/// Hex encoded SHA-256 over entries in label order.
///
/// Each label and value is prefixed by its length, so moving bytes
/// between label and value or between entries changes the result.
pub fn calculate_map_checksum(data: &BTreeMap<&str, &[u8]>) -> String {
    let mut hasher = Sha256::new();
    for (label, value) in data {
        hasher.update((label.len() as u64).to_be_bytes());
        hasher.update(label.as_bytes());
        hasher.update((value.len() as u64).to_be_bytes());
        hasher.update(value);
    }
    hex::encode(hasher.finalize())
}

/// checksum of raw bootstrap configuration document
pub fn blueprint_checksum(document: &[u8]) -> String {
    let mut data = BTreeMap::new();
    data.insert(BOOTSTRAP_CONFIGURATION_LABEL, document);
    calculate_map_checksum(&data)
}

/// Checksum a credential derived from CA and bootstrap configuration is expected to carry.
/// Kind of credential is not part of it.
pub fn credential_checksum(ca: &CertificateKeyPair, blueprint_checksum: &str) -> String {
    let mut data: BTreeMap<&str, &[u8]> = BTreeMap::new();
    data.insert(CA_CERTIFICATE_LABEL, &ca.certificate);
    data.insert(CA_PRIVATE_KEY_LABEL, &ca.private_key);
    data.insert(BOOTSTRAP_CONFIGURATION_LABEL, blueprint_checksum.as_bytes());
    calculate_map_checksum(&data)
}
