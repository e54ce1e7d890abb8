use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::DecodeError;
use base64::Engine;
use serde::Deserialize;
use serde::Serialize;

use crate::Crd;
use crate::CrdNames;
use crate::Header;
use crate::Spec;
use crate::Status;

//
// Secret Object
const SECRET_API: Crd = Crd {
    group: "core",
    version: "v1",
    names: CrdNames {
        kind: "Secret",
        plural: "secrets",
        singular: "secret",
    },
};

impl Spec for SecretSpec {
    type Status = SecretStatus;
    type Header = SecretHeader;

    fn metadata() -> &'static Crd {
        &SECRET_API
    }
}

#[derive(Deserialize, Serialize, Debug, Eq, PartialEq, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SecretSpec {}

#[derive(Deserialize, Serialize, Default, Eq, PartialEq, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SecretStatus {}

impl Status for SecretStatus {}

/// secret payload, values are base64 encoded
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretHeader {
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(rename = "type", default)]
    pub ty: String,
}

impl Header for SecretHeader {}

impl SecretHeader {
    /// decoded value for key, none if key is absent
    pub fn get_bytes(&self, key: &str) -> Option<Result<Vec<u8>, DecodeError>> {
        self.data.get(key).map(|value| STANDARD.decode(value))
    }

    pub fn put_bytes<K: Into<String>>(&mut self, key: K, value: &[u8]) {
        self.data.insert(key.into(), STANDARD.encode(value));
    }

    /// replace whole payload with single entry
    pub fn set_single_entry<K: Into<String>>(&mut self, key: K, value: &[u8]) {
        self.data.clear();
        self.put_bytes(key, value);
    }
}
