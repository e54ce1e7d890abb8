//!
//! # CRD Definition
//!
//! Group, version and names identifying an object type in the store
//!
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Crd {
    pub group: &'static str,
    pub version: &'static str,
    pub names: CrdNames,
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CrdNames {
    pub kind: &'static str,
    pub plural: &'static str,
    pub singular: &'static str,
}

pub const GROUP: &str = "controlplane.kcm.io";
pub const V1ALPHA1: &str = "v1alpha1";
