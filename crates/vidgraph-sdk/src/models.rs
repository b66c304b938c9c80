//! Data models for the vidgraph SDK
//!
//! These types describe mutations, transaction modes and engine
//! identifiers, and are shared by both EmbeddedClient and RemoteClient.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::schema::Schema;

/// Engine-assigned node identifier, rendered as `0x<hex>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(u64);

impl Uid {
    pub fn new(raw: u64) -> Self {
        Uid(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for Uid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| format!("uid must start with 0x: {s:?}"))?;
        u64::from_str_radix(hex, 16)
            .map(Uid)
            .map_err(|e| format!("invalid uid {s:?}: {e}"))
    }
}

impl Serialize for Uid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnMode {
    ReadOnly,
    ReadWrite,
}

/// A JSON mutation: objects to set and objects to delete
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mutation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub set: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<serde_json::Value>,
}

impl Mutation {
    /// Mutation that sets the given objects
    pub fn set(objects: Vec<serde_json::Value>) -> Self {
        Self { set: objects, delete: Vec::new() }
    }

    /// Mutation that deletes the given objects
    pub fn delete(objects: Vec<serde_json::Value>) -> Self {
        Self { set: Vec::new(), delete: objects }
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.delete.is_empty()
    }
}

/// Result of a mutation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Blank-node name (without the `_:` prefix) to assigned uid
    #[serde(default)]
    pub uids: HashMap<String, Uid>,
}

/// Schema-level operation sent through `alter`
#[derive(Debug, Clone)]
pub enum Operation {
    /// Declare (or extend) predicates and types
    Schema(Schema),
    /// Remove all data and the schema
    DropAll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_round_trips_through_hex() {
        let uid: Uid = "0x1f".parse().unwrap();
        assert_eq!(uid.as_u64(), 31);
        assert_eq!(uid.to_string(), "0x1f");
        assert!("31".parse::<Uid>().is_err());
    }

    #[test]
    fn test_mutation_skips_empty_sides() {
        let m = Mutation::set(vec![serde_json::json!({"uid": "_:a"})]);
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("delete").is_none());
        assert_eq!(json["set"][0]["uid"], "_:a");
    }
}
