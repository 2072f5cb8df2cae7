//! Serde support for PATCH-style fields that distinguish "absent" from "null".
//!
//! `Option<Option<T>>` with `#[serde(default, deserialize_with = "nullable::deserialize")]`
//! decodes as:
//! - field missing: `None` (leave untouched)
//! - field `null`: `Some(None)` (clear)
//! - field set: `Some(Some(value))`

use serde::{Deserialize, Deserializer};

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
