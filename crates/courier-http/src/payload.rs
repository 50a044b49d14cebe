//! JSON payload posted by the demo

use serde::{Deserialize, Serialize};

/// A person record, serialized as `{"name":..,"age":..,"favoriteColor":..}`.
///
/// `age` is a string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    pub age: String,
    pub favorite_color: String,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        age: impl Into<String>,
        favorite_color: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
            favorite_color: favorite_color.into(),
        }
    }

    /// The record sent by the `courier` binary.
    pub fn sample() -> Self {
        Self::new("Kody Simpson", "230", "Blue")
    }
}
