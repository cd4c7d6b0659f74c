use serde::{Deserialize, Serialize};

/// Postal address attached to projects and orders.
///
/// All fields are optional; callers typically supply only what they know
/// about the site (often just a city).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl Address {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.street.is_none() && self.city.is_none() && self.zip.is_none()
    }
}
