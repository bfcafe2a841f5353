//! Capabilities granted by a delegation.

use ipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A granted ability over a resource.
///
/// Serialized with the UCAN 0.9 field names: `can` for the ability, `with`
/// for the resource and `nb` for caveats. Caveats are always empty for the
/// capabilities issued here, but are kept when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Namespaced verb, e.g. `blob/allocate`.
    #[serde(rename = "can")]
    pub ability: String,

    /// The resource the ability applies to.
    #[serde(rename = "with")]
    pub resource: String,

    /// Caveats (`nb`). Left out of the encoding when empty.
    #[serde(rename = "nb", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub caveats: BTreeMap<String, Ipld>,
}

impl Capability {
    /// A capability without caveats.
    pub fn new(ability: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            ability: ability.into(),
            resource: resource.into(),
            caveats: BTreeMap::new(),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.ability, self.resource)
    }
}

/// A capability requested from the builder.
///
/// The resource is optional; when absent the builder scopes the capability
/// to the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySpec {
    /// Namespaced verb, e.g. `blob/allocate`.
    pub ability: String,

    /// Explicit resource, if any.
    pub resource: Option<String>,
}

impl CapabilitySpec {
    /// Request `ability` over the default resource.
    pub fn new(ability: impl Into<String>) -> Self {
        Self {
            ability: ability.into(),
            resource: None,
        }
    }

    /// Scope the capability to an explicit resource.
    #[must_use]
    pub fn on(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

impl From<&str> for CapabilitySpec {
    fn from(ability: &str) -> Self {
        Self::new(ability)
    }
}

impl From<String> for CapabilitySpec {
    fn from(ability: String) -> Self {
        Self::new(ability)
    }
}
