//! Ability validation against a registry of known abilities.

use crate::DelegationError;
use std::collections::BTreeSet;

/// Abilities understood by the storage network services.
pub const DEFAULT_ABILITIES: &[&str] = &[
    "assert/equals",
    "assert/relation",
    "assert/partition",
    "assert/index",
    "assert/inclusion",
    "assert/location",
    "blob/accept",
    "blob/allocate",
    "claim/cache",
    "http/put",
    "pdp/accept",
    "pdp/info",
    "space/blob/add",
    "space/blob/get/0/1",
    "space/blob/list",
    "space/blob/remove",
    "space/blob/replicate",
    "ucan/conclude",
];

/// A registry of abilities that delegations may grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownAbilities(BTreeSet<String>);

impl KnownAbilities {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Add abilities to the registry.
    #[must_use]
    pub fn extend<I, S>(mut self, abilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(abilities.into_iter().map(Into::into));
        self
    }

    /// Whether `ability` is registered. Matching is exact and case-sensitive.
    #[must_use]
    pub fn contains(&self, ability: &str) -> bool {
        self.0.contains(ability)
    }

    /// Iterate over registered abilities in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Fail with [`DelegationError::UnknownCapability`] listing every
    /// ability that is not registered.
    ///
    /// # Errors
    ///
    /// Returns the complete list of unknown abilities, in input order.
    pub fn check<S: AsRef<str>>(&self, abilities: &[S]) -> Result<(), DelegationError> {
        let unknown = validate(abilities, self);
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(DelegationError::UnknownCapability(unknown))
        }
    }
}

impl Default for KnownAbilities {
    fn default() -> Self {
        Self::empty().extend(DEFAULT_ABILITIES.iter().copied())
    }
}

impl<S: Into<String>> FromIterator<S> for KnownAbilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::empty().extend(iter)
    }
}

/// Return every ability in `abilities` that `known` does not contain.
///
/// The whole input is scanned so that callers can report all unknown
/// abilities at once. An empty result means the input is valid.
pub fn validate<S: AsRef<str>>(abilities: &[S], known: &KnownAbilities) -> Vec<String> {
    abilities
        .iter()
        .map(AsRef::as_ref)
        .filter(|ability| !known.contains(ability))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn it_reports_every_unknown_ability() {
        let known = KnownAbilities::from_iter(["blob/accept"]);
        let unknown = validate(&["blob/accept", "x/y", "z/w"], &known);
        assert_eq!(unknown, vec!["x/y".to_string(), "z/w".to_string()]);
    }

    #[test]
    fn it_accepts_known_abilities() {
        let known = KnownAbilities::default();
        assert!(validate(&["blob/allocate", "claim/cache", "ucan/conclude"], &known).is_empty());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let known = KnownAbilities::default();
        assert_eq!(validate(&["Blob/Accept"], &known), vec!["Blob/Accept"]);
    }

    #[test]
    fn it_keeps_duplicates_in_input_order() {
        let known = KnownAbilities::empty();
        assert_eq!(validate(&["b/b", "a/a", "b/b"], &known), vec!["b/b", "a/a", "b/b"]);
    }

    #[test]
    fn check_wraps_the_full_list() {
        let known = KnownAbilities::default().extend(["custom/do"]);
        assert!(known.check(&["custom/do"]).is_ok());

        let err = known.check(&["nope/a", "custom/do", "nope/b"]).unwrap_err();
        match err {
            DelegationError::UnknownCapability(list) => assert_eq!(list, vec!["nope/a", "nope/b"]),
            other => panic!("unexpected error: {other}"),
        }
    }
}
