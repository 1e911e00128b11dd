//! The validated, ordered package list carried by a preset.
//!
//! The relational row stores the list as a JSON-encoded text column; this
//! type is the only place that encoding is parsed or produced, so callers
//! above the store adapter never see a raw string.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Minimum number of packages a preset may compare.
pub const MIN_PACKAGES: usize = 2;
/// Maximum number of packages a preset may compare.
pub const MAX_PACKAGES: usize = 10;

const TRENDS_BASE_URL: &str = "https://npmtrends.com";

/// Ordered, deduplicated, lower-cased list of validated package names.
///
/// Construction goes through [`PackageList::parse`]; a value that exists is
/// always within bounds, so downstream code carries no re-validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PackageList(Vec<String>);

impl PackageList {
    /// Normalize and validate raw package names as submitted by a caller.
    ///
    /// Names are trimmed and lower-cased, duplicates are dropped while
    /// preserving first-occurrence order, and anything outside the allowed
    /// character set is rejected from the list. The raw submission must hold
    /// between [`MIN_PACKAGES`] and [`MAX_PACKAGES`] entries, and at least
    /// [`MIN_PACKAGES`] names must survive normalization.
    pub fn parse(raw: &[String]) -> Result<Self, DomainError> {
        if raw.len() < MIN_PACKAGES {
            return Err(DomainError::validation(format!(
                "a preset needs at least {MIN_PACKAGES} packages"
            )));
        }
        if raw.len() > MAX_PACKAGES {
            return Err(DomainError::validation(format!(
                "a preset may compare at most {MAX_PACKAGES} packages"
            )));
        }

        let mut names = Vec::with_capacity(raw.len());
        for name in raw {
            let name = name.trim().to_lowercase();
            if !is_valid_name(&name) || names.contains(&name) {
                continue;
            }
            names.push(name);
        }

        if names.len() < MIN_PACKAGES {
            return Err(DomainError::validation(format!(
                "at least {MIN_PACKAGES} distinct valid package names are required"
            )));
        }

        Ok(Self(names))
    }

    /// Decode the JSON text stored in the preset row.
    pub fn from_stored(stored: &str) -> Result<Self, DomainError> {
        let names: Vec<String> = serde_json::from_str(stored)
            .map_err(|err| DomainError::invariant(format!("stored package list is corrupt: {err}")))?;
        Self::parse(&names)
    }

    /// Encode for the preset row's text column.
    pub fn to_stored(&self) -> String {
        serde_json::to_string(&self.0).expect("a vec of strings always encodes")
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The comparison URL derived from the list, e.g.
    /// `https://npmtrends.com/react-vs-vue`.
    pub fn trends_url(&self) -> String {
        format!("{TRENDS_BASE_URL}/{}", self.0.join("-vs-"))
    }
}

impl TryFrom<Vec<String>> for PackageList {
    type Error = DomainError;

    fn try_from(raw: Vec<String>) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<PackageList> for Vec<String> {
    fn from(list: PackageList) -> Self {
        list.0
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '@' | '.' | '_' | '/' | '-'))
}
