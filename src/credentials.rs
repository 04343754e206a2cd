//! Credential authorization.
//!
//! The controller only needs an answer to "who is this code?". That answer
//! comes from a [`CredentialAuthorizer`]; [`CredentialLists`] is the stock
//! implementation backed by the owner and delivery lists from the
//! configuration.

use crate::config::bounded_string;
#[cfg(feature = "serde-json-core")]
use crate::config::CredentialConfig;

/// Maximum length of an attribution label.
pub const MAX_LABEL: usize = 48;

/// Maximum length of a stored credential code.
pub const MAX_CODE: usize = 16;

/// Maximum entries per list.
pub const MAX_CREDENTIALS: usize = 16;

/// Attribution label: who asked for the door to open.
pub type Label = heapless::String<MAX_LABEL>;

/// Build a [`Label`], truncating on a character boundary.
pub fn label(s: &str) -> Label {
    bounded_string(s)
}

/// Result of looking up a credential code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authorization {
    /// Owner code: opens the mail door.
    Owner(Label),
    /// Delivery code: opens the parcel door.
    Delivery(Label),
    /// Not on either list.
    Denied,
}

/// Maps a credential code to an [`Authorization`].
///
/// `code_hex` is upper-case hex without leading zeros.
pub trait CredentialAuthorizer {
    /// Look up `code_hex`.
    fn authorize(&self, code_hex: &str) -> Authorization;
}

impl<F> CredentialAuthorizer for F
where
    F: Fn(&str) -> Authorization,
{
    fn authorize(&self, code_hex: &str) -> Authorization {
        self(code_hex)
    }
}

/// Reasons a credential list is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialError {
    /// JSON did not match `[{"code": "...", "label": "..."}]`, or a field
    /// was too long.
    Malformed,
    /// More than [`MAX_CREDENTIALS`] entries.
    TooMany,
}

impl core::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CredentialError::Malformed => f.write_str("malformed credential list"),
            CredentialError::TooMany => {
                write!(f, "credential list longer than {} entries", MAX_CREDENTIALS)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CredentialError {}

/// One list entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CredentialEntry {
    /// Hex code as printed by the reader.
    pub code: heapless::String<MAX_CODE>,
    /// Name recorded as the attribution on a match.
    pub label: Label,
}

impl CredentialEntry {
    fn matches(&self, code_hex: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code_hex.trim())
    }
}

type EntryList = heapless::Vec<CredentialEntry, MAX_CREDENTIALS>;

/// Owner and delivery lists. Owner entries win when a code is on both.
#[derive(Clone, Debug, Default)]
pub struct CredentialLists {
    owners: EntryList,
    deliveries: EntryList,
}

impl CredentialLists {
    /// Empty lists: every code is denied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse both lists from their JSON text.
    #[cfg(feature = "serde-json-core")]
    pub fn from_json(owners: &str, deliveries: &str) -> Result<Self, CredentialError> {
        Ok(Self {
            owners: parse_list(owners)?,
            deliveries: parse_list(deliveries)?,
        })
    }

    /// Parse the lists held in the configuration.
    #[cfg(feature = "serde-json-core")]
    pub fn from_config(config: &CredentialConfig) -> Result<Self, CredentialError> {
        Self::from_json(&config.owner_codes, &config.delivery_codes)
    }

    /// Add an owner code.
    pub fn add_owner(&mut self, code: &str, name: &str) -> Result<(), CredentialError> {
        push_entry(&mut self.owners, code, name)
    }

    /// Add a delivery code.
    pub fn add_delivery(&mut self, code: &str, name: &str) -> Result<(), CredentialError> {
        push_entry(&mut self.deliveries, code, name)
    }

    /// Builder form of [`add_owner`](Self::add_owner). Entries past the
    /// capacity are dropped with a warning.
    pub fn with_owner(mut self, code: &str, name: &str) -> Self {
        if self.add_owner(code, name).is_err() {
            log::warn!("credentials: owner list full, {} not added", name);
        }
        self
    }

    /// Builder form of [`add_delivery`](Self::add_delivery).
    pub fn with_delivery(mut self, code: &str, name: &str) -> Self {
        if self.add_delivery(code, name).is_err() {
            log::warn!("credentials: delivery list full, {} not added", name);
        }
        self
    }

    /// Owner entries.
    pub fn owners(&self) -> &[CredentialEntry] {
        &self.owners
    }

    /// Delivery entries.
    pub fn deliveries(&self) -> &[CredentialEntry] {
        &self.deliveries
    }
}

impl CredentialAuthorizer for CredentialLists {
    fn authorize(&self, code_hex: &str) -> Authorization {
        if let Some(entry) = self.owners.iter().find(|e| e.matches(code_hex)) {
            return Authorization::Owner(entry.label.clone());
        }
        if let Some(entry) = self.deliveries.iter().find(|e| e.matches(code_hex)) {
            return Authorization::Delivery(entry.label.clone());
        }
        Authorization::Denied
    }
}

fn push_entry(list: &mut EntryList, code: &str, name: &str) -> Result<(), CredentialError> {
    list.push(CredentialEntry {
        code: bounded_string(code.trim()),
        label: label(name),
    })
    .map_err(|_| CredentialError::TooMany)
}

#[cfg(feature = "serde-json-core")]
fn parse_list(json: &str) -> Result<EntryList, CredentialError> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(EntryList::new());
    }

    // Oversized lists report TooMany, not Malformed.
    if count_objects(json) > MAX_CREDENTIALS {
        return Err(CredentialError::TooMany);
    }

    serde_json_core::from_str::<EntryList>(json)
        .map(|(list, _)| list)
        .map_err(|e| {
            log::warn!("credentials: rejected list: {:?}", e);
            CredentialError::Malformed
        })
}

/// Number of `{` outside string literals.
#[cfg(feature = "serde-json-core")]
fn count_objects(json: &str) -> usize {
    let mut count = 0;
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else {
            match c {
                '"' => in_string = true,
                '{' => count += 1,
                _ => {}
            }
        }
    }
    count
}
