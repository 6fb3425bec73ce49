//! Instance address parsing
//!
//! Peripheral references arrive in several raw spellings: device-internal
//! names (`uart`), UI labels with a `:` separator (`uart:0`) and board
//! interface keys with a leading `&` sigil (`&uart0`, `&uart:1`). All of
//! them normalise to a (name, instance) pair; a reference without a trailing
//! digit gets the `UNINDEXED` sentinel and applies to instance 0.

/// Sentinel instance index meaning "unindexed / apply to index 0".
pub const UNINDEXED: i32 = -1;

/// Normalised peripheral reference.
///
/// This struct is also the edit-store key. Keeping the name and index as
/// separate fields gives a well-defined equality: `("uart1", UNINDEXED)` and
/// `("uart", 1)` are distinct keys, where a concatenated string key would
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct InstanceAddress {
    pub name: String,
    pub instance: i32,
}

impl InstanceAddress {
    pub fn new(name: impl Into<String>, instance: i32) -> Self {
        Self {
            name: name.into(),
            instance,
        }
    }

    /// Index of the instance record this address selects in a per-peripheral
    /// sequence: the sentinel maps to 0.
    pub fn record_index(&self) -> usize {
        if self.instance < 0 {
            0
        } else {
            self.instance as usize
        }
    }

    /// Display label used in overlay stanzas and UI lists: `uart0` for an
    /// indexed address, bare `uart` for the sentinel.
    pub fn label(&self) -> String {
        if self.instance < 0 {
            self.name.clone()
        } else {
            format!("{}{}", self.name, self.instance)
        }
    }
}

impl std::fmt::Display for InstanceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.instance)
    }
}

/// Parse a raw peripheral reference into a normalised address.
///
/// The trailing character of the raw input decides whether an instance
/// index is present; `:` separators and a leading `&` sigil are stripped
/// from the name. Malformed input never fails: it degrades to the
/// `UNINDEXED` sentinel with the full remainder as the name.
pub fn parse(raw: &str) -> InstanceAddress {
    let instance = raw
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map_or(UNINDEXED, |d| d as i32);

    let stripped: String = raw.chars().filter(|&c| c != ':').collect();
    let mut name = stripped.strip_prefix('&').unwrap_or(&stripped);

    if instance != UNINDEXED {
        // The index digit is ASCII, so the byte slice is char-safe.
        name = &name[..name.len() - 1];
    }

    InstanceAddress::new(name, instance)
}
