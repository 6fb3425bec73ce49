//! Error taxonomy for the overlay composer.
//!
//! Direct id lookups fail loudly; schema fallback and undeclared-property
//! writes are soft paths that log and continue, so they have no variants
//! here. Load failures are reported per source so one bad document does not
//! poison the other two.

use crate::catalogue::SourceKind;

/// Errors surfaced by the catalogue, merge engine and edit state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown device: {0}")]
    DeviceNotFound(String),

    #[error("unknown board: {0}")]
    BoardNotFound(String),

    #[error("unknown peripheral {name}:{instance}")]
    PeripheralNotFound { name: String, instance: i32 },

    #[error("no binding for compatible {0:?} and the default binding is absent")]
    BindingNotFound(String),

    #[error("unknown LED {led} on board {board}")]
    LedNotFound { board: String, led: String },

    #[error("no stored value for {property} on {peripheral}")]
    ValueNotFound { peripheral: String, property: String },

    #[error("board {0} does not name a base device")]
    MissingBoardDevice(String),

    #[error("failed to load {kind} document: {reason}")]
    LoadFailure { kind: SourceKind, reason: String },

    #[error("failed to read loader config: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_names_source() {
        let err = Error::LoadFailure {
            kind: SourceKind::Bindings,
            reason: "expected value at line 1".to_string(),
        };
        assert!(err.to_string().contains("bindings"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_not_found_messages() {
        assert_eq!(
            Error::DeviceNotFound("nrf52840".into()).to_string(),
            "unknown device: nrf52840"
        );
        let err = Error::PeripheralNotFound {
            name: "uart".into(),
            instance: 2,
        };
        assert_eq!(err.to_string(), "unknown peripheral uart:2");
    }
}
