//! overlaygen - Device tree overlay composer
//!
//! This crate layers three independent data sources (a device description,
//! a board description and a binding/schema catalogue) into one merged
//! peripheral view, lets a caller edit individual peripheral properties with
//! schema-driven type coercion, and renders the accumulated edits as a
//! deterministic plain-text devicetree overlay.

pub mod address;
pub mod catalogue;
pub mod edit;
pub mod error;
pub mod merge;
pub mod render;
pub mod view;

pub use address::{parse, InstanceAddress, UNINDEXED};
pub use catalogue::{Catalogue, FileLoader, LoadReport, LoaderConfig, SourceKind};
pub use edit::{EditState, EditValue, LedField};
pub use error::Error;
pub use merge::{merged_peripherals, peripheral_record, PeripheralView};
pub use render::render;
