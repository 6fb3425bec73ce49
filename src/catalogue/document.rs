//! Typed shapes of the three catalogue documents.
//!
//! Documents arrive as JSON (the loader collaborator decodes them); the
//! shapes here keep the sections the core reads strongly typed and carry
//! everything else through flattened maps so nothing is dropped on a
//! decode/encode round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One per-instance property record: property name -> value.
pub type PropertyRecord = serde_json::Map<String, Value>;

/// Device document: device id -> record.
pub type DeviceDoc = BTreeMap<String, DeviceRecord>;

/// Board document: board id -> record.
pub type BoardDoc = BTreeMap<String, BoardRecord>;

/// Binding document: compatible string -> binding.
pub type BindingDoc = BTreeMap<String, Binding>;

/// A device catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub devicetree: DeviceTree,
    #[serde(flatten)]
    pub extra: PropertyRecord,
}

/// The `devicetree` section of a device entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTree {
    /// Peripheral name -> ordered per-instance property records.
    #[serde(default)]
    pub soc: BTreeMap<String, Vec<PropertyRecord>>,
    /// Ordered device identifiers; index 0 is the immediate parent.
    #[serde(default)]
    pub dependency: Vec<String>,
    #[serde(flatten)]
    pub extra: PropertyRecord,
}

/// A board catalogue entry. Interface override entries (`&uart0`, ...) sit
/// next to `devicetree` at the top level of the record, so they land in the
/// flattened map and are filtered by sigil when queried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardRecord {
    pub devicetree: BoardDeviceTree,
    #[serde(flatten)]
    pub entries: BTreeMap<String, Value>,
}

/// The `devicetree` section of a board entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardDeviceTree {
    /// LED id -> LED records (plus a `compatible` key the queries skip).
    #[serde(default)]
    pub leds: BTreeMap<String, Value>,
    #[serde(default)]
    pub model: Vec<String>,
    /// Index 0 names the board's base device.
    #[serde(default)]
    pub dependency: Vec<String>,
    #[serde(flatten)]
    pub extra: PropertyRecord,
}

/// A binding/schema catalogue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    #[serde(default)]
    pub properties: Schema,
    #[serde(flatten)]
    pub extra: PropertyRecord,
}

/// Declared properties of one binding: property name -> declaration.
pub type Schema = BTreeMap<String, PropertyDecl>;

/// A single property declaration inside a binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDecl {
    /// Declared type tag; absent means the value is stored verbatim.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<PropertyType>,
    #[serde(flatten)]
    pub extra: PropertyRecord,
}

impl PropertyDecl {
    pub fn of_type(ty: PropertyType) -> Self {
        Self {
            ty: Some(ty),
            extra: PropertyRecord::new(),
        }
    }
}

/// Closed set of declared property types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Int,
    String,
    Array,
}
