//! Catalogue of the three loaded documents
//!
//! The catalogue is populated once by the loader and read-only for the rest
//! of the session. It exposes the typed lookups the merge engine, edit state
//! and presentation queries are built on.

mod document;
mod loader;

pub use document::{
    Binding, BindingDoc, BoardDeviceTree, BoardDoc, BoardRecord, DeviceDoc, DeviceRecord,
    DeviceTree, PropertyDecl, PropertyRecord, PropertyType, Schema,
};
pub use loader::{FileLoader, LoadReport, LoaderConfig, SourceKind};

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::address::InstanceAddress;
use crate::error::Error;
use crate::merge;

/// Binding used when a peripheral's compatible string matches nothing in the
/// binding document. A permissive default for unknown hardware, not an error.
pub const DEFAULT_COMPATIBLE: &str = "nordic,nrf-uart";

/// Property every binding declares after load-time normalisation.
const STATUS_PROPERTY: &str = "status";

/// The three loaded documents plus lookups over them.
#[derive(Debug, Default)]
pub struct Catalogue {
    devices: Option<DeviceDoc>,
    boards: Option<BoardDoc>,
    bindings: Option<BindingDoc>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once all three documents are present. Callers must check this
    /// before querying the merge engine.
    pub fn is_ready(&self) -> bool {
        self.devices.is_some() && self.boards.is_some() && self.bindings.is_some()
    }

    pub fn insert_devices(&mut self, doc: DeviceDoc) {
        self.devices = Some(doc);
    }

    pub fn insert_boards(&mut self, doc: BoardDoc) {
        self.boards = Some(doc);
    }

    /// Install the binding document, normalising every binding to declare a
    /// `status: string` property.
    pub fn insert_bindings(&mut self, mut doc: BindingDoc) {
        for binding in doc.values_mut() {
            binding
                .properties
                .entry(STATUS_PROPERTY.to_string())
                .or_insert_with(|| PropertyDecl::of_type(PropertyType::String));
        }
        self.bindings = Some(doc);
    }

    pub fn device(&self, device_id: &str) -> Result<&DeviceRecord, Error> {
        self.devices
            .as_ref()
            .and_then(|d| d.get(device_id))
            .ok_or_else(|| Error::DeviceNotFound(device_id.to_string()))
    }

    pub fn board(&self, board_id: &str) -> Result<&BoardRecord, Error> {
        self.boards
            .as_ref()
            .and_then(|b| b.get(board_id))
            .ok_or_else(|| Error::BoardNotFound(board_id.to_string()))
    }

    /// Immediate parent device of `device_id`, `Ok(None)` when the device
    /// declares no dependency.
    pub fn dependency_of(&self, device_id: &str) -> Result<Option<&str>, Error> {
        Ok(self
            .device(device_id)?
            .devicetree
            .dependency
            .first()
            .map(String::as_str))
    }

    /// Resolve the binding schema for one peripheral instance.
    ///
    /// The compatible string comes from the board-less merged view; an
    /// unmatched compatible falls back to [`DEFAULT_COMPATIBLE`].
    pub fn schema_for(
        &self,
        device_id: &str,
        address: &InstanceAddress,
    ) -> Result<&Schema, Error> {
        let record = merge::peripheral_record(self, device_id, address, None)?;
        let compatible = record
            .get("compatible")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let bindings = self
            .bindings
            .as_ref()
            .ok_or_else(|| Error::BindingNotFound(compatible.clone()))?;

        if let Some(binding) = bindings.get(&compatible) {
            return Ok(&binding.properties);
        }

        warn!(
            compatible = %compatible,
            fallback = DEFAULT_COMPATIBLE,
            "no binding for compatible string, using default"
        );
        bindings
            .get(DEFAULT_COMPATIBLE)
            .map(|b| &b.properties)
            .ok_or(Error::BindingNotFound(compatible))
    }

    /// Every board entry keyed by a sigil-prefixed interface reference, each
    /// override record cloned so callers cannot alias catalogue storage.
    pub fn board_interfaces(
        &self,
        board_id: &str,
    ) -> Result<BTreeMap<String, PropertyRecord>, Error> {
        let board = self.board(board_id)?;
        Ok(board
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with('&'))
            .filter_map(|(key, value)| {
                value
                    .as_object()
                    .map(|record| (key.clone(), record.clone()))
            })
            .collect())
    }

    pub fn leds_of(&self, board_id: &str) -> Result<&BTreeMap<String, Value>, Error> {
        Ok(&self.board(board_id)?.devicetree.leds)
    }

    pub fn model_of(&self, board_id: &str) -> Result<&str, Error> {
        Ok(self
            .board(board_id)?
            .devicetree
            .model
            .first()
            .map(String::as_str)
            .unwrap_or_default())
    }

    /// Base device the board builds on (`devicetree.dependency[0]`).
    pub fn board_device_of(&self, board_id: &str) -> Result<&str, Error> {
        self.board(board_id)?
            .devicetree
            .dependency
            .first()
            .map(String::as_str)
            .ok_or_else(|| Error::MissingBoardDevice(board_id.to_string()))
    }

    pub fn board_ids(&self) -> impl Iterator<Item = &str> {
        self.boards.iter().flat_map(|b| b.keys()).map(String::as_str)
    }

    pub fn device_ids(&self) -> impl Iterator<Item = &str> {
        self.devices
            .iter()
            .flat_map(|d| d.keys())
            .map(String::as_str)
    }
}
