//! Edit state
//!
//! Append/update-only store of user-entered overlay values. Every write
//! resolves the binding schema first and coerces the raw input to the
//! declared type; a property the schema does not declare is a soft reject
//! (logged, no entry) rather than an error. Entries are keyed by the
//! structured [`InstanceAddress`] plus property id and kept in insertion
//! order, which is what makes the rendered overlay deterministic.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::address::{InstanceAddress, UNINDEXED};
use crate::catalogue::{Catalogue, PropertyType};
use crate::error::Error;

/// A stored overlay value, tagged with its schema-resolved type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum EditValue {
    Int(i64),
    String(String),
    Array(Vec<String>),
    /// The schema declared no type; the raw input is kept verbatim.
    Untyped(String),
}

/// LED fields a user can edit. The LED table stores each LED's `gpios` as a
/// `[port, pin]` pair; edits address one half of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedField {
    Port,
    Pin,
}

/// Highest pin index the gpio controllers accept.
const MAX_PIN: i64 = 31;

/// Accumulated user edits for the session.
#[derive(Debug, Default)]
pub struct EditState {
    entries: IndexMap<InstanceAddress, IndexMap<String, EditValue>>,
}

impl EditState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_value(&self, address: &InstanceAddress, property: &str) -> bool {
        self.entries
            .get(address)
            .is_some_and(|props| props.contains_key(property))
    }

    pub fn get_value(
        &self,
        address: &InstanceAddress,
        property: &str,
    ) -> Result<&EditValue, Error> {
        self.entries
            .get(address)
            .and_then(|props| props.get(property))
            .ok_or_else(|| Error::ValueNotFound {
                peripheral: address.label(),
                property: property.to_string(),
            })
    }

    /// Peripheral entries in insertion order, each with its properties in
    /// insertion order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&InstanceAddress, &IndexMap<String, EditValue>)> {
        self.entries.iter()
    }

    /// Store one user edit, coercing `raw` to the schema-declared type of
    /// `property`.
    ///
    /// Schema resolution failures (unknown device/peripheral) are surfaced;
    /// an undeclared property, or an `int` property that does not parse, is
    /// logged and dropped without touching the store.
    pub fn store(
        &mut self,
        catalogue: &Catalogue,
        device_id: &str,
        address: &InstanceAddress,
        property: &str,
        raw: &str,
    ) -> Result<(), Error> {
        let schema = catalogue.schema_for(device_id, address)?;
        let Some(decl) = schema.get(property) else {
            warn!(peripheral = %address, property, "property not declared in schema, ignored");
            return Ok(());
        };

        let value = match decl.ty {
            Some(PropertyType::Int) => match raw.trim().parse::<i64>() {
                Ok(n) => EditValue::Int(n),
                Err(_) => {
                    warn!(peripheral = %address, property, raw, "not an integer, ignored");
                    return Ok(());
                }
            },
            Some(PropertyType::String) => EditValue::String(raw.to_string()),
            Some(PropertyType::Array) => EditValue::Array(
                raw.split_whitespace().map(str::to_string).collect(),
            ),
            None => EditValue::Untyped(raw.to_string()),
        };

        self.insert(address.clone(), property.to_string(), value);
        Ok(())
    }

    /// Store one LED field edit.
    ///
    /// The `gpios` pair is seeded from the board's LED table the first time
    /// an LED is touched, then the addressed half is replaced. The entry is
    /// stored as an ordinary `Array` value so the renderer emits it like any
    /// other peripheral property.
    pub fn store_led(
        &mut self,
        catalogue: &Catalogue,
        board_id: &str,
        led_id: &str,
        field: LedField,
        raw: &str,
    ) -> Result<(), Error> {
        let address = InstanceAddress::new(led_id, UNINDEXED);

        let mut gpios = match self.get_value(&address, "gpios") {
            Ok(EditValue::Array(pair)) => pair.clone(),
            _ => led_gpios(catalogue, board_id, led_id)?,
        };
        // The pair must hold exactly a port and a pin slot.
        gpios.resize(2, String::new());

        match field {
            LedField::Port => gpios[0] = raw.to_string(),
            LedField::Pin => match raw.trim().parse::<i64>() {
                Ok(pin) if (0..=MAX_PIN).contains(&pin) => gpios[1] = pin.to_string(),
                _ => {
                    warn!(led = led_id, raw, "not a valid pin (0..=31), ignored");
                    return Ok(());
                }
            },
        }

        self.insert(address, "gpios".to_string(), EditValue::Array(gpios));
        Ok(())
    }

    fn insert(&mut self, address: InstanceAddress, property: String, value: EditValue) {
        self.entries
            .entry(address)
            .or_default()
            .insert(property, value);
    }
}

/// Current `[port, pin]` pair of one LED from the board document.
fn led_gpios(catalogue: &Catalogue, board_id: &str, led_id: &str) -> Result<Vec<String>, Error> {
    let leds = catalogue.leds_of(board_id)?;
    let gpios = leds
        .get(led_id)
        .and_then(|v| v.as_array())
        .and_then(|records| records.first())
        .and_then(|record| record.get("gpios"))
        .and_then(|v| v.as_array())
        .ok_or_else(|| Error::LedNotFound {
            board: board_id.to_string(),
            led: led_id.to_string(),
        })?;
    Ok(gpios
        .iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}
