//! Read-only queries for the presentation layer
//!
//! The UI never touches documents directly; it reads these projections and
//! pushes edits back through
//! [`EditState`](crate::edit::EditState). Everything returned is owned and
//! serialisable so callers can print it as JSON.

use serde::Serialize;
use serde_json::Value;

use crate::address::InstanceAddress;
use crate::catalogue::{Catalogue, PropertyType};
use crate::edit::{EditState, EditValue};
use crate::error::Error;
use crate::merge;

/// Identity card of a selected board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardSummary {
    pub id: String,
    pub model: String,
    pub device: String,
}

/// One row of the LED table.
#[derive(Debug, Clone, Serialize)]
pub struct LedRow {
    pub id: String,
    pub port: String,
    pub pin: String,
}

/// One editable property of a selected peripheral instance.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyRow {
    pub name: String,
    /// Declared schema type, `None` for untyped properties.
    #[serde(rename = "type")]
    pub ty: Option<PropertyType>,
    /// Edited value when one is stored, else the merged record's value.
    pub current: String,
}

/// Board ids, sorted, optionally restricted to a name prefix so a selector
/// can list a single vendor's boards (e.g. `nrf`).
pub fn board_list<'a>(catalogue: &'a Catalogue, prefix: Option<&str>) -> Vec<&'a str> {
    let mut ids: Vec<&str> = catalogue
        .board_ids()
        .filter(|id| prefix.map_or(true, |p| id.starts_with(p)))
        .collect();
    ids.sort_unstable();
    ids
}

pub fn board_summary(catalogue: &Catalogue, board_id: &str) -> Result<BoardSummary, Error> {
    Ok(BoardSummary {
        id: board_id.to_string(),
        model: catalogue.model_of(board_id)?.to_string(),
        device: catalogue.board_device_of(board_id)?.to_string(),
    })
}

/// `name:index` labels for every peripheral instance in the merged view.
pub fn peripheral_instances(
    catalogue: &Catalogue,
    device_id: &str,
    board_id: Option<&str>,
) -> Result<Vec<String>, Error> {
    let view = merge::merged_peripherals(catalogue, device_id, board_id)?;
    Ok(view
        .iter()
        .flat_map(|(name, records)| {
            (0..records.len()).map(move |i| format!("{name}:{i}"))
        })
        .collect())
}

/// The instance labels a board's interface overrides address. A selection
/// UI moves these from the available list into the selected list when a
/// board is chosen.
pub fn board_preselected(
    catalogue: &Catalogue,
    device_id: &str,
    board_id: &str,
) -> Result<Vec<String>, Error> {
    let available = peripheral_instances(catalogue, device_id, Some(board_id))?;
    let mut selected = Vec::new();
    for raw_key in catalogue.board_interfaces(board_id)?.keys() {
        let address = crate::address::parse(raw_key);
        let label = format!("{}:{}", address.name, address.record_index());
        if available.contains(&label) && !selected.contains(&label) {
            selected.push(label);
        }
    }
    Ok(selected)
}

/// LED table rows, skipping the `compatible` entry that sits alongside the
/// LEDs in the board document.
pub fn led_table(catalogue: &Catalogue, board_id: &str) -> Result<Vec<LedRow>, Error> {
    let leds = catalogue.leds_of(board_id)?;
    Ok(leds
        .iter()
        .filter(|(id, _)| id.as_str() != "compatible")
        .map(|(id, value)| {
            let gpios = value
                .as_array()
                .and_then(|records| records.first())
                .and_then(|record| record.get("gpios"))
                .and_then(|v| v.as_array());
            LedRow {
                id: id.clone(),
                port: gpios
                    .and_then(|g| g.first())
                    .map(display_value)
                    .unwrap_or_default(),
                pin: gpios
                    .and_then(|g| g.get(1))
                    .map(display_value)
                    .unwrap_or_default(),
            }
        })
        .collect())
}

/// Property rows for one selected peripheral instance: every property the
/// schema declares, with the stored edit when present, else the value from
/// the merged record.
pub fn property_rows(
    catalogue: &Catalogue,
    edits: &EditState,
    device_id: &str,
    board_id: Option<&str>,
    address: &InstanceAddress,
) -> Result<Vec<PropertyRow>, Error> {
    let schema = catalogue.schema_for(device_id, address)?.clone();
    let record = merge::peripheral_record(catalogue, device_id, address, board_id)?;

    Ok(schema
        .iter()
        .map(|(name, decl)| {
            let current = match edits.get_value(address, name) {
                Ok(value) => display_edit(value),
                Err(_) => record.get(name).map(display_value).unwrap_or_default(),
            };
            PropertyRow {
                name: name.clone(),
                ty: decl.ty,
                current,
            }
        })
        .collect())
}

fn display_edit(value: &EditValue) -> String {
    match value {
        EditValue::Int(n) => n.to_string(),
        EditValue::Array(items) => items.join(" "),
        EditValue::String(s) | EditValue::Untyped(s) => s.clone(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::parse;
    use crate::catalogue::testutil::sample_catalogue;

    const DEVICE: &str = "nrf52840_pca10056_board";
    const BOARD: &str = "nrf52840_pca10056";

    #[test]
    fn test_board_list_with_prefix() {
        let catalogue = sample_catalogue();
        assert_eq!(board_list(&catalogue, Some("nrf")), ["nrf52840_pca10056"]);
        assert!(board_list(&catalogue, Some("stm")).is_empty());
        assert_eq!(board_list(&catalogue, None).len(), 1);
    }

    #[test]
    fn test_board_summary() {
        let catalogue = sample_catalogue();
        let summary = board_summary(&catalogue, BOARD).unwrap();
        assert_eq!(summary.model, "nRF52840 PCA10056 Dev Kit");
        assert_eq!(summary.device, DEVICE);
    }

    #[test]
    fn test_peripheral_instances_enumerated_per_record() {
        let catalogue = sample_catalogue();
        let instances = peripheral_instances(&catalogue, DEVICE, Some(BOARD)).unwrap();
        assert!(instances.contains(&"uart:0".to_string()));
        assert!(instances.contains(&"uart:1".to_string()));
        assert!(instances.contains(&"gpio:0".to_string()));
    }

    #[test]
    fn test_board_preselected_interfaces() {
        let catalogue = sample_catalogue();
        let selected = board_preselected(&catalogue, DEVICE, BOARD).unwrap();
        // "&uart0" resolves to uart:0; "&spi" targets a peripheral the
        // merged view does not carry.
        assert_eq!(selected, ["uart:0"]);
    }

    #[test]
    fn test_led_table_skips_compatible() {
        let catalogue = sample_catalogue();
        let rows = led_table(&catalogue, BOARD).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "led0");
        assert_eq!(rows[0].port, "&gpio0");
        assert_eq!(rows[0].pin, "13");
    }

    #[test]
    fn test_property_rows_prefer_stored_edits() {
        let catalogue = sample_catalogue();
        let mut edits = EditState::new();
        let uart0 = parse("uart:0");
        edits
            .store(&catalogue, DEVICE, &uart0, "current-speed", "57600")
            .unwrap();

        let rows = property_rows(&catalogue, &edits, DEVICE, Some(BOARD), &uart0).unwrap();
        let speed = rows.iter().find(|r| r.name == "current-speed").unwrap();
        assert_eq!(speed.current, "57600");
        assert_eq!(speed.ty, Some(PropertyType::Int));

        // An unedited property shows the merged record's value.
        let status = rows.iter().find(|r| r.name == "status").unwrap();
        assert_eq!(status.current, "ok");
    }
}
