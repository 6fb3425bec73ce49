//! Merge engine
//!
//! Produces the effective peripheral table for a (device, board) pair:
//! a shallow field-union of the base device with its dependency device
//! (dependency wins), then board interface overrides written over the
//! addressed instance records property by property. Precedence is therefore
//! board > dependency-device > base-device.
//!
//! Every call returns a fresh structure; the catalogue is never aliased and
//! never mutated through a merged view.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::address::{self, InstanceAddress};
use crate::catalogue::{Catalogue, DeviceTree, PropertyRecord};
use crate::error::Error;

/// The merged peripheral table: peripheral name -> ordered instance records.
pub type PeripheralView = BTreeMap<String, Vec<PropertyRecord>>;

/// Build the merged peripheral view for `device_id`, with `board_id`'s
/// interface overrides applied when a board is selected.
///
/// Overrides referencing a peripheral name absent from the merged `soc` map,
/// or an instance index past the end of its record sequence, are skipped;
/// overrides never create peripheral entries.
pub fn merged_peripherals(
    catalogue: &Catalogue,
    device_id: &str,
    board_id: Option<&str>,
) -> Result<PeripheralView, Error> {
    let mut soc = union_with_dependency(catalogue, device_id)?.soc;

    if let Some(board_id) = board_id {
        for (raw_key, overrides) in catalogue.board_interfaces(board_id)? {
            let address = address::parse(&raw_key);
            let Some(records) = soc.get_mut(&address.name) else {
                debug!(interface = %raw_key, "override targets unknown peripheral, skipped");
                continue;
            };
            let Some(record) = records.get_mut(address.record_index()) else {
                warn!(
                    interface = %raw_key,
                    instances = records.len(),
                    "override instance index out of range, skipped"
                );
                continue;
            };
            for (property, value) in overrides {
                record.insert(property, value);
            }
        }
    }

    Ok(soc)
}

/// Project a single instance record out of the merged view.
pub fn peripheral_record(
    catalogue: &Catalogue,
    device_id: &str,
    address: &InstanceAddress,
    board_id: Option<&str>,
) -> Result<PropertyRecord, Error> {
    let mut view = merged_peripherals(catalogue, device_id, board_id)?;
    let not_found = || Error::PeripheralNotFound {
        name: address.name.clone(),
        instance: address.instance,
    };
    let records = view.get_mut(&address.name).ok_or_else(not_found)?;
    let index = address.record_index();
    if index >= records.len() {
        return Err(not_found());
    }
    Ok(records.swap_remove(index))
}

/// Shallow field-union of the base device's record with its dependency
/// device's record; the dependency's fields win on collision. A device with
/// no dependency, or a dependency id missing from the device document, is
/// merged as the base alone.
fn union_with_dependency(catalogue: &Catalogue, device_id: &str) -> Result<DeviceTree, Error> {
    let base = catalogue.device(device_id)?;
    let Some(dep_id) = catalogue.dependency_of(device_id)? else {
        return Ok(base.devicetree.clone());
    };
    match catalogue.device(dep_id) {
        // The devicetree section is one top-level field, so the shallow
        // union takes the dependency's section wholesale.
        Ok(dep) => Ok(dep.devicetree.clone()),
        Err(_) => {
            warn!(device = device_id, dependency = dep_id, "dependency device missing, using base alone");
            Ok(base.devicetree.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::testutil::sample_catalogue;
    use crate::catalogue::{BindingDoc, BoardDoc, DeviceDoc};
    use serde_json::json;

    const DEVICE: &str = "nrf52840_pca10056_board";
    const BOARD: &str = "nrf52840_pca10056";

    #[test]
    fn test_dependency_wins_device_union() {
        // The board-level device and its dependency both declare uart; the
        // dependency's records are the ones the view carries.
        let catalogue = sample_catalogue();
        let view = merged_peripherals(&catalogue, DEVICE, None).unwrap();
        assert_eq!(view["uart"][0]["current-speed"], json!(["115200"]));
        // The dependency's soc replaces the base's, so base-only entries go.
        assert!(view.contains_key("gpio"));
        assert!(!view.contains_key("spi"));
    }

    #[test]
    fn test_board_override_wins_and_preserves_siblings() {
        let catalogue = sample_catalogue();
        let view = merged_peripherals(&catalogue, DEVICE, Some(BOARD)).unwrap();
        let uart0 = &view["uart"][0];
        assert_eq!(uart0["current-speed"], json!("230400"));
        // Sibling properties of the same instance survive the override.
        assert_eq!(uart0["status"], json!(["ok"]));
        assert_eq!(uart0["compatible"], json!(["nordic,nrf-uarte"]));
        // Other instances untouched.
        assert_eq!(view["uart"][1]["current-speed"], json!(["9600"]));
    }

    #[test]
    fn test_override_for_unknown_peripheral_skipped() {
        // "&spi" targets a peripheral the dependency union dropped; no entry
        // may be created for it.
        let catalogue = sample_catalogue();
        let view = merged_peripherals(&catalogue, DEVICE, Some(BOARD)).unwrap();
        assert!(!view.contains_key("spi"));
    }

    #[test]
    fn test_sentinel_instance_targets_index_zero() {
        let devices: DeviceDoc = serde_json::from_value(json!({
            "soc": { "devicetree": { "dependency": [], "soc": {
                "uart": [ { "baud": ["9600"] }, { "baud": ["9600"] } ]
            } } }
        }))
        .unwrap();
        let boards: BoardDoc = serde_json::from_value(json!({
            "kit": {
                "devicetree": { "dependency": ["soc"] },
                "&uart": { "baud": "115200" }
            }
        }))
        .unwrap();
        let mut catalogue = Catalogue::new();
        catalogue.insert_devices(devices);
        catalogue.insert_boards(boards);
        catalogue.insert_bindings(BindingDoc::new());

        let view = merged_peripherals(&catalogue, "soc", Some("kit")).unwrap();
        assert_eq!(view["uart"][0]["baud"], json!("115200"));
        assert_eq!(view["uart"][1]["baud"], json!(["9600"]));
    }

    #[test]
    fn test_out_of_range_instance_skipped() {
        let devices: DeviceDoc = serde_json::from_value(json!({
            "soc": { "devicetree": { "dependency": [], "soc": {
                "uart": [ { "baud": ["9600"] } ]
            } } }
        }))
        .unwrap();
        let boards: BoardDoc = serde_json::from_value(json!({
            "kit": {
                "devicetree": { "dependency": ["soc"] },
                "&uart5": { "baud": "115200" }
            }
        }))
        .unwrap();
        let mut catalogue = Catalogue::new();
        catalogue.insert_devices(devices);
        catalogue.insert_boards(boards);
        catalogue.insert_bindings(BindingDoc::new());

        let view = merged_peripherals(&catalogue, "soc", Some("kit")).unwrap();
        assert_eq!(view["uart"].len(), 1);
        assert_eq!(view["uart"][0]["baud"], json!(["9600"]));
    }

    #[test]
    fn test_missing_dependency_device_uses_base() {
        let devices: DeviceDoc = serde_json::from_value(json!({
            "lonely": { "devicetree": { "dependency": ["ghost"], "soc": {
                "uart": [ { "baud": ["9600"] } ]
            } } }
        }))
        .unwrap();
        let mut catalogue = Catalogue::new();
        catalogue.insert_devices(devices);
        let view = merged_peripherals(&catalogue, "lonely", None).unwrap();
        assert_eq!(view["uart"][0]["baud"], json!(["9600"]));
    }

    #[test]
    fn test_idempotent_and_fresh_per_call() {
        let catalogue = sample_catalogue();
        let first = merged_peripherals(&catalogue, DEVICE, Some(BOARD)).unwrap();
        let mut second = merged_peripherals(&catalogue, DEVICE, Some(BOARD)).unwrap();
        assert_eq!(first, second);

        // Mutating one view must not leak into the catalogue or later views.
        second.get_mut("uart").unwrap()[0].insert("baud".into(), json!("1"));
        let third = merged_peripherals(&catalogue, DEVICE, Some(BOARD)).unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn test_peripheral_record_projection() {
        let catalogue = sample_catalogue();
        let record =
            peripheral_record(&catalogue, DEVICE, &address::parse("uart:1"), None).unwrap();
        assert_eq!(record["current-speed"], json!(["9600"]));

        assert!(matches!(
            peripheral_record(&catalogue, DEVICE, &address::parse("uart:7"), None),
            Err(Error::PeripheralNotFound { .. })
        ));
        assert!(matches!(
            peripheral_record(&catalogue, DEVICE, &address::parse("nope"), None),
            Err(Error::PeripheralNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_device_is_fatal() {
        let catalogue = sample_catalogue();
        assert!(matches!(
            merged_peripherals(&catalogue, "nope", None),
            Err(Error::DeviceNotFound(_))
        ));
    }
}
