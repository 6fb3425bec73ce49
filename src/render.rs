//! Overlay text generation
//!
//! Deterministic rendering of the edit state into the overlay format a user
//! copies out of the tool. Output is consumed by downstream devicetree
//! tooling, so the punctuation is bit-exact: angle brackets for numeric and
//! array values, double quotes for everything else, one stanza per
//! peripheral in edit insertion order.

use std::fmt::Write;

use crate::edit::{EditState, EditValue};

/// Render the accumulated edits as overlay text.
///
/// A peripheral with no stored properties emits nothing. Each stanza is
/// `&<label> {\n` followed by one `\t<prop>=<value>;\n` line per property and
/// a closing `};\n\n`.
pub fn render(edits: &EditState) -> String {
    let mut out = String::new();

    for (address, properties) in edits.iter() {
        if properties.is_empty() {
            continue;
        }
        // Infallible writes to a String.
        let _ = write!(out, "&{} {{\n", address.label());
        for (property, value) in properties {
            match value {
                EditValue::Int(n) => {
                    let _ = write!(out, "\t{property}=<{n}>;\n");
                }
                EditValue::Array(items) => {
                    let _ = write!(out, "\t{property}=<{}>;\n", items.join(" "));
                }
                EditValue::String(s) | EditValue::Untyped(s) => {
                    let _ = write!(out, "\t{property}=\"{s}\";\n");
                }
            }
        }
        out.push_str("};\n\n");
    }

    out
}
