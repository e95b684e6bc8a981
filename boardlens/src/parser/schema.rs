//! Typed records extracted from KiCad schematic sheets.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchematicComponent {
    pub reference: String,
    pub value: String,
    /// Footprint assignment, `library:footprint`.
    pub footprint: String,
    pub lib_id: String,
    pub x: f64,
    pub y: f64,
    /// Unit index for multi-unit parts.
    pub unit: u32,
    /// Sheet this instance was placed on.
    pub sheet: String,
    pub properties: BTreeMap<String, String>,
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKind {
    Local,
    Global,
    Hierarchical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchematicLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: LabelKind,
    pub sheet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchematicWire {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub sheet: String,
}

/// A power-rail symbol (GND, +3V3, ...); its Value property names the net.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerSymbol {
    pub net_name: String,
    pub x: f64,
    pub y: f64,
    pub sheet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetInstance {
    pub file: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetConnection {
    pub sheet: String,
    pub x: f64,
    pub y: f64,
}

/// A cross-sheet net derived from global labels and power symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchematicNet {
    pub name: String,
    pub is_global: bool,
    pub is_power: bool,
    pub connections: Vec<NetConnection>,
}

/// Accumulated result of parsing one or more schematic sheets.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schematic {
    pub project_path: String,
    pub sheets: Vec<String>,
    /// Keyed by reference designator.
    pub components: BTreeMap<String, SchematicComponent>,
    pub labels: Vec<SchematicLabel>,
    pub wires: Vec<SchematicWire>,
    pub power_symbols: Vec<PowerSymbol>,
    /// Keyed by label text / power net name.
    pub global_nets: BTreeMap<String, SchematicNet>,
    pub sheet_instances: Vec<SheetInstance>,
    /// Non-fatal problems encountered per sheet (bad format, etc).
    pub warnings: Vec<String>,
}
