//! Typed records extracted from a KiCad PCB document.
//!
//! All coordinates are millimeters. Net numbers key the PCB-wide net
//! table; net 0 is the reserved unconnected net and is excluded from
//! connectivity-based analysis.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Distance from a point to the nearest point on this box.
    /// Zero when the point lies inside.
    pub fn distance_to(&self, p: &Point) -> f64 {
        let nearest_x = p.x.clamp(self.min_x, self.max_x);
        let nearest_y = p.y.clamp(self.min_y, self.max_y);
        p.distance_to(&Point::new(nearest_x, nearest_y))
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub layer_type: String,
}

impl Layer {
    /// Copper layers carry a conductive type or the canonical `Cu` marker
    /// in their name (`F.Cu`, `In1.Cu`, `B.Cu`).
    pub fn is_copper(&self) -> bool {
        matches!(self.layer_type.as_str(), "signal" | "power" | "mixed")
            || self.name.contains("Cu")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PadSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pad {
    /// Pad number or name; unique within its footprint only.
    pub number: String,
    /// `smd`, `thru_hole`, or `np_thru_hole`.
    #[serde(rename = "type")]
    pub pad_type: String,
    pub shape: String,
    /// Offset from the footprint origin, before rotation.
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<PadSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,
    pub net: Option<u32>,
    pub net_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Footprint {
    /// Designator, e.g. `U1`. Required; footprints without one are
    /// graphical-only and dropped at extraction.
    pub reference: String,
    pub value: String,
    /// `library:footprint` identifier.
    pub footprint_type: String,
    pub x: f64,
    pub y: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
    pub layer: String,
    pub pads: Vec<Pad>,
    pub properties: BTreeMap<String, String>,
}

impl Footprint {
    /// Absolute board position of one of this footprint's pads: the local
    /// offset rotated by the footprint rotation, then translated. Shared by
    /// via-in-pad detection and any other geometry consumer so the two can
    /// never drift apart.
    pub fn pad_position(&self, pad: &Pad) -> Point {
        let rad = self.rotation.to_radians();
        let (sin_r, cos_r) = rad.sin_cos();
        Point::new(
            self.x + (pad.x * cos_r - pad.y * sin_r),
            self.y + (pad.x * sin_r + pad.y * cos_r),
        )
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub width: f64,
    pub layer: String,
    pub net: u32,
    /// Euclidean distance start to end, computed at extraction.
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Via {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub drill: f64,
    pub layers: Vec<String>,
    pub net: u32,
}

impl Via {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub net: u32,
    pub net_name: String,
    pub layer: String,
    pub priority: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    /// mm², shoelace area of the outline polygon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

/// One pad's membership in a net.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PadRef {
    pub component: String,
    pub pad: String,
    pub net_name: String,
}

/// Everything that belongs to one net: the index the analyzers query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetConnectivity {
    pub components: BTreeSet<String>,
    pub pads: Vec<PadRef>,
    pub traces: Vec<Trace>,
    pub vias: Vec<Via>,
}

/// Fully extracted and connectivity-resolved PCB document.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PcbDesign {
    pub filename: String,
    pub layers: Vec<Layer>,
    pub copper_layers: Vec<String>,
    pub nets: BTreeMap<u32, String>,
    pub footprints: Vec<Footprint>,
    pub traces: Vec<Trace>,
    pub vias: Vec<Via>,
    pub zones: Vec<Zone>,
    /// Net number -> everything on that net. Built by `netlist`.
    #[serde(skip)]
    pub connectivity: BTreeMap<u32, NetConnectivity>,
    /// Reverse index: component reference -> net numbers its pads touch.
    #[serde(skip)]
    pub component_nets: BTreeMap<String, BTreeSet<u32>>,
}

impl PcbDesign {
    /// Net name for a number, with the original tool's `net_<n>` fallback
    /// for numbers missing from the table.
    pub fn net_name(&self, net: u32) -> String {
        match self.nets.get(&net) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("net_{}", net),
        }
    }

    pub fn footprint(&self, reference: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.reference == reference)
    }

    pub fn net_number(&self, name: &str) -> Option<u32> {
        self.nets
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(num, _)| *num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_position_unrotated() {
        let fp = Footprint {
            reference: "U1".into(),
            value: "".into(),
            footprint_type: "".into(),
            x: 10.0,
            y: 20.0,
            rotation: 0.0,
            layer: "F.Cu".into(),
            pads: vec![],
            properties: BTreeMap::new(),
        };
        let pad = Pad {
            number: "1".into(),
            pad_type: "smd".into(),
            shape: "rect".into(),
            x: 1.0,
            y: 2.0,
            size: None,
            drill: None,
            layers: None,
            net: None,
            net_name: String::new(),
        };
        let p = fp.pad_position(&pad);
        assert!((p.x - 11.0).abs() < 1e-9);
        assert!((p.y - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_pad_position_rotated_90() {
        let fp = Footprint {
            reference: "U1".into(),
            value: "".into(),
            footprint_type: "".into(),
            x: 0.0,
            y: 0.0,
            rotation: 90.0,
            layer: "F.Cu".into(),
            pads: vec![],
            properties: BTreeMap::new(),
        };
        let pad = Pad {
            number: "1".into(),
            pad_type: "smd".into(),
            shape: "rect".into(),
            x: 1.0,
            y: 0.0,
            size: None,
            drill: None,
            layers: None,
            net: None,
            net_name: String::new(),
        };
        let p = fp.pad_position(&pad);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_copper_layer_detection() {
        let signal = Layer { id: 0, name: "F.Cu".into(), layer_type: "signal".into() };
        let power = Layer { id: 2, name: "In1.Cu".into(), layer_type: "power".into() };
        let silk = Layer { id: 37, name: "F.SilkS".into(), layer_type: "user".into() };
        assert!(signal.is_copper());
        assert!(power.is_copper());
        assert!(!silk.is_copper());
    }

    #[test]
    fn test_bounding_box_distance() {
        let bb = BoundingBox { min_x: 0.0, max_x: 10.0, min_y: 0.0, max_y: 10.0 };
        assert_eq!(bb.distance_to(&Point::new(5.0, 5.0)), 0.0);
        assert!((bb.distance_to(&Point::new(13.0, 14.0)) - 5.0).abs() < 1e-9);
    }
}
