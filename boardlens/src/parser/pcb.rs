//! KiCad PCB extractor.
//!
//! Walks the generic S-expression tree of a `.kicad_pcb` document and
//! populates typed records: layers, nets, footprints with pads, trace
//! segments, vias, and copper-pour zones. Unrecognized tags are skipped so
//! newer KiCad constructs never abort extraction. Missing optional numeric
//! sub-fields default to zero; the data is still useful for partial
//! analysis.

use thiserror::Error;

use crate::analyzer::geometry;
use crate::parser::netlist;
use crate::parser::pcb_schema::*;
use crate::parser::sexp::{Sexp, SexpError, SexpParser};

#[derive(Debug, Error)]
pub enum PcbParseError {
    #[error("S-expression parse error: {0}")]
    Sexp(#[from] SexpError),
    #[error("Invalid PCB format: {0}")]
    InvalidFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct PcbParser;

impl PcbParser {
    /// Parse a `.kicad_pcb` document from text. The returned design is
    /// fully connectivity-resolved; callers never see a raw extraction.
    pub fn parse_content(content: &str, filename: &str) -> Result<PcbDesign, PcbParseError> {
        let root = SexpParser::new(content)
            .parse()?
            .ok_or_else(|| PcbParseError::InvalidFormat("empty document".to_string()))?;

        if root.tag() != Some("kicad_pcb") {
            return Err(PcbParseError::InvalidFormat(
                "not a valid PCB document (expected kicad_pcb)".to_string(),
            ));
        }

        let mut design = PcbDesign {
            filename: filename.to_string(),
            ..Default::default()
        };

        for item in root.as_list().unwrap_or(&[]).iter().skip(1) {
            match item.tag() {
                Some("layers") => Self::extract_layers(item, &mut design),
                Some("net") => Self::extract_net(item, &mut design),
                Some("footprint") => Self::extract_footprint(item, &mut design),
                Some("segment") => Self::extract_segment(item, &mut design),
                Some("via") => Self::extract_via(item, &mut design),
                Some("zone") => Self::extract_zone(item, &mut design),
                _ => {}
            }
        }

        netlist::build_connectivity(&mut design);

        Ok(design)
    }

    fn extract_layers(item: &Sexp, design: &mut PcbDesign) {
        for entry in item.as_list().unwrap_or(&[]).iter().skip(1) {
            let Some(fields) = entry.as_list() else { continue };
            if fields.len() < 3 {
                continue;
            }
            let layer = Layer {
                id: fields[0].as_f64().unwrap_or(0.0) as i32,
                name: fields[1].text().unwrap_or_default(),
                layer_type: fields[2].text().unwrap_or_default(),
            };
            if layer.is_copper() {
                design.copper_layers.push(layer.name.clone());
            }
            design.layers.push(layer);
        }
    }

    fn extract_net(item: &Sexp, design: &mut PcbDesign) {
        let Some(fields) = item.as_list() else { return };
        if fields.len() < 3 {
            return;
        }
        if let Some(num) = fields[1].as_u32() {
            design.nets.insert(num, fields[2].text().unwrap_or_default());
        }
    }

    fn extract_footprint(item: &Sexp, design: &mut PcbDesign) {
        let fields = item.as_list().unwrap_or(&[]);

        let mut footprint = Footprint {
            reference: String::new(),
            value: String::new(),
            footprint_type: fields.get(1).and_then(|f| f.text()).unwrap_or_default(),
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            layer: "F.Cu".to_string(),
            pads: Vec::new(),
            properties: Default::default(),
        };

        for sub in fields.iter().skip(2) {
            match sub.tag() {
                Some("at") => {
                    let at = sub.as_list().unwrap_or(&[]);
                    footprint.x = num_at(at, 1);
                    footprint.y = num_at(at, 2);
                    footprint.rotation = num_at(at, 3);
                }
                Some("layer") => {
                    if let Some(name) = sub.as_list().and_then(|l| l.get(1)).and_then(|v| v.text()) {
                        footprint.layer = name;
                    }
                }
                Some("property") => {
                    let prop = sub.as_list().unwrap_or(&[]);
                    if prop.len() >= 3 {
                        let name = prop[1].text().unwrap_or_default();
                        let value = prop[2].text().unwrap_or_default();
                        match name.as_str() {
                            "Reference" => footprint.reference = value.clone(),
                            "Value" => footprint.value = value.clone(),
                            _ => {}
                        }
                        footprint.properties.insert(name, value);
                    }
                }
                Some("pad") => {
                    if let Some(pad) = Self::extract_pad(sub) {
                        footprint.pads.push(pad);
                    }
                }
                _ => {}
            }
        }

        // A footprint with no Reference property is graphical-only.
        if !footprint.reference.is_empty() {
            design.footprints.push(footprint);
        }
    }

    fn extract_pad(item: &Sexp) -> Option<Pad> {
        let fields = item.as_list()?;
        if fields.len() < 4 {
            return None;
        }

        let mut pad = Pad {
            number: fields[1].text().unwrap_or_default(),
            pad_type: fields[2].text().unwrap_or_default(),
            shape: fields[3].text().unwrap_or_default(),
            x: 0.0,
            y: 0.0,
            size: None,
            drill: None,
            layers: None,
            net: None,
            net_name: String::new(),
        };

        for sub in fields.iter().skip(4) {
            match sub.tag() {
                Some("at") => {
                    let at = sub.as_list().unwrap_or(&[]);
                    pad.x = num_at(at, 1);
                    pad.y = num_at(at, 2);
                }
                Some("size") => {
                    let size = sub.as_list().unwrap_or(&[]);
                    pad.size = Some(PadSize {
                        width: num_at(size, 1),
                        height: num_at(size, 2),
                    });
                }
                Some("drill") => {
                    let drill = sub.as_list().unwrap_or(&[]);
                    pad.drill = Some(num_at(drill, 1));
                }
                Some("layers") => {
                    let names = sub
                        .as_list()
                        .unwrap_or(&[])
                        .iter()
                        .skip(1)
                        .filter_map(|l| l.text())
                        .collect();
                    pad.layers = Some(names);
                }
                Some("net") => {
                    let net = sub.as_list().unwrap_or(&[]);
                    pad.net = net.get(1).and_then(|n| n.as_u32()).filter(|n| *n > 0);
                    pad.net_name = net.get(2).and_then(|n| n.text()).unwrap_or_default();
                }
                _ => {}
            }
        }

        Some(pad)
    }

    fn extract_segment(item: &Sexp, design: &mut PcbDesign) {
        let mut trace = Trace {
            start_x: 0.0,
            start_y: 0.0,
            end_x: 0.0,
            end_y: 0.0,
            width: 0.0,
            layer: String::new(),
            net: 0,
            length: 0.0,
        };

        for sub in item.as_list().unwrap_or(&[]).iter().skip(1) {
            let fields = sub.as_list().unwrap_or(&[]);
            match sub.tag() {
                Some("start") => {
                    trace.start_x = num_at(fields, 1);
                    trace.start_y = num_at(fields, 2);
                }
                Some("end") => {
                    trace.end_x = num_at(fields, 1);
                    trace.end_y = num_at(fields, 2);
                }
                Some("width") => trace.width = num_at(fields, 1),
                Some("layer") => {
                    trace.layer = fields.get(1).and_then(|v| v.text()).unwrap_or_default()
                }
                Some("net") => trace.net = fields.get(1).and_then(|v| v.as_u32()).unwrap_or(0),
                _ => {}
            }
        }

        let dx = trace.end_x - trace.start_x;
        let dy = trace.end_y - trace.start_y;
        trace.length = (dx * dx + dy * dy).sqrt();

        design.traces.push(trace);
    }

    fn extract_via(item: &Sexp, design: &mut PcbDesign) {
        let mut via = Via {
            x: 0.0,
            y: 0.0,
            size: 0.0,
            drill: 0.0,
            layers: Vec::new(),
            net: 0,
        };

        for sub in item.as_list().unwrap_or(&[]).iter().skip(1) {
            let fields = sub.as_list().unwrap_or(&[]);
            match sub.tag() {
                Some("at") => {
                    via.x = num_at(fields, 1);
                    via.y = num_at(fields, 2);
                }
                Some("size") => via.size = num_at(fields, 1),
                Some("drill") => via.drill = num_at(fields, 1),
                Some("layers") => {
                    via.layers = fields.iter().skip(1).filter_map(|l| l.text()).collect();
                }
                Some("net") => via.net = fields.get(1).and_then(|v| v.as_u32()).unwrap_or(0),
                _ => {}
            }
        }

        design.vias.push(via);
    }

    fn extract_zone(item: &Sexp, design: &mut PcbDesign) {
        let mut zone = Zone {
            net: 0,
            net_name: String::new(),
            layer: String::new(),
            priority: 0,
            polygon: None,
            bounding_box: None,
            area: None,
        };

        for sub in item.as_list().unwrap_or(&[]).iter().skip(1) {
            let fields = sub.as_list().unwrap_or(&[]);
            match sub.tag() {
                Some("net") => zone.net = fields.get(1).and_then(|v| v.as_u32()).unwrap_or(0),
                Some("net_name") => {
                    zone.net_name = fields.get(1).and_then(|v| v.text()).unwrap_or_default()
                }
                Some("layer") => {
                    zone.layer = fields.get(1).and_then(|v| v.text()).unwrap_or_default()
                }
                Some("priority") => {
                    zone.priority = fields.get(1).and_then(|v| v.as_u32()).unwrap_or(0)
                }
                Some("polygon") => {
                    let points = Self::extract_polygon_points(sub);
                    if !points.is_empty() {
                        zone.bounding_box = geometry::bounding_box(&points);
                        zone.area = Some(geometry::polygon_area(&points));
                        zone.polygon = Some(points);
                    }
                }
                _ => {}
            }
        }

        design.zones.push(zone);
    }

    /// `(polygon (pts (xy x y) (xy x y) ...))`
    fn extract_polygon_points(polygon: &Sexp) -> Vec<Point> {
        let mut points = Vec::new();
        if let Some(pts) = polygon.child("pts") {
            for xy in pts.children("xy") {
                let fields = xy.as_list().unwrap_or(&[]);
                if fields.len() >= 3 {
                    points.push(Point::new(num_at(fields, 1), num_at(fields, 2)));
                }
            }
        }
        points
    }
}

/// Numeric field at a positional index; zero when missing or non-numeric.
/// This deliberately conflates "absent" with "literally zero" - the format
/// omits defaulted fields and partial data is still worth analyzing.
fn num_at(fields: &[Sexp], idx: usize) -> f64 {
    fields.get(idx).and_then(|v| v.as_f64()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI_PCB: &str = r#"
(kicad_pcb (version 20240108) (generator "pcbnew")
  (layers
    (0 "F.Cu" signal)
    (31 "B.Cu" signal)
    (36 "B.SilkS" user "B.Silkscreen")
  )
  (net 0 "")
  (net 1 "GND")
  (net 2 "+3V3")
  (footprint "Resistor_SMD:R_0402"
    (layer "F.Cu")
    (at 10 20 90)
    (property "Reference" "R1")
    (property "Value" "10k")
    (pad "1" smd roundrect (at -0.5 0) (size 0.6 0.5) (layers "F.Cu") (net 1 "GND"))
    (pad "2" smd roundrect (at 0.5 0) (size 0.6 0.5) (layers "F.Cu") (net 2 "+3V3"))
  )
  (footprint "Graphics:Logo"
    (layer "F.SilkS")
    (at 50 50)
  )
  (segment (start 0 0) (end 3 4) (width 0.25) (layer "F.Cu") (net 1))
  (via (at 12 20) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
  (zone (net 1) (net_name "GND") (layer "B.Cu") (priority 1)
    (polygon (pts (xy 0 0) (xy 10 0) (xy 10 10) (xy 0 10)))
  )
)
"#;

    #[test]
    fn test_rejects_non_pcb_document() {
        let err = PcbParser::parse_content("(kicad_sch (version 1))", "x.kicad_pcb");
        assert!(matches!(err, Err(PcbParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_rejects_empty_document() {
        let err = PcbParser::parse_content("", "x.kicad_pcb");
        assert!(matches!(err, Err(PcbParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_structural_error_propagates() {
        let err = PcbParser::parse_content("(kicad_pcb (net 1 \"GND\"", "x.kicad_pcb");
        assert!(matches!(err, Err(PcbParseError::Sexp(_))));
    }

    #[test]
    fn test_extracts_layers_and_nets() {
        let pcb = PcbParser::parse_content(MINI_PCB, "mini.kicad_pcb").unwrap();
        assert_eq!(pcb.layers.len(), 3);
        assert_eq!(pcb.copper_layers, vec!["F.Cu", "B.Cu"]);
        assert_eq!(pcb.nets.get(&1).map(String::as_str), Some("GND"));
        assert_eq!(pcb.nets.get(&2).map(String::as_str), Some("+3V3"));
    }

    #[test]
    fn test_footprint_without_reference_dropped() {
        let pcb = PcbParser::parse_content(MINI_PCB, "mini.kicad_pcb").unwrap();
        assert_eq!(pcb.footprints.len(), 1);
        assert_eq!(pcb.footprints[0].reference, "R1");
        assert_eq!(pcb.footprints[0].rotation, 90.0);
        assert_eq!(pcb.footprints[0].pads.len(), 2);
    }

    #[test]
    fn test_trace_length_computed() {
        let pcb = PcbParser::parse_content(MINI_PCB, "mini.kicad_pcb").unwrap();
        assert_eq!(pcb.traces.len(), 1);
        assert!((pcb.traces[0].length - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zone_geometry_cached() {
        let pcb = PcbParser::parse_content(MINI_PCB, "mini.kicad_pcb").unwrap();
        let zone = &pcb.zones[0];
        assert_eq!(zone.polygon.as_ref().map(Vec::len), Some(4));
        assert_eq!(zone.area, Some(100.0));
        let bb = zone.bounding_box.unwrap();
        assert_eq!((bb.min_x, bb.max_x, bb.min_y, bb.max_y), (0.0, 10.0, 0.0, 10.0));
    }

    #[test]
    fn test_connectivity_built_in_same_call() {
        let pcb = PcbParser::parse_content(MINI_PCB, "mini.kicad_pcb").unwrap();
        let gnd = pcb.connectivity.get(&1).unwrap();
        assert!(gnd.components.contains("R1"));
        assert_eq!(gnd.traces.len(), 1);
        assert_eq!(gnd.vias.len(), 1);
        assert!(pcb.component_nets.get("R1").unwrap().contains(&2));
    }

    #[test]
    fn test_missing_segment_fields_default_to_zero() {
        let pcb = PcbParser::parse_content(
            "(kicad_pcb (net 1 \"A\") (segment (start 1 1) (end 2 1) (net 1)))",
            "x.kicad_pcb",
        )
        .unwrap();
        assert_eq!(pcb.traces[0].width, 0.0);
        assert_eq!(pcb.traces[0].layer, "");
        assert!((pcb.traces[0].length - 1.0).abs() < 1e-9);
    }
}
