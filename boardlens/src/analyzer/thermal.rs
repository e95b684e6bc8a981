//! Thermal and manufacturability geometry checks: via-in-pad detection,
//! thermal-via proximity search, and copper-pour coverage.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzer::geometry::{point_in_polygon, round_to};
use crate::parser::pcb_schema::{Footprint, PcbDesign, Point};

/// A via whose center lands inside a same-net SMD pad.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViaInPad {
    pub component: String,
    pub pad: String,
    pub pad_type: String,
    pub pad_net: String,
    pub via_position: Point,
    pub via_drill: f64,
    pub via_net: String,
    pub concern: &'static str,
}

/// Vias near a point, for thermal-relief review around hot parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalViaReport {
    pub count: usize,
    pub search_radius: f64,
    /// Net name -> number of nearby vias on it.
    pub by_net: BTreeMap<String, usize>,
    pub vias: Vec<NearbyVia>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyVia {
    /// mm from the search center, rounded to 3 decimals.
    pub distance: f64,
    pub drill: f64,
    pub net: String,
}

/// Copper zones that contain or sit near a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopperPourReport {
    pub zones_containing_component: Vec<ContainingZone>,
    pub zones_within_radius: Vec<NearbyZone>,
    /// mm², sum over containing zones, rounded to 2 decimals.
    pub total_connected_area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainingZone {
    pub net: String,
    pub layer: String,
    pub area: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyZone {
    pub net: String,
    pub layer: String,
    pub distance: f64,
    pub area: f64,
}

const VIA_IN_PAD_CONCERN: &str =
    "Via in SMD pad may wick solder - consider filled/capped vias";

/// Find vias whose center falls inside an SMD pad on the same net.
///
/// Through-hole pads are skipped: a barrel under them is by construction,
/// not a manufacturing concern. Vias on a different net than the pad are
/// a clearance problem for DRC, not via-in-pad, so they are skipped too.
pub fn detect_via_in_pad(design: &PcbDesign) -> Vec<ViaInPad> {
    struct SmdPad {
        component: String,
        number: String,
        center: Point,
        half_w: f64,
        half_h: f64,
        net: u32,
        net_name: String,
    }

    let mut smd_pads = Vec::new();
    for fp in &design.footprints {
        for pad in &fp.pads {
            if pad.pad_type != "smd" {
                continue;
            }
            let Some(net) = pad.net else { continue };
            let size = pad.size.unwrap_or_default();
            smd_pads.push(SmdPad {
                component: fp.reference.clone(),
                number: pad.number.clone(),
                center: fp.pad_position(pad),
                half_w: size.width / 2.0,
                half_h: size.height / 2.0,
                net,
                net_name: pad.net_name.clone(),
            });
        }
    }

    let mut found = Vec::new();
    for via in &design.vias {
        for pad in &smd_pads {
            if via.net != pad.net {
                continue;
            }
            let inside = via.x >= pad.center.x - pad.half_w
                && via.x <= pad.center.x + pad.half_w
                && via.y >= pad.center.y - pad.half_h
                && via.y <= pad.center.y + pad.half_h;
            if !inside {
                continue;
            }

            let pad_net = if pad.net_name.is_empty() {
                design.net_name(pad.net)
            } else {
                pad.net_name.clone()
            };
            found.push(ViaInPad {
                component: pad.component.clone(),
                pad: pad.number.clone(),
                pad_type: "smd".into(),
                pad_net,
                via_position: via.position(),
                via_drill: via.drill,
                via_net: design.net_name(via.net),
                concern: VIA_IN_PAD_CONCERN,
            });
        }
    }

    found
}

/// All vias within `radius` mm of a point, nearest first.
pub fn thermal_vias_near(design: &PcbDesign, center: Point, radius: f64) -> ThermalViaReport {
    let mut vias = Vec::new();
    let mut by_net: BTreeMap<String, usize> = BTreeMap::new();

    for via in &design.vias {
        let distance = center.distance_to(&via.position());
        if distance <= radius {
            let net = design.net_name(via.net);
            *by_net.entry(net.clone()).or_insert(0) += 1;
            vias.push(NearbyVia {
                distance: round_to(distance, 3),
                drill: via.drill,
                net,
            });
        }
    }

    vias.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    ThermalViaReport {
        count: vias.len(),
        search_radius: radius,
        by_net,
        vias,
    }
}

/// Radius search centered on a component's footprint origin. An unknown
/// reference yields an empty report rather than an error.
pub fn thermal_vias_for(design: &PcbDesign, reference: &str, radius: f64) -> ThermalViaReport {
    match design.footprint(reference) {
        Some(fp) => thermal_vias_near(design, fp.position(), radius),
        None => ThermalViaReport {
            search_radius: radius,
            ..Default::default()
        },
    }
}

/// Copper-pour coverage for one footprint: zones whose outline contains
/// the footprint origin, and zones whose bounding box comes within
/// `radius` mm without containing it.
pub fn copper_pour_for(design: &PcbDesign, fp: &Footprint, radius: f64) -> CopperPourReport {
    let position = fp.position();
    let mut report = CopperPourReport::default();
    let mut connected_area = 0.0;

    for zone in &design.zones {
        let (Some(bb), Some(polygon)) = (&zone.bounding_box, &zone.polygon) else {
            continue;
        };
        if polygon.len() < 3 {
            continue;
        }

        let area = zone.area.unwrap_or(0.0);

        if bb.contains(&position) && point_in_polygon(position.x, position.y, polygon) {
            report.zones_containing_component.push(ContainingZone {
                net: zone.net_name.clone(),
                layer: zone.layer.clone(),
                area: round_to(area, 2),
            });
            connected_area += area;
        }

        let distance = bb.distance_to(&position);
        if distance > 0.0 && distance <= radius {
            report.zones_within_radius.push(NearbyZone {
                net: zone.net_name.clone(),
                layer: zone.layer.clone(),
                distance: round_to(distance, 3),
                area: round_to(area, 2),
            });
        }
    }

    report.total_connected_area = round_to(connected_area, 2);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pcb::PcbParser;

    const VIA_IN_PAD_PCB: &str = r#"
(kicad_pcb
  (net 0 "")
  (net 1 "GND")
  (net 2 "+3V3")
  (footprint "L:QFN" (at 10 10)
    (property "Reference" "U1")
    (pad "EP" smd rect (at 0 0) (size 3 3) (net 1 "GND"))
    (pad "1" smd rect (at -2 0) (size 0.5 0.5) (net 2 "+3V3"))
  )
  (via (at 10 10) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
  (via (at 10.5 10.5) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
  (via (at 10 10.2) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 2))
  (via (at 30 30) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
)
"#;

    #[test]
    fn test_same_net_vias_inside_pad_flagged() {
        let pcb = PcbParser::parse_content(VIA_IN_PAD_PCB, "t.kicad_pcb").unwrap();
        let hits = detect_via_in_pad(&pcb);

        // Two GND vias sit inside the 3x3 EP pad. The +3V3 via is inside
        // the EP outline but on a different net, and outside the small
        // pad 1, so it is not flagged. The far via is out of reach.
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.component == "U1" && h.pad == "EP"));
        assert!(hits.iter().all(|h| h.via_net == "GND" && h.pad_net == "GND"));
        assert_eq!(hits[0].concern, VIA_IN_PAD_CONCERN);
    }

    #[test]
    fn test_through_hole_pads_ignored() {
        let content = r#"
(kicad_pcb
  (net 1 "GND")
  (footprint "L:TH" (at 0 0)
    (property "Reference" "J1")
    (pad "1" thru_hole circle (at 0 0) (size 2 2) (drill 1) (net 1 "GND"))
  )
  (via (at 0 0) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
)
"#;
        let pcb = PcbParser::parse_content(content, "t.kicad_pcb").unwrap();
        assert!(detect_via_in_pad(&pcb).is_empty());
    }

    #[test]
    fn test_pad_rotation_respected() {
        // Pad offset (3, 0) on a footprint rotated 90 degrees lands at
        // (10, 13); a via there is inside, a via at (13, 10) is not.
        let content = r#"
(kicad_pcb
  (net 1 "GND")
  (footprint "L:R" (at 10 10 90)
    (property "Reference" "U2")
    (pad "1" smd rect (at 3 0) (size 1 1) (net 1 "GND"))
  )
  (via (at 10 13) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
  (via (at 13 10) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
)
"#;
        let pcb = PcbParser::parse_content(content, "t.kicad_pcb").unwrap();
        let hits = detect_via_in_pad(&pcb);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].via_position, Point::new(10.0, 13.0));
    }

    #[test]
    fn test_thermal_vias_sorted_and_counted() {
        let pcb = PcbParser::parse_content(VIA_IN_PAD_PCB, "t.kicad_pcb").unwrap();
        let report = thermal_vias_near(&pcb, Point::new(10.0, 10.0), 5.0);

        assert_eq!(report.count, 3);
        assert_eq!(report.search_radius, 5.0);
        assert_eq!(report.vias[0].distance, 0.0);
        assert!(report.vias.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(report.by_net.get("GND"), Some(&2));
        assert_eq!(report.by_net.get("+3V3"), Some(&1));
    }

    #[test]
    fn test_copper_pour_containment_and_proximity() {
        let content = r#"
(kicad_pcb
  (net 1 "GND")
  (footprint "L:REG" (at 5 5)
    (property "Reference" "U1")
  )
  (zone (net 1) (net_name "GND") (layer "B.Cu")
    (polygon (pts (xy 0 0) (xy 10 0) (xy 10 10) (xy 0 10)))
  )
  (zone (net 1) (net_name "GND") (layer "F.Cu")
    (polygon (pts (xy 12 0) (xy 20 0) (xy 20 10) (xy 12 10)))
  )
)
"#;
        let pcb = PcbParser::parse_content(content, "t.kicad_pcb").unwrap();
        let fp = pcb.footprint("U1").unwrap();
        let report = copper_pour_for(&pcb, fp, 10.0);

        assert_eq!(report.zones_containing_component.len(), 1);
        assert_eq!(report.zones_containing_component[0].layer, "B.Cu");
        assert_eq!(report.zones_containing_component[0].area, 100.0);
        assert_eq!(report.total_connected_area, 100.0);

        assert_eq!(report.zones_within_radius.len(), 1);
        assert_eq!(report.zones_within_radius[0].layer, "F.Cu");
        assert_eq!(report.zones_within_radius[0].distance, 7.0);
    }
}
