//! Differential-pair detection from net-name suffix conventions.
//!
//! Nets named `X+`/`X-` or `XP`/`XN` are paired, their routed copper
//! lengths summed per side, and the skew reported so length-matching
//! problems show up without a routing tool.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::analyzer::geometry::round_to;
use crate::parser::pcb_schema::PcbDesign;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferentialPair {
    /// Shared prefix, e.g. `USB_D` for `USB_D+`/`USB_D-`.
    pub base_name: String,
    pub positive_net: String,
    pub negative_net: String,
    /// Summed trace length per side, mm, 3 decimals.
    pub pos_length: f64,
    pub neg_length: f64,
    pub length_mismatch: f64,
    /// Union of components touching either side.
    pub components: Vec<String>,
}

/// The complementary net name for a candidate pair member, if the name
/// follows one of the suffix conventions.
fn partner_name(net_name: &str) -> Option<(String, String)> {
    let base = net_name.get(..net_name.len().checked_sub(1)?)?;
    if base.is_empty() {
        return None;
    }
    let partner = match net_name.chars().last()? {
        '+' => format!("{}-", base),
        '-' => format!("{}+", base),
        'P' => format!("{}N", base),
        'N' => format!("{}P", base),
        _ => return None,
    };
    Some((base.to_string(), partner))
}

fn is_positive(net_name: &str) -> bool {
    net_name.ends_with('+') || net_name.ends_with('P')
}

/// Scan the net table for suffix-matched pairs. Each net joins at most
/// one pair; scanning order is ascending net number, so the lower-numbered
/// member claims the pair.
pub fn detect_differential_pairs(design: &PcbDesign) -> Vec<DifferentialPair> {
    let mut pairs = Vec::new();
    let mut processed: BTreeSet<String> = BTreeSet::new();

    for (&net_num, net_name) in &design.nets {
        if processed.contains(net_name) {
            continue;
        }
        let Some((base_name, partner)) = partner_name(net_name) else {
            continue;
        };
        let Some(partner_num) = design.net_number(&partner) else {
            continue;
        };

        processed.insert(net_name.clone());
        processed.insert(partner.clone());

        let trace_length = |num: u32| -> f64 {
            design
                .connectivity
                .get(&num)
                .map(|c| c.traces.iter().map(|t| t.length).sum())
                .unwrap_or(0.0)
        };
        let this_len = trace_length(net_num);
        let partner_len = trace_length(partner_num);

        let mut components: BTreeSet<String> = BTreeSet::new();
        for num in [net_num, partner_num] {
            if let Some(conn) = design.connectivity.get(&num) {
                components.extend(conn.components.iter().cloned());
            }
        }

        let (positive_net, negative_net, pos_length, neg_length) = if is_positive(net_name) {
            (net_name.clone(), partner, this_len, partner_len)
        } else {
            (partner, net_name.clone(), partner_len, this_len)
        };

        pairs.push(DifferentialPair {
            base_name,
            positive_net,
            negative_net,
            pos_length: round_to(pos_length, 3),
            neg_length: round_to(neg_length, 3),
            length_mismatch: round_to((pos_length - neg_length).abs(), 3),
            components: components.into_iter().collect(),
        });
    }

    pairs.sort_by(|a, b| a.base_name.cmp(&b.base_name));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::pcb::PcbParser;

    const DIFF_PCB: &str = r#"
(kicad_pcb
  (net 0 "")
  (net 1 "USB_D+")
  (net 2 "USB_D-")
  (net 3 "CLK_P")
  (net 4 "CLK_N")
  (net 5 "GND")
  (footprint "L:USB" (at 0 0)
    (property "Reference" "J1")
    (pad "2" smd rect (at 0 0) (net 1 "USB_D+"))
    (pad "3" smd rect (at 1 0) (net 2 "USB_D-"))
  )
  (footprint "L:MCU" (at 20 0)
    (property "Reference" "U1")
    (pad "5" smd rect (at 0 0) (net 1 "USB_D+"))
    (pad "6" smd rect (at 1 0) (net 2 "USB_D-"))
  )
  (segment (start 0 0) (end 10 0) (width 0.2) (layer "F.Cu") (net 1))
  (segment (start 10 0) (end 20 0) (width 0.2) (layer "F.Cu") (net 1))
  (segment (start 1 0) (end 20 0) (width 0.2) (layer "F.Cu") (net 2))
  (segment (start 0 5) (end 3 5) (width 0.2) (layer "F.Cu") (net 3))
  (segment (start 0 6) (end 3 6) (width 0.2) (layer "F.Cu") (net 4))
)
"#;

    #[test]
    fn test_detects_plus_minus_and_pn_pairs() {
        let pcb = PcbParser::parse_content(DIFF_PCB, "t.kicad_pcb").unwrap();
        let pairs = detect_differential_pairs(&pcb);

        assert_eq!(pairs.len(), 2);
        // Sorted by base name: CLK_ before USB_D.
        assert_eq!(pairs[0].base_name, "CLK_");
        assert_eq!(pairs[0].positive_net, "CLK_P");
        assert_eq!(pairs[0].negative_net, "CLK_N");
        assert_eq!(pairs[1].base_name, "USB_D");
        assert_eq!(pairs[1].positive_net, "USB_D+");
        assert_eq!(pairs[1].negative_net, "USB_D-");
    }

    #[test]
    fn test_lengths_and_mismatch() {
        let pcb = PcbParser::parse_content(DIFF_PCB, "t.kicad_pcb").unwrap();
        let pairs = detect_differential_pairs(&pcb);
        let usb = &pairs[1];

        assert_eq!(usb.pos_length, 20.0);
        assert_eq!(usb.neg_length, 19.0);
        assert_eq!(usb.length_mismatch, 1.0);
        assert_eq!(usb.components, vec!["J1", "U1"]);
    }

    #[test]
    fn test_each_net_pairs_once() {
        let pcb = PcbParser::parse_content(DIFF_PCB, "t.kicad_pcb").unwrap();
        let pairs = detect_differential_pairs(&pcb);
        let mut seen = BTreeSet::new();
        for p in &pairs {
            assert!(seen.insert(p.positive_net.clone()));
            assert!(seen.insert(p.negative_net.clone()));
        }
    }

    #[test]
    fn test_unpaired_suffix_net_ignored() {
        let pcb = PcbParser::parse_content(
            "(kicad_pcb (net 1 \"LONELY+\") (net 2 \"GND\"))",
            "t.kicad_pcb",
        )
        .unwrap();
        assert!(detect_differential_pairs(&pcb).is_empty());
    }
}
