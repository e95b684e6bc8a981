//! Unified analysis builder.
//!
//! Combines the PCB extraction, optional schematic data, and every
//! analyzer into one stable JSON-serializable report. The PCB is the
//! source of truth; schematic data enriches cross-reference checks and
//! degrades to `None` with a warning when it cannot be parsed.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzer::classify::{
    detect_component_type, has_thermal_pad, is_power_regulator, ComponentClass,
};
use crate::analyzer::diffpair::{detect_differential_pairs, DifferentialPair};
use crate::analyzer::geometry::round_to;
use crate::analyzer::paths::trace_signal_path;
use crate::analyzer::thermal::{
    copper_pour_for, detect_via_in_pad, thermal_vias_for, CopperPourReport, ThermalViaReport,
    ViaInPad,
};
use crate::core::{AnalyzeOptions, BoardLensError};
use crate::parser::pcb::PcbParser;
use crate::parser::pcb_schema::{PcbDesign, Point};
use crate::parser::schema::Schematic;
use crate::parser::schematic::SchematicParser;
use crate::source::ProjectSource;

/// Net names matching any of these (case-insensitive substring) are
/// treated as power rails when partitioning net summaries.
const POWER_NET_KEYWORDS: &[&str] = &["+", "VCC", "VDD", "VBUS", "GND", "VSS", "VBAT"];

/// Extended keyword list for thermal analysis, where bare rail names
/// like V3/V5/V12 also matter.
const THERMAL_POWER_KEYWORDS: &[&str] =
    &["+", "VCC", "VDD", "VBUS", "GND", "VSS", "VBAT", "V3", "V5", "V12"];

/// Search radius in mm for thermal vias and copper pours around a part.
const THERMAL_SEARCH_RADIUS: f64 = 5.0;

/// Default radius for the `thermal_vias` point query.
pub const DEFAULT_VIA_SEARCH_RADIUS: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary {
    pub reference: String,
    pub value: String,
    #[serde(rename = "type")]
    pub class: ComponentClass,
    pub footprint: String,
    pub layer: String,
    pub position: Point,
    pub net_count: usize,
    pub connected_nets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetSummary {
    pub name: String,
    pub net_number: u32,
    pub component_count: usize,
    pub components: Vec<String>,
    pub via_count: usize,
    pub trace_count: usize,
    /// mm, 2 decimals.
    pub total_trace_length: f64,
    pub is_power: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStatistics {
    pub total_segments: usize,
    pub total_length: f64,
    /// Width formatted to 3 decimals -> segment count.
    pub width_distribution: BTreeMap<String, usize>,
    pub layer_distribution: BTreeMap<String, usize>,
    pub min_width: f64,
    pub max_width: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViaStatistics {
    pub total_count: usize,
    pub drill_distribution: BTreeMap<String, usize>,
    pub min_drill: f64,
    pub max_drill: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneInfo {
    pub layer: String,
    pub net: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStackup {
    pub total_layers: usize,
    pub copper_layers: Vec<String>,
    pub routed_layers: Vec<String>,
    pub layer_usage: BTreeMap<String, usize>,
    pub zones: Vec<ZoneInfo>,
    pub zone_layers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMismatch {
    pub reference: String,
    pub schematic_value: String,
    pub pcb_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintMismatch {
    pub reference: String,
    pub schematic_footprint: String,
    pub pcb_footprint: String,
}

/// Schematic-vs-PCB reference designator reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReference {
    pub matched: usize,
    pub schematic_only: Vec<String>,
    pub pcb_only: Vec<String>,
    pub value_mismatches: Vec<ValueMismatch>,
    pub footprint_mismatches: Vec<FootprintMismatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentThermal {
    pub reference: String,
    pub value: String,
    pub position: Point,
    pub footprint: String,
    pub is_power_regulator: bool,
    pub has_thermal_pad: bool,
    pub connected_power_nets: Vec<String>,
    pub thermal_vias: ThermalViaReport,
    pub copper_pour: CopperPourReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_components: usize,
    pub total_nets: usize,
    pub total_traces: usize,
    pub total_vias: usize,
    pub via_in_pad_count: usize,
    pub copper_layers: usize,
    pub schematic_sheets: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentsSection {
    pub by_type: BTreeMap<ComponentClass, Vec<ComponentSummary>>,
    pub all: Vec<ComponentSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawData {
    pub pcb: PcbDesign,
    pub schematic: Option<Schematic>,
}

/// The full analysis report. Field names are part of the JSON contract
/// consumed by downstream review tooling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub project_path: String,
    /// RFC 3339 generation time.
    pub timestamp: String,
    pub summary: AnalysisSummary,
    pub components: ComponentsSection,
    pub power_nets: Vec<NetSummary>,
    pub signal_nets: Vec<NetSummary>,
    pub trace_stats: TraceStatistics,
    pub via_stats: ViaStatistics,
    pub via_in_pad: Vec<ViaInPad>,
    pub layer_stackup: LayerStackup,
    pub differential_pairs: Vec<DifferentialPair>,
    pub cross_reference: CrossReference,
    pub thermal_analysis: Vec<ComponentThermal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<RawData>,
}

/// Holds one parsed project and answers both the bulk report and the
/// point queries (net membership, signal paths, via search).
pub struct UnifiedAnalyzer {
    pcb: PcbDesign,
    schematic: Option<Schematic>,
    project_path: String,
}

impl UnifiedAnalyzer {
    /// Analyze a project directory through a [`ProjectSource`]. The PCB
    /// file is required; schematic problems degrade to a PCB-only report.
    pub fn analyze_project(
        source: &dyn ProjectSource,
        project_path: &str,
    ) -> Result<Self, BoardLensError> {
        let files = source.list_files(project_path)?;
        let pcb_file = files
            .iter()
            .find(|f| f.ends_with(".kicad_pcb"))
            .ok_or(BoardLensError::NoPcbFile)?;

        let pcb_path = source.join_path(project_path, pcb_file);
        let content = source.read_file(&pcb_path)?;
        let pcb = PcbParser::parse_content(&content, pcb_file)?;

        let schematic = match SchematicParser::new().parse_project(source, project_path) {
            Ok(sch) => Some(sch),
            Err(e) => {
                tracing::warn!(error = %e, "could not parse schematics, continuing PCB-only");
                None
            }
        };

        Ok(Self {
            pcb,
            schematic,
            project_path: project_path.to_string(),
        })
    }

    /// Analyze from in-memory contents, for callers that already hold the
    /// file data.
    pub fn analyze_from_content(
        pcb_content: &str,
        pcb_filename: &str,
        schematic_files: &[(String, String)],
    ) -> Result<Self, BoardLensError> {
        let pcb = PcbParser::parse_content(pcb_content, pcb_filename)?;

        let schematic = if schematic_files.is_empty() {
            None
        } else {
            match SchematicParser::new().parse_files(schematic_files, pcb_filename) {
                Ok(sch) => Some(sch),
                Err(e) => {
                    tracing::warn!(error = %e, "could not parse schematics, continuing PCB-only");
                    None
                }
            }
        };

        Ok(Self {
            pcb,
            schematic,
            project_path: pcb_filename.to_string(),
        })
    }

    pub fn pcb(&self) -> &PcbDesign {
        &self.pcb
    }

    pub fn schematic(&self) -> Option<&Schematic> {
        self.schematic.as_ref()
    }

    /// Build the full report.
    pub fn build_result(&self, options: &AnalyzeOptions) -> AnalysisResult {
        let all = self.build_component_summaries();
        let by_type = Self::group_by_type(&all);
        let (power_nets, signal_nets) = self.build_net_summaries();
        let via_in_pad = detect_via_in_pad(&self.pcb);

        AnalysisResult {
            project_path: self.project_path.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: AnalysisSummary {
                total_components: self.pcb.footprints.len(),
                total_nets: self.pcb.nets.len(),
                total_traces: self.pcb.traces.len(),
                total_vias: self.pcb.vias.len(),
                via_in_pad_count: via_in_pad.len(),
                copper_layers: self.pcb.copper_layers.len(),
                schematic_sheets: self.schematic.as_ref().map_or(0, |s| s.sheets.len()),
            },
            components: ComponentsSection { by_type, all },
            power_nets,
            signal_nets,
            trace_stats: self.build_trace_statistics(),
            via_stats: self.build_via_statistics(),
            via_in_pad,
            layer_stackup: self.build_layer_stackup(),
            differential_pairs: detect_differential_pairs(&self.pcb),
            cross_reference: self.build_cross_reference(),
            thermal_analysis: self.build_thermal_analysis(),
            raw_data: options.include_raw_data.then(|| RawData {
                pcb: self.pcb.clone(),
                schematic: self.schematic.clone(),
            }),
        }
    }

    /// Components on a named net, or `None` when the net is unknown.
    pub fn components_on_net(&self, net_name: &str) -> Option<Vec<String>> {
        let num = self.pcb.net_number(net_name)?;
        let conn = self.pcb.connectivity.get(&num)?;
        Some(conn.components.iter().cloned().collect())
    }

    /// Shortest signal path between two components.
    pub fn trace_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        trace_signal_path(&self.pcb, from, to)
    }

    /// Vias within `radius` mm of a component.
    pub fn thermal_vias(&self, reference: &str, radius: f64) -> ThermalViaReport {
        thermal_vias_for(&self.pcb, reference, radius)
    }

    fn build_component_summaries(&self) -> Vec<ComponentSummary> {
        let mut summaries: Vec<ComponentSummary> = self
            .pcb
            .footprints
            .iter()
            .map(|fp| {
                let nets = self.pcb.component_nets.get(&fp.reference);
                let connected_nets: Vec<String> = nets
                    .map(|ns| ns.iter().map(|&n| self.pcb.net_name(n)).collect())
                    .unwrap_or_default();

                ComponentSummary {
                    reference: fp.reference.clone(),
                    value: fp.value.clone(),
                    class: detect_component_type(fp),
                    footprint: fp.footprint_type.clone(),
                    layer: fp.layer.clone(),
                    position: fp.position(),
                    net_count: connected_nets.len(),
                    connected_nets,
                }
            })
            .collect();

        summaries.sort_by(|a, b| a.reference.cmp(&b.reference));
        summaries
    }

    fn group_by_type(
        summaries: &[ComponentSummary],
    ) -> BTreeMap<ComponentClass, Vec<ComponentSummary>> {
        let mut groups: BTreeMap<ComponentClass, Vec<ComponentSummary>> = BTreeMap::new();
        for summary in summaries {
            groups.entry(summary.class).or_default().push(summary.clone());
        }
        groups
    }

    fn build_net_summaries(&self) -> (Vec<NetSummary>, Vec<NetSummary>) {
        let mut power_nets = Vec::new();
        let mut signal_nets = Vec::new();

        for (&net_num, net_name) in &self.pcb.nets {
            // Net 0 is the reserved unconnected net.
            if net_num == 0 || net_name.is_empty() {
                continue;
            }
            let Some(conn) = self.pcb.connectivity.get(&net_num) else {
                continue;
            };

            let upper = net_name.to_uppercase();
            let is_power = POWER_NET_KEYWORDS.iter().any(|kw| upper.contains(kw));
            let total_trace_length: f64 = conn.traces.iter().map(|t| t.length).sum();

            let summary = NetSummary {
                name: net_name.clone(),
                net_number: net_num,
                component_count: conn.components.len(),
                components: conn.components.iter().cloned().collect(),
                via_count: conn.vias.len(),
                trace_count: conn.traces.len(),
                total_trace_length: round_to(total_trace_length, 2),
                is_power,
            };

            if is_power {
                power_nets.push(summary);
            } else {
                signal_nets.push(summary);
            }
        }

        let busiest_first = |a: &NetSummary, b: &NetSummary| {
            b.component_count
                .cmp(&a.component_count)
                .then_with(|| a.name.cmp(&b.name))
        };
        power_nets.sort_by(busiest_first);
        signal_nets.sort_by(busiest_first);

        (power_nets, signal_nets)
    }

    fn build_trace_statistics(&self) -> TraceStatistics {
        if self.pcb.traces.is_empty() {
            return TraceStatistics::default();
        }

        let mut stats = TraceStatistics {
            total_segments: self.pcb.traces.len(),
            min_width: f64::INFINITY,
            ..Default::default()
        };
        let mut total_length = 0.0;

        for trace in &self.pcb.traces {
            total_length += trace.length;
            *stats
                .width_distribution
                .entry(format!("{:.3}", trace.width))
                .or_insert(0) += 1;
            *stats.layer_distribution.entry(trace.layer.clone()).or_insert(0) += 1;
            stats.min_width = stats.min_width.min(trace.width);
            stats.max_width = stats.max_width.max(trace.width);
        }

        stats.total_length = round_to(total_length, 2);
        stats
    }

    fn build_via_statistics(&self) -> ViaStatistics {
        if self.pcb.vias.is_empty() {
            return ViaStatistics::default();
        }

        let mut stats = ViaStatistics {
            total_count: self.pcb.vias.len(),
            min_drill: f64::INFINITY,
            ..Default::default()
        };

        for via in &self.pcb.vias {
            *stats
                .drill_distribution
                .entry(format!("{:.3}", via.drill))
                .or_insert(0) += 1;
            stats.min_drill = stats.min_drill.min(via.drill);
            stats.max_drill = stats.max_drill.max(via.drill);
        }

        stats
    }

    fn build_layer_stackup(&self) -> LayerStackup {
        let mut layer_usage: BTreeMap<String, usize> = BTreeMap::new();
        for trace in &self.pcb.traces {
            *layer_usage.entry(trace.layer.clone()).or_insert(0) += 1;
        }
        let routed_layers: Vec<String> = layer_usage.keys().cloned().collect();

        let mut zones = Vec::new();
        let mut zone_layers: Vec<String> = Vec::new();
        for zone in &self.pcb.zones {
            if zone.layer.is_empty() || zone.net_name.is_empty() {
                continue;
            }
            zones.push(ZoneInfo {
                layer: zone.layer.clone(),
                net: zone.net_name.clone(),
            });
            if !zone_layers.contains(&zone.layer) {
                zone_layers.push(zone.layer.clone());
            }
        }
        zone_layers.sort();

        LayerStackup {
            total_layers: self.pcb.layers.len(),
            copper_layers: self.pcb.copper_layers.clone(),
            routed_layers,
            layer_usage,
            zones,
            zone_layers,
        }
    }

    fn build_cross_reference(&self) -> CrossReference {
        let Some(sch) = &self.schematic else {
            return CrossReference {
                pcb_only: {
                    let mut refs: Vec<String> =
                        self.pcb.footprints.iter().map(|f| f.reference.clone()).collect();
                    refs.sort();
                    refs
                },
                ..Default::default()
            };
        };

        let mut cross = CrossReference::default();
        let mut matched = Vec::new();

        for fp in &self.pcb.footprints {
            if sch.components.contains_key(&fp.reference) {
                matched.push(fp.reference.clone());
            } else {
                cross.pcb_only.push(fp.reference.clone());
            }
        }
        for reference in sch.components.keys() {
            if self.pcb.footprint(reference).is_none() {
                cross.schematic_only.push(reference.clone());
            }
        }

        for reference in &matched {
            let (Some(pcb_comp), Some(sch_comp)) =
                (self.pcb.footprint(reference), sch.components.get(reference))
            else {
                continue;
            };

            if pcb_comp.value != sch_comp.value {
                cross.value_mismatches.push(ValueMismatch {
                    reference: reference.clone(),
                    schematic_value: sch_comp.value.clone(),
                    pcb_value: pcb_comp.value.clone(),
                });
            }

            // Compare footprint names with the library prefix stripped;
            // the schematic often carries the bare name.
            let pcb_fp = pcb_comp
                .footprint_type
                .rsplit(':')
                .next()
                .unwrap_or(&pcb_comp.footprint_type);
            let sch_fp = sch_comp
                .footprint
                .rsplit(':')
                .next()
                .unwrap_or(&sch_comp.footprint);
            if !pcb_fp.is_empty() && !sch_fp.is_empty() && pcb_fp != sch_fp {
                cross.footprint_mismatches.push(FootprintMismatch {
                    reference: reference.clone(),
                    schematic_footprint: sch_comp.footprint.clone(),
                    pcb_footprint: pcb_comp.footprint_type.clone(),
                });
            }
        }

        cross.matched = matched.len();
        cross.schematic_only.sort();
        cross.pcb_only.sort();
        cross
    }

    fn build_thermal_analysis(&self) -> Vec<ComponentThermal> {
        let mut results = Vec::new();

        for fp in &self.pcb.footprints {
            let nets = self.pcb.component_nets.get(&fp.reference);
            let mut all_nets = Vec::new();
            let mut power_nets = Vec::new();
            if let Some(nets) = nets {
                for &num in nets {
                    let name = self.pcb.nets.get(&num).cloned().unwrap_or_default();
                    let upper = name.to_uppercase();
                    if THERMAL_POWER_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
                        power_nets.push(name.clone());
                    }
                    all_nets.push(name);
                }
            }

            let is_regulator = is_power_regulator(fp, &all_nets);
            let has_pad = has_thermal_pad(fp);
            if !is_regulator && !has_pad {
                continue;
            }

            results.push(ComponentThermal {
                reference: fp.reference.clone(),
                value: fp.value.clone(),
                position: fp.position(),
                footprint: fp.footprint_type.clone(),
                is_power_regulator: is_regulator,
                has_thermal_pad: has_pad,
                connected_power_nets: power_nets,
                thermal_vias: thermal_vias_for(&self.pcb, &fp.reference, THERMAL_SEARCH_RADIUS),
                copper_pour: copper_pour_for(&self.pcb, fp, THERMAL_SEARCH_RADIUS),
            });
        }

        results.sort_by(|a, b| a.reference.cmp(&b.reference));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PCB: &str = r#"
(kicad_pcb
  (layers (0 "F.Cu" signal) (31 "B.Cu" signal) (36 "F.SilkS" user))
  (net 0 "")
  (net 1 "GND")
  (net 2 "+3V3")
  (net 3 "SPI_CLK")
  (footprint "Package_TO_SOT_SMD:SOT-223-3" (at 10 10)
    (property "Reference" "U1")
    (property "Value" "AMS1117-3.3")
    (pad "1" smd rect (at -2 0) (size 1 1) (net 1 "GND"))
    (pad "2" smd rect (at 0 0) (size 1 1) (net 2 "+3V3"))
  )
  (footprint "Resistor_SMD:R_0402" (at 20 10)
    (property "Reference" "R1")
    (property "Value" "10k")
    (pad "1" smd rect (at 0 0) (size 0.5 0.5) (net 2 "+3V3"))
    (pad "2" smd rect (at 1 0) (size 0.5 0.5) (net 3 "SPI_CLK"))
  )
  (segment (start 10 10) (end 20 10) (width 0.25) (layer "F.Cu") (net 2))
  (segment (start 20 10) (end 25 10) (width 0.15) (layer "B.Cu") (net 3))
  (via (at 12 10) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
  (zone (net 1) (net_name "GND") (layer "B.Cu")
    (polygon (pts (xy 0 0) (xy 30 0) (xy 30 20) (xy 0 20)))
  )
)
"#;

    const SCH: &str = r#"
(kicad_sch
  (symbol (lib_id "Regulator_Linear:AMS1117-3.3") (at 50 50)
    (property "Reference" "U1")
    (property "Value" "AMS1117-3.3")
    (property "Footprint" "Package_TO_SOT_SMD:SOT-223-3")
  )
  (symbol (lib_id "Device:R") (at 60 50)
    (property "Reference" "R1")
    (property "Value" "4.7k")
    (property "Footprint" "Resistor_SMD:R_0402")
  )
  (symbol (lib_id "Device:C") (at 70 50)
    (property "Reference" "C1")
    (property "Value" "10u")
  )
)
"#;

    fn analyze() -> UnifiedAnalyzer {
        let files = vec![("main.kicad_sch".to_string(), SCH.to_string())];
        UnifiedAnalyzer::analyze_from_content(PCB, "board.kicad_pcb", &files).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        assert_eq!(result.summary.total_components, 2);
        assert_eq!(result.summary.total_nets, 4);
        assert_eq!(result.summary.total_traces, 2);
        assert_eq!(result.summary.total_vias, 1);
        assert_eq!(result.summary.copper_layers, 2);
        assert_eq!(result.summary.schematic_sheets, 1);
    }

    #[test]
    fn test_components_sorted_and_grouped() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        let refs: Vec<&str> = result.components.all.iter().map(|c| c.reference.as_str()).collect();
        assert_eq!(refs, vec!["R1", "U1"]);

        let resistors = result.components.by_type.get(&ComponentClass::Resistor).unwrap();
        assert_eq!(resistors.len(), 1);
        assert_eq!(resistors[0].connected_nets, vec!["+3V3", "SPI_CLK"]);
    }

    #[test]
    fn test_power_signal_partition() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        let power: Vec<&str> = result.power_nets.iter().map(|n| n.name.as_str()).collect();
        let signal: Vec<&str> = result.signal_nets.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(power, vec!["+3V3", "GND"]);
        assert_eq!(signal, vec!["SPI_CLK"]);
        // Net 0 appears nowhere.
        assert!(result.power_nets.iter().all(|n| n.net_number != 0));
    }

    #[test]
    fn test_trace_and_via_stats() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        assert_eq!(result.trace_stats.total_segments, 2);
        assert_eq!(result.trace_stats.total_length, 15.0);
        assert_eq!(result.trace_stats.min_width, 0.15);
        assert_eq!(result.trace_stats.max_width, 0.25);
        assert_eq!(result.trace_stats.width_distribution.get("0.250"), Some(&1));
        assert_eq!(result.via_stats.total_count, 1);
        assert_eq!(result.via_stats.drill_distribution.get("0.300"), Some(&1));
    }

    #[test]
    fn test_layer_stackup() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        assert_eq!(result.layer_stackup.total_layers, 3);
        assert_eq!(result.layer_stackup.routed_layers, vec!["B.Cu", "F.Cu"]);
        assert_eq!(result.layer_stackup.zone_layers, vec!["B.Cu"]);
    }

    #[test]
    fn test_cross_reference() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        let cross = &result.cross_reference;
        assert_eq!(cross.matched, 2);
        assert_eq!(cross.schematic_only, vec!["C1"]);
        assert!(cross.pcb_only.is_empty());
        assert_eq!(cross.value_mismatches.len(), 1);
        assert_eq!(cross.value_mismatches[0].reference, "R1");
        assert!(cross.footprint_mismatches.is_empty());
    }

    #[test]
    fn test_thermal_analysis_covers_regulator() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        assert_eq!(result.thermal_analysis.len(), 1);
        let therm = &result.thermal_analysis[0];
        assert_eq!(therm.reference, "U1");
        assert!(therm.is_power_regulator);
        assert!(therm.has_thermal_pad);
        assert_eq!(therm.connected_power_nets, vec!["GND", "+3V3"]);
        assert_eq!(therm.thermal_vias.count, 1);
        assert_eq!(therm.copper_pour.zones_containing_component.len(), 1);
        assert_eq!(therm.copper_pour.total_connected_area, 600.0);
    }

    #[test]
    fn test_missing_schematic_degrades() {
        let analyzer =
            UnifiedAnalyzer::analyze_from_content(PCB, "board.kicad_pcb", &[]).unwrap();
        let result = analyzer.build_result(&AnalyzeOptions::default());
        assert_eq!(result.summary.schematic_sheets, 0);
        assert_eq!(result.cross_reference.matched, 0);
        assert_eq!(result.cross_reference.pcb_only, vec!["R1", "U1"]);
    }

    #[test]
    fn test_raw_data_flag() {
        let analyzer = analyze();
        let without = analyzer.build_result(&AnalyzeOptions::default());
        assert!(without.raw_data.is_none());

        let with = analyzer.build_result(&AnalyzeOptions { include_raw_data: true });
        let raw = with.raw_data.unwrap();
        assert_eq!(raw.pcb.footprints.len(), 2);
        assert!(raw.schematic.is_some());
    }

    #[test]
    fn test_point_queries() {
        let analyzer = analyze();
        assert_eq!(
            analyzer.components_on_net("+3V3").unwrap(),
            vec!["R1", "U1"]
        );
        assert!(analyzer.components_on_net("NOPE").is_none());
        assert_eq!(
            analyzer.trace_path("U1", "R1").unwrap(),
            vec!["U1", "[+3V3]", "R1"]
        );
        let vias = analyzer.thermal_vias("U1", DEFAULT_VIA_SEARCH_RADIUS);
        assert_eq!(vias.count, 1);
        assert_eq!(vias.by_net.get("GND"), Some(&1));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = analyze().build_result(&AnalyzeOptions::default());
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("projectPath").is_some());
        assert!(json["summary"].get("viaInPadCount").is_some());
        assert!(json["components"].get("byType").is_some());
        assert!(json.get("raw_data").is_none());
        assert!(json.get("rawData").is_none());
    }
}
