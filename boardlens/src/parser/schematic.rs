//! KiCad schematic extractor.
//!
//! Walks `.kicad_sch` sheets and extracts symbols, labels, wires, power
//! symbols, and sheet instances. Multi-sheet projects are parsed in
//! filename order into one shared result; a malformed sheet is recorded
//! as a warning and skipped rather than aborting the other sheets.

use thiserror::Error;

use crate::parser::schema::*;
use crate::parser::sexp::{Sexp, SexpError, SexpParser};
use crate::source::ProjectSource;

#[derive(Debug, Error)]
pub enum SchematicParseError {
    #[error("S-expression parse error in {sheet}: {source}")]
    Sexp {
        sheet: String,
        #[source]
        source: SexpError,
    },
    #[error("No .kicad_sch files found")]
    NoSchematicFiles,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Library ID prefixes/suffixes that identify power symbols.
const POWER_LIB_SUFFIXES: &[&str] = &[":gnd", ":vcc", ":vdd", ":vss", ":vbus"];

/// Canonical power-net names accepted as a symbol Value on their own.
const POWER_NET_NAMES: &[&str] = &["gnd", "vcc", "vdd", "vss", "vbus"];

/// A symbol is a power symbol when its library id matches a known power
/// pattern, or its value alone is a canonical power-net name. Both checks
/// are ASCII case-insensitive.
fn is_power_symbol(lib_id: &str, value: &str) -> bool {
    let id = lib_id.to_ascii_lowercase();

    if id.starts_with("power:") {
        return true;
    }
    if id.starts_with("device:") && id.contains("power") {
        return true;
    }
    if POWER_LIB_SUFFIXES.iter().any(|s| id.ends_with(s)) {
        return true;
    }
    // Voltage-literal library ids like "power:+5V" -> ":+5v" fragment.
    if has_voltage_fragment(&id) {
        return true;
    }

    is_power_net_name(value)
}

/// `:+<digits>v` anywhere in the lowercased library id.
fn has_voltage_fragment(id: &str) -> bool {
    let bytes = id.as_bytes();
    for start in 0..bytes.len() {
        if bytes[start] != b':' {
            continue;
        }
        let rest = &bytes[start + 1..];
        if rest.first() != Some(&b'+') {
            continue;
        }
        let digits = rest[1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits > 0 && rest.get(1 + digits) == Some(&b'v') {
            return true;
        }
    }
    false
}

/// GND / VCC / VDD / VSS / VBUS / `+NNv[N]` / `vN[vN]`, case-insensitive.
fn is_power_net_name(value: &str) -> bool {
    let val = value.to_ascii_lowercase();
    if POWER_NET_NAMES.contains(&val.as_str()) {
        return true;
    }

    let bytes = val.as_bytes();
    match bytes.first() {
        // +5V, +3V3, +12V ...
        Some(b'+') => {
            let digits = bytes[1..].iter().take_while(|b| b.is_ascii_digit()).count();
            if digits == 0 || bytes.get(1 + digits) != Some(&b'v') {
                return false;
            }
            bytes[2 + digits..].iter().all(|b| b.is_ascii_digit())
        }
        // V5, V33, V3V3 ...
        Some(b'v') => {
            let digits = bytes[1..].iter().take_while(|b| b.is_ascii_digit()).count();
            if digits == 0 {
                return false;
            }
            let rest = &bytes[1 + digits..];
            match rest.first() {
                None => true,
                Some(b'v') => rest[1..].iter().all(|b| b.is_ascii_digit()),
                _ => false,
            }
        }
        _ => false,
    }
}

#[derive(Default)]
pub struct SchematicParser {
    result: Schematic,
}

impl SchematicParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `.kicad_sch` file in a project directory, sorted by
    /// filename for deterministic sheet order.
    pub fn parse_project(
        mut self,
        source: &dyn ProjectSource,
        project_path: &str,
    ) -> Result<Schematic, SchematicParseError> {
        self.result.project_path = project_path.to_string();

        let mut sheet_files: Vec<String> = source
            .list_files(project_path)?
            .into_iter()
            .filter(|f| f.ends_with(".kicad_sch"))
            .collect();
        if sheet_files.is_empty() {
            return Err(SchematicParseError::NoSchematicFiles);
        }
        sheet_files.sort();

        for file in sheet_files {
            let path = source.join_path(project_path, &file);
            let content = source.read_file(&path)?;
            let sheet_name = source.base_name(&file, Some(".kicad_sch"));
            self.parse_content(&content, &sheet_name)?;
        }

        self.build_global_nets();
        Ok(self.result)
    }

    /// Parse schematic sheets already loaded into memory as
    /// `(filename, content)` pairs, sorted by filename.
    pub fn parse_files(
        mut self,
        files: &[(String, String)],
        project_path: &str,
    ) -> Result<Schematic, SchematicParseError> {
        if files.is_empty() {
            return Err(SchematicParseError::NoSchematicFiles);
        }
        self.result.project_path = project_path.to_string();

        let mut sorted: Vec<&(String, String)> = files.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        for (filename, content) in sorted {
            let sheet_name = filename
                .strip_suffix(".kicad_sch")
                .unwrap_or(filename)
                .to_string();
            self.parse_content(content, &sheet_name)?;
        }

        self.build_global_nets();
        Ok(self.result)
    }

    /// Parse one sheet into the shared result. A structural error is
    /// fatal for this sheet; a non-schematic top-level tag only records
    /// a warning so one bad sheet cannot block a multi-sheet project.
    pub fn parse_content(
        &mut self,
        content: &str,
        sheet_name: &str,
    ) -> Result<(), SchematicParseError> {
        self.result.sheets.push(sheet_name.to_string());

        let root = SexpParser::new(content)
            .parse()
            .map_err(|source| SchematicParseError::Sexp {
                sheet: sheet_name.to_string(),
                source,
            })?;

        let root = match root {
            Some(root) if root.tag() == Some("kicad_sch") => root,
            _ => {
                tracing::warn!(sheet = sheet_name, "not a valid schematic sheet, skipping");
                self.result
                    .warnings
                    .push(format!("invalid schematic format in {}", sheet_name));
                return Ok(());
            }
        };

        for item in root.as_list().unwrap_or(&[]).iter().skip(1) {
            match item.tag() {
                Some("symbol") => self.extract_symbol(item, sheet_name),
                Some("global_label") => self.extract_label(item, sheet_name, LabelKind::Global),
                Some("hierarchical_label") => {
                    self.extract_label(item, sheet_name, LabelKind::Hierarchical)
                }
                Some("label") => self.extract_label(item, sheet_name, LabelKind::Local),
                Some("wire") => self.extract_wire(item, sheet_name),
                Some("sheet") => self.extract_sheet(item),
                _ => {}
            }
        }

        Ok(())
    }

    /// Finish accumulation and build the global net table.
    pub fn finish(mut self) -> Schematic {
        self.build_global_nets();
        self.result
    }

    fn extract_symbol(&mut self, item: &Sexp, sheet_name: &str) {
        let mut lib_id = String::new();
        let mut uuid = String::new();
        let mut x = 0.0;
        let mut y = 0.0;
        let mut unit = 1;
        let mut reference = String::new();
        let mut value = String::new();
        let mut footprint = String::new();
        let mut properties = std::collections::BTreeMap::new();

        for sub in item.as_list().unwrap_or(&[]).iter().skip(1) {
            let fields = sub.as_list().unwrap_or(&[]);
            match sub.tag() {
                Some("lib_id") => {
                    lib_id = fields.get(1).and_then(|v| v.text()).unwrap_or_default()
                }
                Some("uuid") => uuid = fields.get(1).and_then(|v| v.text()).unwrap_or_default(),
                Some("at") => {
                    x = fields.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0);
                    y = fields.get(2).and_then(|v| v.as_f64()).unwrap_or(0.0);
                }
                Some("unit") => {
                    unit = fields.get(1).and_then(|v| v.as_u32()).unwrap_or(1);
                }
                Some("property") => {
                    if fields.len() >= 3 {
                        let name = fields[1].text().unwrap_or_default();
                        let val = fields[2].text().unwrap_or_default();
                        match name.as_str() {
                            "Reference" => reference = val.clone(),
                            "Value" => value = val.clone(),
                            "Footprint" => footprint = val.clone(),
                            _ => {}
                        }
                        properties.insert(name, val);
                    }
                }
                _ => {}
            }
        }

        if is_power_symbol(&lib_id, &value) {
            self.result.power_symbols.push(PowerSymbol {
                net_name: value,
                x,
                y,
                sheet: sheet_name.to_string(),
            });
            return;
        }

        // Graphical and power-flag symbols carry no usable reference.
        if reference.is_empty() || reference.starts_with('#') {
            return;
        }

        if uuid.is_empty() {
            uuid = uuid::Uuid::new_v4().to_string();
        }

        self.result.components.insert(
            reference.clone(),
            SchematicComponent {
                reference,
                value,
                footprint,
                lib_id,
                x,
                y,
                unit,
                sheet: sheet_name.to_string(),
                properties,
                uuid,
            },
        );
    }

    fn extract_label(&mut self, item: &Sexp, sheet_name: &str, kind: LabelKind) {
        let fields = item.as_list().unwrap_or(&[]);
        let Some(text) = fields.get(1).and_then(|v| v.text()) else { return };

        let mut x = 0.0;
        let mut y = 0.0;
        if let Some(at) = item.child("at") {
            let at = at.as_list().unwrap_or(&[]);
            x = at.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0);
            y = at.get(2).and_then(|v| v.as_f64()).unwrap_or(0.0);
        }

        self.result.labels.push(SchematicLabel {
            text,
            x,
            y,
            kind,
            sheet: sheet_name.to_string(),
        });
    }

    /// Only the first two points of a wire's polyline are kept; that is
    /// enough for connectivity context and multi-segment wires are rare.
    fn extract_wire(&mut self, item: &Sexp, sheet_name: &str) {
        let mut points = Vec::with_capacity(2);

        if let Some(pts) = item.child("pts") {
            for xy in pts.children("xy") {
                if points.len() == 2 {
                    break;
                }
                let fields = xy.as_list().unwrap_or(&[]);
                points.push((
                    fields.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0),
                    fields.get(2).and_then(|v| v.as_f64()).unwrap_or(0.0),
                ));
            }
        }

        let (x1, y1) = points.first().copied().unwrap_or((0.0, 0.0));
        let (x2, y2) = points.get(1).copied().unwrap_or((0.0, 0.0));

        if x1 != 0.0 || y1 != 0.0 || x2 != 0.0 || y2 != 0.0 {
            self.result.wires.push(SchematicWire {
                x1,
                y1,
                x2,
                y2,
                sheet: sheet_name.to_string(),
            });
        }
    }

    fn extract_sheet(&mut self, item: &Sexp) {
        let mut file = String::new();
        let mut name = String::new();

        for prop in item.children("property") {
            let fields = prop.as_list().unwrap_or(&[]);
            if fields.len() >= 3 {
                let prop_name = fields[1].text().unwrap_or_default();
                let prop_value = fields[2].text().unwrap_or_default();
                match prop_name.as_str() {
                    "Sheetfile" => file = prop_value,
                    "Sheetname" => name = prop_value,
                    _ => {}
                }
            }
        }

        if !file.is_empty() {
            let name = if name.is_empty() { file.clone() } else { name };
            self.result.sheet_instances.push(SheetInstance { file, name });
        }
    }

    /// Merge global labels and power symbols into one net table keyed by
    /// name, accumulating every connection point. A net first seen as a
    /// global label stays non-power even if a power symbol later joins it.
    fn build_global_nets(&mut self) {
        for label in &self.result.labels {
            if label.kind != LabelKind::Global {
                continue;
            }
            let net = self
                .result
                .global_nets
                .entry(label.text.clone())
                .or_insert_with(|| SchematicNet {
                    name: label.text.clone(),
                    is_global: true,
                    is_power: false,
                    connections: Vec::new(),
                });
            net.connections.push(NetConnection {
                sheet: label.sheet.clone(),
                x: label.x,
                y: label.y,
            });
        }

        for power in &self.result.power_symbols {
            let net = self
                .result
                .global_nets
                .entry(power.net_name.clone())
                .or_insert_with(|| SchematicNet {
                    name: power.net_name.clone(),
                    is_global: true,
                    is_power: true,
                    connections: Vec::new(),
                });
            net.connections.push(NetConnection {
                sheet: power.sheet.clone(),
                x: power.x,
                y: power.y,
            });
        }
    }
}
