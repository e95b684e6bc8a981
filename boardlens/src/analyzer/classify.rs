//! Component classification heuristics.
//!
//! Classification is derived from the reference-designator prefix, the
//! value string, and the footprint name using ordered first-match-wins
//! pattern tables. It informs grouping and thermal analysis only; a
//! misclassified part degrades a report, never correctness.

use serde::Serialize;
use std::fmt;

use crate::parser::pcb_schema::Footprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentClass {
    Resistor,
    Capacitor,
    Inductor,
    Diode,
    Transistor,
    Led,
    Crystal,
    Testpoint,
    MountingHole,
    Switch,
    Fuse,
    FerriteBead,
    ConnectorUsb,
    ConnectorRj45,
    ConnectorSd,
    ConnectorAudio,
    ConnectorHeader,
    Connector,
    IcMcu,
    IcMemory,
    IcPower,
    IcLogic,
    IcTransceiver,
    IcUsb,
    IcAnalog,
    IcComm,
    Ic,
    Unknown,
}

impl ComponentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentClass::Resistor => "RESISTOR",
            ComponentClass::Capacitor => "CAPACITOR",
            ComponentClass::Inductor => "INDUCTOR",
            ComponentClass::Diode => "DIODE",
            ComponentClass::Transistor => "TRANSISTOR",
            ComponentClass::Led => "LED",
            ComponentClass::Crystal => "CRYSTAL",
            ComponentClass::Testpoint => "TESTPOINT",
            ComponentClass::MountingHole => "MOUNTING_HOLE",
            ComponentClass::Switch => "SWITCH",
            ComponentClass::Fuse => "FUSE",
            ComponentClass::FerriteBead => "FERRITE_BEAD",
            ComponentClass::ConnectorUsb => "CONNECTOR_USB",
            ComponentClass::ConnectorRj45 => "CONNECTOR_RJ45",
            ComponentClass::ConnectorSd => "CONNECTOR_SD",
            ComponentClass::ConnectorAudio => "CONNECTOR_AUDIO",
            ComponentClass::ConnectorHeader => "CONNECTOR_HEADER",
            ComponentClass::Connector => "CONNECTOR",
            ComponentClass::IcMcu => "IC_MCU",
            ComponentClass::IcMemory => "IC_MEMORY",
            ComponentClass::IcPower => "IC_POWER",
            ComponentClass::IcLogic => "IC_LOGIC",
            ComponentClass::IcTransceiver => "IC_TRANSCEIVER",
            ComponentClass::IcUsb => "IC_USB",
            ComponentClass::IcAnalog => "IC_ANALOG",
            ComponentClass::IcComm => "IC_COMM",
            ComponentClass::Ic => "IC",
            ComponentClass::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const MCU_PATTERNS: &[&str] = &["rp2040", "rp2350", "stm32", "esp32", "atmega", "pic", "samd", "nrf"];
const MEMORY_PATTERNS: &[&str] = &["flash", "w25q", "mx25", "at25", "eeprom", "fram"];
const POWER_IC_PATTERNS: &[&str] =
    &["tps", "ldo", "regulator", "buck", "boost", "me6217", "ams1117", "ap2112"];
const LOGIC_PATTERNS: &[&str] = &["sn74", "lvc", "hc", "hct", "245", "125", "buffer", "driver"];
const TRANSCEIVER_PATTERNS: &[&str] = &["lvds", "ds90", "sn65"];
const USB_IC_PATTERNS: &[&str] = &["usb", "ch340", "cp210", "ft232", "ft2232"];
const ANALOG_PATTERNS: &[&str] = &["adc", "dac", "mcp3"];
const COMM_PATTERNS: &[&str] = &["can", "rs485", "rs232", "uart"];

fn matches_any(haystack: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| haystack.contains(p))
}

/// Classify a footprint by reference prefix, refined by value keywords for
/// connectors and ICs. Multi-letter prefixes are tested before their
/// single-letter ancestors so `LED1` is not an inductor and `FB2` is not
/// a fuse.
pub fn detect_component_type(fp: &Footprint) -> ComponentClass {
    let reference = fp.reference.as_str();
    let value = fp.value.to_lowercase();

    if reference.starts_with("LED") {
        return ComponentClass::Led;
    }
    if reference.starts_with("TP") {
        return ComponentClass::Testpoint;
    }
    if reference.starts_with("FB") {
        return ComponentClass::FerriteBead;
    }
    if reference.starts_with("SW") {
        return ComponentClass::Switch;
    }
    if reference.starts_with("CON") {
        return classify_connector(&value);
    }
    if reference.starts_with('R') {
        return ComponentClass::Resistor;
    }
    if reference.starts_with('C') {
        return ComponentClass::Capacitor;
    }
    if reference.starts_with('L') {
        return ComponentClass::Inductor;
    }
    if reference.starts_with('D') {
        return ComponentClass::Diode;
    }
    if reference.starts_with('Q') {
        return ComponentClass::Transistor;
    }
    if reference.starts_with('Y') || reference.starts_with('X') {
        return ComponentClass::Crystal;
    }
    if reference.starts_with('H') {
        return ComponentClass::MountingHole;
    }
    if reference.starts_with('F') {
        return ComponentClass::Fuse;
    }
    if reference.starts_with('J') || reference.starts_with('P') {
        return classify_connector(&value);
    }
    if reference.starts_with('U') {
        return classify_ic(&value);
    }

    ComponentClass::Unknown
}

fn classify_connector(value: &str) -> ComponentClass {
    if value.contains("usb") {
        ComponentClass::ConnectorUsb
    } else if value.contains("rj45") || value.contains("ethernet") {
        ComponentClass::ConnectorRj45
    } else if value.contains("sd") || value.contains("microsd") || value.contains("tf") {
        ComponentClass::ConnectorSd
    } else if value.contains("audio") || value.contains("jack") {
        ComponentClass::ConnectorAudio
    } else if value.contains("header") {
        ComponentClass::ConnectorHeader
    } else {
        ComponentClass::Connector
    }
}

fn classify_ic(value: &str) -> ComponentClass {
    if matches_any(value, MCU_PATTERNS) {
        ComponentClass::IcMcu
    } else if matches_any(value, MEMORY_PATTERNS) {
        ComponentClass::IcMemory
    } else if matches_any(value, POWER_IC_PATTERNS) {
        ComponentClass::IcPower
    } else if matches_any(value, LOGIC_PATTERNS) {
        ComponentClass::IcLogic
    } else if matches_any(value, TRANSCEIVER_PATTERNS) {
        ComponentClass::IcTransceiver
    } else if matches_any(value, USB_IC_PATTERNS) {
        ComponentClass::IcUsb
    } else if matches_any(value, ANALOG_PATTERNS) {
        ComponentClass::IcAnalog
    } else if matches_any(value, COMM_PATTERNS) {
        ComponentClass::IcComm
    } else {
        ComponentClass::Ic
    }
}

const LDO_PATTERNS: &[&str] = &[
    "ldo", "regulator", "ld1117", "ams1117", "me6211", "me6217", "ap2112", "xc6206", "ht7333",
    "rt9013", "tps7a", "lp2985", "mic5205",
];
const SWITCHER_PATTERNS: &[&str] = &["ap62", "lm267", "mt36", "sy8", "rt6", "aoz", "lmr", "tps5"];
const POWER_PACKAGES: &[&str] = &["sot223", "dpak", "d2pak", "to252", "to263"];
const SMALL_SOT_PACKAGES: &[&str] = &["sot23", "sot89", "sot353", "sc70"];
const QFN_POWER_VALUE_PREFIXES: &[&str] = &["tps", "aoz"];

/// `prefix` immediately followed by at least `digits` decimal digits,
/// anywhere in the string. Stands in for the part-number digit families
/// (78xx/79xx series, MPxxxx switchers).
fn contains_prefix_digits(value: &str, prefix: &str, digits: usize) -> bool {
    let bytes = value.as_bytes();
    let plen = prefix.len();
    let mut from = 0;
    while let Some(pos) = value[from..].find(prefix) {
        let start = from + pos + plen;
        let count = bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();
        if count >= digits {
            return true;
        }
        from = from + pos + 1;
    }
    false
}

/// Heuristic: does this footprint look like a power regulator?
///
/// `connected_nets` lets the connectivity-pattern fallback catch LDOs
/// with an empty or placeholder value: connected to ground and two or
/// more voltage rails in a small SOT package.
pub fn is_power_regulator(fp: &Footprint, connected_nets: &[String]) -> bool {
    if !fp.reference.starts_with('U') {
        return false;
    }

    let value = fp.value.to_lowercase();
    let package = normalize_package(&fp.footprint_type);

    if matches_any(&value, LDO_PATTERNS) {
        return true;
    }
    // 78xx/79xx linear series, including L78/L79 variants.
    if contains_prefix_digits(&value, "78", 2)
        || contains_prefix_digits(&value, "79", 2)
        || value.contains("l78")
        || value.contains("l79")
    {
        return true;
    }
    if matches_any(&value, SWITCHER_PATTERNS)
        || contains_prefix_digits(&value, "tps6", 1)
        || contains_prefix_digits(&value, "mp1", 3)
        || contains_prefix_digits(&value, "mp2", 1)
    {
        return true;
    }
    if matches_any(&package, POWER_PACKAGES) {
        return true;
    }
    if (package.contains("qfn") || package.contains("dfn"))
        && (matches_any(&value, QFN_POWER_VALUE_PREFIXES)
            || contains_prefix_digits(&value, "mp", 1)
            || contains_prefix_digits(&value, "lm", 1)
            || contains_prefix_digits(&value, "lt", 1)
            || contains_prefix_digits(&value, "sy", 1))
    {
        return true;
    }

    // Connectivity fallback for parts with no usable value string.
    if !connected_nets.is_empty() {
        let upper: Vec<String> = connected_nets.iter().map(|n| n.to_uppercase()).collect();
        let has_gnd = upper.iter().any(|n| n == "GND" || n == "VSS");
        let voltage_nets = upper.iter().filter(|n| looks_like_voltage_net(n)).count();

        if has_gnd && voltage_nets >= 2 && matches_any(&package, SMALL_SOT_PACKAGES) {
            return true;
        }
    }

    false
}

fn looks_like_voltage_net(name: &str) -> bool {
    let trimmed = name.strip_prefix('+').unwrap_or(name);
    if trimmed
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit() || c == 'V')
    {
        return true;
    }
    ["VCC", "VDD", "VBUS", "VIN", "VOUT"].iter().any(|kw| name.contains(kw))
}

const THERMAL_PACKAGES: &[&str] = &[
    "qfn", "dfn", "mlp", "vqfn", "wqfn", "sot223", "dpak", "d2pak", "to252", "to263", "powerso",
    "hso", "psop",
];
// "1ep" catches the KiCad "-1EP" suffix; a bare "ep" would also match
// names like "Receptacle".
const EXPOSED_PAD_MARKERS: &[&str] = &["1ep", "epad", "exposed"];

/// Package families that commonly carry an exposed thermal pad.
pub fn has_thermal_pad(fp: &Footprint) -> bool {
    let package = normalize_package(&fp.footprint_type);
    matches_any(&package, THERMAL_PACKAGES) || matches_any(&package, EXPOSED_PAD_MARKERS)
}

/// Lowercase and strip hyphens so `SOT-223`, `sot223`, and `TO-252`
/// variants all hit the same table entries.
fn normalize_package(footprint_type: &str) -> String {
    footprint_type
        .to_lowercase()
        .chars()
        .filter(|c| *c != '-')
        .collect()
}
