pub mod classify;
pub mod diffpair;
pub mod geometry;
pub mod paths;
pub mod thermal;
pub mod unified;

// Re-export for convenience
pub use classify::{detect_component_type, has_thermal_pad, is_power_regulator, ComponentClass};
pub use diffpair::{detect_differential_pairs, DifferentialPair};
pub use paths::trace_signal_path;
pub use thermal::{detect_via_in_pad, thermal_vias_for, ThermalViaReport, ViaInPad};
pub use unified::{AnalysisResult, UnifiedAnalyzer};
