//! BoardLens - KiCad PCB and schematic analysis library
//!
//! This library parses KiCad design files (`.kicad_pcb`, `.kicad_sch`),
//! resolves net connectivity, and produces a structured analysis report:
//! component classification, power/signal net summaries, trace and via
//! statistics, differential pairs, via-in-pad findings, thermal context
//! for power parts, and schematic-vs-PCB cross-reference.
//!
//! # Quick Start
//!
//! ```no_run
//! use boardlens::{AnalyzeOptions, BoardLens};
//!
//! let result = BoardLens::analyze_project("my_project", &AnalyzeOptions::default()).unwrap();
//!
//! println!(
//!     "{} components on {} nets, {} via-in-pad findings",
//!     result.summary.total_components,
//!     result.summary.total_nets,
//!     result.summary.via_in_pad_count,
//! );
//! ```
//!
//! # Features
//!
//! - **PCB extraction**: layers, nets, footprints, traces, vias, zones
//! - **Connectivity**: net-to-component index with signal-path tracing
//! - **Schematic extraction**: symbols, labels, power symbols, global nets
//! - **Analysis**: DFM geometry checks, differential pairs, thermal review

pub mod analyzer;
pub mod core;
pub mod parser;
pub mod source;

// Re-export main types
pub use analyzer::unified::{AnalysisResult, UnifiedAnalyzer};
pub use core::{AnalyzeOptions, BoardLens, BoardLensError};
pub use parser::pcb::PcbParser;
pub use parser::pcb_schema::PcbDesign;
pub use parser::schema::Schematic;
pub use parser::schematic::SchematicParser;
pub use source::{FsSource, MemorySource, ProjectSource};

/// Parse a PCB document from text (convenience wrapper).
pub fn parse_pcb(content: &str, filename: &str) -> Result<PcbDesign, BoardLensError> {
    PcbParser::parse_content(content, filename).map_err(Into::into)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisResult, AnalyzeOptions, BoardLens, BoardLensError, PcbDesign, Schematic,
        UnifiedAnalyzer,
    };
}
