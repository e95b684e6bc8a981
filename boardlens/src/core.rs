//! Core analysis API shared by the library surface and the CLI.
//! No CLI or output-format dependencies.

use crate::analyzer::unified::{AnalysisResult, UnifiedAnalyzer};
use crate::source::{FsSource, ProjectSource};

#[derive(Debug, thiserror::Error)]
pub enum BoardLensError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No .kicad_pcb file found in project directory")]
    NoPcbFile,
    #[error("{0}")]
    Other(String),
}

impl From<crate::parser::pcb::PcbParseError> for BoardLensError {
    fn from(e: crate::parser::pcb::PcbParseError) -> Self {
        BoardLensError::Parse(e.to_string())
    }
}

impl From<crate::parser::schematic::SchematicParseError> for BoardLensError {
    fn from(e: crate::parser::schematic::SchematicParseError) -> Self {
        BoardLensError::Parse(e.to_string())
    }
}

/// Options for analysis runs (CLI or embedding).
#[derive(Clone, Debug, Default)]
pub struct AnalyzeOptions {
    /// Include the full parsed PCB/schematic dump in the result.
    pub include_raw_data: bool,
}

/// Entry points used by both the CLI and library callers.
pub struct BoardLens;

impl BoardLens {
    /// Analyze a KiCad project directory on disk.
    pub fn analyze_project(
        dir: &str,
        options: &AnalyzeOptions,
    ) -> Result<AnalysisResult, BoardLensError> {
        Self::analyze_with_source(&FsSource, dir, options)
    }

    /// Analyze through any [`ProjectSource`].
    pub fn analyze_with_source(
        source: &dyn ProjectSource,
        dir: &str,
        options: &AnalyzeOptions,
    ) -> Result<AnalysisResult, BoardLensError> {
        let analyzer = UnifiedAnalyzer::analyze_project(source, dir)?;
        Ok(analyzer.build_result(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn test_missing_pcb_is_fatal() {
        let mut source = MemorySource::new();
        source.insert("main.kicad_sch", "(kicad_sch)");
        let err = BoardLens::analyze_with_source(&source, "proj", &AnalyzeOptions::default());
        assert!(matches!(err, Err(BoardLensError::NoPcbFile)));
    }

    #[test]
    fn test_parse_errors_convert() {
        let mut source = MemorySource::new();
        source.insert("board.kicad_pcb", "(segment");
        let err = BoardLens::analyze_with_source(&source, "proj", &AnalyzeOptions::default());
        assert!(matches!(err, Err(BoardLensError::Parse(_))));
    }

    #[test]
    fn test_pcb_only_project_analyzes() {
        let mut source = MemorySource::new();
        source.insert(
            "board.kicad_pcb",
            "(kicad_pcb (net 1 \"GND\") (via (at 0 0) (size 0.6) (drill 0.3) (net 1)))",
        );
        let result =
            BoardLens::analyze_with_source(&source, "proj", &AnalyzeOptions::default()).unwrap();
        assert_eq!(result.summary.total_vias, 1);
        assert_eq!(result.summary.schematic_sheets, 0);
    }
}
