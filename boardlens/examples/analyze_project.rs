//! Simple analysis example: analyze a KiCad project directory and print
//! the highlights.

use boardlens::prelude::*;
use std::path::Path;

fn main() -> Result<(), BoardLensError> {
    let dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures".to_string());

    if !Path::new(&dir).is_dir() {
        eprintln!("Directory not found: {}", dir);
        eprintln!("Usage: cargo run --example analyze_project [path/to/project]");
        std::process::exit(1);
    }

    let result = BoardLens::analyze_project(&dir, &AnalyzeOptions::default())?;

    println!("Analysis of: {}", result.project_path);
    println!(
        "  {} components, {} nets, {} traces, {} vias",
        result.summary.total_components,
        result.summary.total_nets,
        result.summary.total_traces,
        result.summary.total_vias,
    );

    println!("\nPower nets:");
    for net in result.power_nets.iter().take(5) {
        println!(
            "  {:<12} {} components, {:.2} mm routed",
            net.name, net.component_count, net.total_trace_length
        );
    }

    if !result.differential_pairs.is_empty() {
        println!("\nDifferential pairs:");
        for pair in &result.differential_pairs {
            println!(
                "  {:<12} {} / {}  mismatch {:.3} mm",
                pair.base_name, pair.positive_net, pair.negative_net, pair.length_mismatch
            );
        }
    }

    if result.summary.via_in_pad_count > 0 {
        println!("\nVia-in-pad findings:");
        for finding in &result.via_in_pad {
            println!(
                "  {} pad {} ({}): via at ({:.2}, {:.2})",
                finding.component,
                finding.pad,
                finding.pad_net,
                finding.via_position.x,
                finding.via_position.y,
            );
        }
    }

    Ok(())
}
