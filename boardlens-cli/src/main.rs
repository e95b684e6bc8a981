//! BoardLens CLI - KiCad PCB and schematic analysis from the command line.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use boardlens::analyzer::unified::{AnalysisResult, UnifiedAnalyzer, DEFAULT_VIA_SEARCH_RADIUS};
use boardlens::{AnalyzeOptions, FsSource};

#[derive(Parser)]
#[command(name = "boardlens")]
#[command(about = "KiCad PCB and schematic analysis tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project directory and write structured JSON reports
    Analyze {
        /// Path to the KiCad project directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Output directory for the analysis files
        #[arg(short, long, value_name = "DIR", default_value = "./analysis")]
        output: PathBuf,

        /// Include raw parsed data in full.json
        #[arg(long)]
        raw: bool,

        /// Print a human-readable summary to the console
        #[arg(short, long)]
        summary: bool,

        /// Suppress console output
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the components connected to a net
    Net {
        /// Path to the KiCad project directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Net name, e.g. GND or USB_D+
        #[arg(value_name = "NET")]
        net: String,
    },

    /// Trace the shortest signal path between two components
    Path {
        /// Path to the KiCad project directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Starting reference designator, e.g. U1
        #[arg(value_name = "FROM")]
        from: String,

        /// Ending reference designator, e.g. J2
        #[arg(value_name = "TO")]
        to: String,
    },

    /// List vias near a component
    Vias {
        /// Path to the KiCad project directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Reference designator, e.g. U3
        #[arg(value_name = "REF")]
        reference: String,

        /// Search radius in mm
        #[arg(long, default_value_t = DEFAULT_VIA_SEARCH_RADIUS)]
        radius: f64,
    },
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Analyze {
            dir,
            output,
            raw,
            summary,
            quiet,
        } => handle_analyze(&dir, &output, raw, summary, quiet),
        Commands::Net { dir, net } => handle_net(&dir, &net),
        Commands::Path { dir, from, to } => handle_path(&dir, &from, &to),
        Commands::Vias {
            dir,
            reference,
            radius,
        } => handle_vias(&dir, &reference, radius),
    };

    process::exit(exit_code);
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_analyzer(dir: &PathBuf) -> Result<UnifiedAnalyzer, i32> {
    UnifiedAnalyzer::analyze_project(&FsSource, &dir.to_string_lossy()).map_err(|e| {
        eprintln!("Error: {}", e);
        1
    })
}

fn handle_analyze(dir: &PathBuf, output: &PathBuf, raw: bool, summary: bool, quiet: bool) -> i32 {
    if !quiet {
        println!("Analyzing KiCad project: {}", dir.display());
    }

    let analyzer = match load_analyzer(dir) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let result = analyzer.build_result(&AnalyzeOptions {
        include_raw_data: raw,
    });

    if summary && !quiet {
        print_summary(&result);
    }

    match write_analysis_files(output, &result) {
        Ok(files) => {
            if !quiet {
                println!("Analysis written to: {}/", output.display());
                for name in files {
                    println!("  - {}", name);
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_net(dir: &PathBuf, net: &str) -> i32 {
    let analyzer = match load_analyzer(dir) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match analyzer.components_on_net(net) {
        Some(components) => {
            println!("Net {} ({} components):", net, components.len());
            for component in components {
                println!("  {}", component);
            }
            0
        }
        None => {
            eprintln!("Error: net {:?} not found", net);
            1
        }
    }
}

fn handle_path(dir: &PathBuf, from: &str, to: &str) -> i32 {
    let analyzer = match load_analyzer(dir) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match analyzer.trace_path(from, to) {
        Some(path) => {
            println!("{}", path.join(" -> "));
            0
        }
        None => {
            eprintln!("Error: no path from {} to {}", from, to);
            1
        }
    }
}

fn handle_vias(dir: &PathBuf, reference: &str, radius: f64) -> i32 {
    let analyzer = match load_analyzer(dir) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let report = analyzer.thermal_vias(reference, radius);
    println!(
        "{} vias within {} mm of {}:",
        report.count, report.search_radius, reference
    );
    for via in &report.vias {
        println!("  {:.3} mm  drill {:.3}  net {}", via.distance, via.drill, via.net);
    }
    if !report.by_net.is_empty() {
        println!("By net:");
        for (net, count) in &report.by_net {
            println!("  {}: {}", net, count);
        }
    }
    0
}

/// Split the full report into the focused JSON files review tooling
/// consumes, plus full.json with everything.
fn write_analysis_files(
    output: &PathBuf,
    result: &AnalysisResult,
) -> Result<Vec<&'static str>, std::io::Error> {
    use serde_json::json;

    std::fs::create_dir_all(output)?;

    let by_type_counts: serde_json::Map<String, serde_json::Value> = result
        .components
        .by_type
        .iter()
        .map(|(class, comps)| (class.to_string(), json!(comps.len())))
        .collect();

    let files: Vec<(&'static str, serde_json::Value)> = vec![
        (
            "summary.json",
            json!({
                "projectPath": result.project_path,
                "timestamp": result.timestamp,
                "overview": result.summary,
                "layerStackup": result.layer_stackup,
            }),
        ),
        (
            "power.json",
            json!({
                "projectPath": result.project_path,
                "powerNets": result.power_nets,
                "layerStackup": {
                    "zones": result.layer_stackup.zones,
                    "zoneLayers": result.layer_stackup.zone_layers,
                },
                "decouplingCaps": result.components.by_type
                    .get(&boardlens::analyzer::ComponentClass::Capacitor)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
                "regulators": result.components.by_type
                    .get(&boardlens::analyzer::ComponentClass::IcPower)
                    .map(Vec::as_slice)
                    .unwrap_or_default(),
                "thermalAnalysis": result.thermal_analysis,
            }),
        ),
        (
            "signals.json",
            json!({
                "projectPath": result.project_path,
                "differentialPairs": result.differential_pairs,
                "traceStats": result.trace_stats,
                "viaStats": result.via_stats,
                "layerStackup": {
                    "copperLayers": result.layer_stackup.copper_layers,
                    "routedLayers": result.layer_stackup.routed_layers,
                    "layerUsage": result.layer_stackup.layer_usage,
                    "zones": result.layer_stackup.zones,
                },
                "signalNets": result.signal_nets,
            }),
        ),
        (
            "components.json",
            json!({
                "projectPath": result.project_path,
                "summary": {
                    "total": result.summary.total_components,
                    "byType": by_type_counts,
                },
                "components": result.components,
                "crossReference": result.cross_reference,
            }),
        ),
        (
            "dfm.json",
            json!({
                "projectPath": result.project_path,
                "traceStats": result.trace_stats,
                "viaStats": result.via_stats,
                "viaInPad": result.via_in_pad,
                "layerStackup": result.layer_stackup,
                "summary": {
                    "totalTraces": result.summary.total_traces,
                    "totalVias": result.summary.total_vias,
                    "viaInPadCount": result.summary.via_in_pad_count,
                    "copperLayers": result.summary.copper_layers,
                },
            }),
        ),
        ("full.json", serde_json::to_value(result)?),
    ];

    let mut names = Vec::with_capacity(files.len());
    for (name, data) in files {
        let path = output.join(name);
        std::fs::write(path, serde_json::to_string_pretty(&data)?)?;
        names.push(name);
    }

    Ok(names)
}

fn print_summary(result: &AnalysisResult) {
    let sep = "=".repeat(70);
    let sep2 = "-".repeat(70);

    println!("\n{}", sep);
    println!("PCB ANALYSIS SUMMARY");
    println!("{}", sep);

    println!("\nProject: {}", result.project_path);
    println!("Analyzed: {}", result.timestamp);

    println!("\n{}", sep2);
    println!("OVERVIEW");
    println!("{}", sep2);
    println!("  Components:       {}", result.summary.total_components);
    println!("  Nets:             {}", result.summary.total_nets);
    println!("  Traces:           {}", result.summary.total_traces);
    println!("  Vias:             {}", result.summary.total_vias);
    println!("  Via-in-pad:       {}", result.summary.via_in_pad_count);
    println!("  Copper Layers:    {}", result.summary.copper_layers);
    println!("  Schematic Sheets: {}", result.summary.schematic_sheets);

    println!("\n{}", sep2);
    println!("COMPONENTS BY TYPE");
    println!("{}", sep2);
    for (class, components) in &result.components.by_type {
        println!("  {:<20} {}", class.to_string(), components.len());
    }

    println!("\n{}", sep2);
    println!("POWER NETS");
    println!("{}", sep2);
    for net in result.power_nets.iter().take(10) {
        println!(
            "  {:<15} {} components, {} vias",
            net.name, net.component_count, net.via_count
        );
    }
    if result.power_nets.len() > 10 {
        println!("  ... and {} more", result.power_nets.len() - 10);
    }

    println!("\n{}", sep2);
    println!("LAYER STACKUP");
    println!("{}", sep2);
    println!("  Copper layers: {}", result.layer_stackup.copper_layers.join(", "));
    println!("  Routed layers: {}", result.layer_stackup.routed_layers.join(", "));
    if !result.layer_stackup.zone_layers.is_empty() {
        println!("  Zone layers:   {}", result.layer_stackup.zone_layers.join(", "));
    }

    println!("\n{}", sep2);
    println!("TRACE STATISTICS");
    println!("{}", sep2);
    println!("  Total segments:  {}", result.trace_stats.total_segments);
    println!("  Total length:    {:.2} mm", result.trace_stats.total_length);
    println!(
        "  Width range:     {:.3} - {:.3} mm",
        result.trace_stats.min_width, result.trace_stats.max_width
    );

    println!("\n{}", sep2);
    println!("VIA STATISTICS");
    println!("{}", sep2);
    println!("  Total vias:      {}", result.via_stats.total_count);
    println!(
        "  Drill range:     {:.3} - {:.3} mm",
        result.via_stats.min_drill, result.via_stats.max_drill
    );

    if !result.differential_pairs.is_empty() {
        println!("\n{}", sep2);
        println!("DIFFERENTIAL PAIRS");
        println!("{}", sep2);
        for pair in result.differential_pairs.iter().take(10) {
            println!(
                "  {:<20} mismatch: {:.3} mm",
                pair.base_name, pair.length_mismatch
            );
        }
        if result.differential_pairs.len() > 10 {
            println!("  ... and {} more", result.differential_pairs.len() - 10);
        }
    }

    println!("\n{}", sep2);
    println!("CROSS-REFERENCE");
    println!("{}", sep2);
    println!("  Matched:            {}", result.cross_reference.matched);
    println!("  Schematic only:     {}", result.cross_reference.schematic_only.len());
    println!("  PCB only:           {}", result.cross_reference.pcb_only.len());
    println!("  Value mismatches:   {}", result.cross_reference.value_mismatches.len());
    println!("  Footprint mismatch: {}", result.cross_reference.footprint_mismatches.len());

    println!("\n{}\n", sep);
}
