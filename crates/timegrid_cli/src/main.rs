//! timegrid - timetable grid analysis CLI.
//!
//! # Responsibility
//! - Expose each core stage as a subcommand over CSV and node-link JSON files.
//! - Resolve configuration (file, then flags) and start logging once.
//!
//! Usage:
//!   timegrid layout -i sheet.csv -o layout.json
//!   timegrid annotate -i layout.json -o annotated.json [--annotations ents.json]
//!   timegrid classify -i annotated.json -o classified.json
//!   timegrid fine-grain -i classified.json -o fine.json [--drop-other]
//!   timegrid link -i classified.json -o semantic.json
//!   timegrid run -i sheet.csv --out-dir out/
//!   timegrid annotation-input -i sheet.csv [-o texts.txt]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use timegrid_core::io::graph_store::{load_graph, save_graph};
use timegrid_core::io::timetable::{load_grid_csv, write_annotation_input};
use timegrid_core::{
    annotate_graph, build_layout_graph, classify_graph, fine_grain, init_logging, link_semantics,
    run_pipeline, Config, EntityAnnotator, Grid, LinkDiagnostic, LookupAnnotator, NodeType,
    PipelineOutput,
};

#[derive(Parser, Debug)]
#[command(name = "timegrid", version, about = "Timetable grid to semantic graph")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write rotating log files here instead of stderr.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the layout graph from a timetable CSV.
    Layout {
        #[command(flatten)]
        sheet: SheetArgs,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Attach extracted entities to every node.
    Annotate {
        #[command(flatten)]
        io: GraphIo,
        #[command(flatten)]
        annotator: AnnotatorArgs,
    },
    /// Assign Year, Month, DayOfWeek or Event to every node.
    Classify {
        #[command(flatten)]
        io: GraphIo,
    },
    /// Split classified cells into one node per entity.
    FineGrain {
        #[command(flatten)]
        io: GraphIo,
        /// Drop `Other` nodes (filler tokens) from the split graph.
        #[arg(long)]
        drop_other: bool,
    },
    /// Add Year -> Month -> DayOfWeek -> Event hierarchy edges.
    Link {
        #[command(flatten)]
        io: GraphIo,
    },
    /// Run every stage and write each graph into a directory.
    Run {
        #[command(flatten)]
        sheet: SheetArgs,
        #[command(flatten)]
        annotator: AnnotatorArgs,
        #[arg(long)]
        out_dir: PathBuf,
        /// Skip the fine-grained graph.
        #[arg(long)]
        no_fine_grain: bool,
    },
    /// List unique cell texts, one per line, for external annotation.
    AnnotationInput {
        #[command(flatten)]
        sheet: SheetArgs,
        /// Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct SheetArgs {
    /// Headerless timetable CSV.
    #[arg(short, long)]
    input: PathBuf,
    /// Treat columns as rows.
    #[arg(long)]
    transpose: bool,
}

#[derive(Args, Debug)]
struct GraphIo {
    /// Node-link JSON input graph.
    #[arg(short, long)]
    input: PathBuf,
    /// Node-link JSON output graph.
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct AnnotatorArgs {
    /// JSON object mapping cell text to entity lists; replaces the pattern annotator.
    #[arg(long)]
    annotations: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };

    start_logging(&cli, &config)?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        timegrid_core::core_version()
    );

    match cli.command {
        Commands::Layout { sheet, output } => {
            let grid = read_sheet(&sheet, &config)?;
            write_graph_file(&output, &build_layout_graph(&grid))
        }
        Commands::Annotate { io, annotator } => {
            let annotator = build_annotator(&annotator, &config)?;
            let graph = read_graph_file(&io.input)?;
            let annotated = annotate_graph(&graph, annotator.as_ref())
                .context("Annotation failed")?;
            write_graph_file(&io.output, &annotated)
        }
        Commands::Classify { io } => {
            let graph = read_graph_file(&io.input)?;
            let classified = classify_graph(&graph).context("Classification failed")?;
            write_graph_file(&io.output, &classified)
        }
        Commands::FineGrain { io, drop_other } => {
            let graph = read_graph_file(&io.input)?;
            let mut split = fine_grain(&graph).context("Fine-graining failed")?;
            if drop_other {
                let before = split.node_count();
                split = split.without_nodes_of_type(NodeType::Other);
                info!(
                    "event=other_nodes_dropped module=cli status=ok removed={}",
                    before - split.node_count()
                );
            }
            write_graph_file(&io.output, &split)
        }
        Commands::Link { io } => {
            let graph = read_graph_file(&io.input)?;
            let outcome = link_semantics(&graph);
            report_diagnostics(&outcome.diagnostics);
            write_graph_file(&io.output, &outcome.graph)
        }
        Commands::Run {
            sheet,
            annotator,
            out_dir,
            no_fine_grain,
        } => {
            let grid = read_sheet(&sheet, &config)?;
            let annotator = build_annotator(&annotator, &config)?;
            let mut options = config.pipeline.options();
            if no_fine_grain {
                options.fine_grain = false;
            }

            let output =
                run_pipeline(&grid, annotator.as_ref(), options).context("Pipeline failed")?;

            write_run_outputs(&out_dir, &output)?;
            let diagnostics: Vec<LinkDiagnostic> = output.diagnostics().cloned().collect();
            report_diagnostics(&diagnostics);
            println!(
                "{} nodes, {} hierarchy edges written to {}",
                output.classified.node_count(),
                output.semantic.edges.len(),
                out_dir.display()
            );
            Ok(())
        }
        Commands::AnnotationInput { sheet, output } => {
            let grid = read_sheet(&sheet, &config)?;
            let written = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_annotation_input(BufWriter::new(file), &grid)?
                }
                None => write_annotation_input(io::stdout().lock(), &grid)?,
            };
            eprintln!("{written} unique cell texts");
            Ok(())
        }
    }
}

fn start_logging(cli: &Cli, config: &Config) -> Result<()> {
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let dir = match cli.log_dir.clone().or_else(|| config.logging.dir.clone()) {
        Some(dir) => Some(absolute_path(dir)?),
        None => None,
    };
    let dir_str = dir.as_deref().map(utf8_dir).transpose()?;
    init_logging(&level, dir_str).map_err(anyhow::Error::msg)
}

fn utf8_dir(dir: &Path) -> Result<&str> {
    dir.to_str()
        .with_context(|| format!("Log directory is not valid UTF-8: {}", dir.display()))
}

// Logging only accepts absolute directories.
fn absolute_path(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .context("Failed to determine current directory")?
        .join(path))
}

fn read_sheet(sheet: &SheetArgs, config: &Config) -> Result<Grid> {
    let mut options = config.timetable.csv_options();
    if sheet.transpose {
        options.transpose = true;
    }
    load_grid_csv(&sheet.input, options)
        .with_context(|| format!("Failed to read timetable: {}", sheet.input.display()))
}

fn build_annotator(args: &AnnotatorArgs, config: &Config) -> Result<Box<dyn EntityAnnotator>> {
    match &args.annotations {
        Some(path) => {
            let lookup = LookupAnnotator::load(path)
                .with_context(|| format!("Failed to load annotations: {}", path.display()))?;
            info!(
                "event=annotator_selected module=cli status=ok kind=lookup entries={}",
                lookup.len()
            );
            Ok(Box::new(lookup))
        }
        None => {
            let patterns = config
                .annotator
                .build()
                .context("Invalid annotator vocabulary")?;
            info!("event=annotator_selected module=cli status=ok kind=patterns");
            Ok(Box::new(patterns))
        }
    }
}

fn read_graph_file(path: &Path) -> Result<timegrid_core::TimetableGraph> {
    load_graph(path).with_context(|| format!("Failed to read graph: {}", path.display()))
}

fn write_graph_file(path: &Path, graph: &timegrid_core::TimetableGraph) -> Result<()> {
    save_graph(path, graph).with_context(|| format!("Failed to write graph: {}", path.display()))
}

// One file per stage graph.
fn write_run_outputs(out_dir: &Path, output: &PipelineOutput) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    write_graph_file(&out_dir.join("layout.json"), &output.layout)?;
    write_graph_file(&out_dir.join("annotated.json"), &output.annotated)?;
    write_graph_file(&out_dir.join("classified.json"), &output.classified)?;
    write_graph_file(&out_dir.join("semantic.json"), &output.semantic.graph)?;
    if let Some(fine) = &output.fine_grained {
        write_graph_file(&out_dir.join("fine_grained.json"), &fine.graph)?;
    }
    Ok(())
}

fn report_diagnostics(diagnostics: &[LinkDiagnostic]) {
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    for diagnostic in diagnostics {
        warn!("event=link_diagnostic module=cli status=warn detail=\"{diagnostic}\"");
        let _ = writeln!(handle, "warning: {diagnostic}");
    }
}

#[cfg(test)]
mod tests {
    use super::{absolute_path, utf8_dir, write_run_outputs, Cli, Commands};
    use clap::Parser;
    use std::path::{Path, PathBuf};
    use timegrid_core::io::graph_store::load_graph;
    use timegrid_core::{run_pipeline, Grid, PatternAnnotator, PipelineOptions};

    #[test]
    fn run_writes_every_stage_graph() {
        let grid = Grid::from_rows(vec![vec![Some("2024"), Some("January")]]).expect("grid");
        let output = run_pipeline(&grid, &PatternAnnotator::builtin(), PipelineOptions::default())
            .expect("pipeline succeeds");
        let dir = tempfile::tempdir().expect("tempdir");
        let out_dir = dir.path().join("out");

        write_run_outputs(&out_dir, &output).expect("outputs written");

        let annotated = load_graph(&out_dir.join("annotated.json")).expect("annotated graph");
        assert_eq!(annotated.node_count(), output.annotated.node_count());
        assert!(annotated
            .nodes()
            .all(|(_, node)| node.entities.is_some() && node.node_type.is_none()));
        for name in ["layout.json", "classified.json", "semantic.json", "fine_grained.json"] {
            assert!(out_dir.join(name).is_file(), "{name}");
        }
    }

    #[test]
    fn run_without_fine_grain_skips_that_file() {
        let grid = Grid::from_rows(vec![vec![Some("2024")]]).expect("grid");
        let output = run_pipeline(
            &grid,
            &PatternAnnotator::builtin(),
            PipelineOptions { fine_grain: false },
        )
        .expect("pipeline succeeds");
        let dir = tempfile::tempdir().expect("tempdir");

        write_run_outputs(dir.path(), &output).expect("outputs written");

        assert!(dir.path().join("annotated.json").is_file());
        assert!(!dir.path().join("fine_grained.json").exists());
    }

    #[test]
    fn run_accepts_stage_flags() {
        let cli = Cli::try_parse_from([
            "timegrid",
            "--log-level",
            "debug",
            "run",
            "-i",
            "sheet.csv",
            "--transpose",
            "--out-dir",
            "out",
            "--no-fine-grain",
        ])
        .expect("valid arguments");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Run {
                sheet,
                annotator,
                out_dir,
                no_fine_grain,
            } => {
                assert_eq!(sheet.input, PathBuf::from("sheet.csv"));
                assert!(sheet.transpose);
                assert!(annotator.annotations.is_none());
                assert_eq!(out_dir, PathBuf::from("out"));
                assert!(no_fine_grain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fine_grain_drop_other_defaults_off() {
        let cli = Cli::try_parse_from(["timegrid", "fine-grain", "-i", "a.json", "-o", "b.json"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::FineGrain {
                drop_other: false,
                ..
            }
        ));

        let cli = Cli::try_parse_from([
            "timegrid",
            "fine-grain",
            "-i",
            "a.json",
            "-o",
            "b.json",
            "--drop-other",
        ])
        .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Commands::FineGrain {
                drop_other: true,
                ..
            }
        ));
    }

    #[test]
    fn graph_commands_require_output() {
        let err = Cli::try_parse_from(["timegrid", "classify", "-i", "a.json"])
            .expect_err("missing --output");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn global_log_dir_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "timegrid",
            "annotation-input",
            "-i",
            "sheet.csv",
            "--log-dir",
            "/tmp/timegrid-logs",
        ])
        .expect("valid arguments");
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/timegrid-logs")));
        assert!(matches!(
            cli.command,
            Commands::AnnotationInput { output: None, .. }
        ));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let absolute = absolute_path(PathBuf::from("logs")).expect("current dir");
        assert!(absolute.is_absolute());
        assert!(absolute.ends_with("logs"));

        let already = PathBuf::from("/var/log/timegrid");
        assert_eq!(absolute_path(already.clone()).expect("absolute"), already);
    }

    #[test]
    fn utf8_log_dir_passes_through() {
        assert_eq!(
            utf8_dir(Path::new("/var/log/timegrid")).expect("utf-8"),
            "/var/log/timegrid"
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_log_dir_is_an_error() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = Path::new(OsStr::from_bytes(b"/tmp/logs-\xff"));
        let err = utf8_dir(dir).expect_err("invalid utf-8 must fail");
        assert!(err.to_string().contains("not valid UTF-8"));
    }
}
