//! Core timetable analysis for timegrid.
//! Turns a spreadsheet-style grid into a layout graph, annotates and
//! classifies its cells, and links the `Year -> Month -> DayOfWeek -> Event`
//! hierarchy.

pub mod annotate;
pub mod config;
pub mod graph;
pub mod io;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod semantics;

pub use annotate::lookup::LookupAnnotator;
pub use annotate::patterns::PatternAnnotator;
pub use annotate::{annotate_graph, annotate_text, AnnotationError, EntityAnnotator};
pub use config::{Config, ConfigError};
pub use graph::layout::build_layout_graph;
pub use graph::{GraphError, NodeAttribute, TimetableGraph};
pub use logging::{default_log_level, init_logging, logging_status, LogSink};
pub use model::edge::{Direction, EdgeType, LayoutEdge};
pub use model::entity::{EntityLabel, EntitySpanError, ExtractedEntity};
pub use model::grid::{Grid, GridPosition};
pub use model::node::{LayoutNode, NodeId, NodeType, UnmappedLabelError};
pub use pipeline::{run_pipeline, PipelineError, PipelineOptions, PipelineOutput};
pub use semantics::classify::{classify_graph, classify_node, ClassificationError};
pub use semantics::fine_grain::{fine_grain, FineGrainError};
pub use semantics::linking::{link_semantics, LinkDiagnostic, LinkOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
