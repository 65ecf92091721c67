//! End-to-end stage orchestration.
//!
//! # Responsibility
//! - Chain layout, annotation, classification, linking and optional
//!   fine-graining over one grid.
//!
//! # Invariants
//! - Stages run in a fixed order; the first fatal error aborts the run.
//! - Every intermediate graph is returned unchanged by later stages.

use crate::annotate::{annotate_graph, AnnotationError, EntityAnnotator};
use crate::graph::layout::build_layout_graph;
use crate::graph::TimetableGraph;
use crate::model::grid::Grid;
use crate::semantics::classify::{classify_graph, ClassificationError};
use crate::semantics::fine_grain::{fine_grain, FineGrainError};
use crate::semantics::linking::{link_semantics, LinkDiagnostic, LinkOutcome};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Also split classified cells into entity nodes and link those.
    pub fine_grain: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { fine_grain: true }
    }
}

/// Any fatal stage failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Annotation(AnnotationError),
    Classification(ClassificationError),
    FineGrain(FineGrainError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Annotation(err) => write!(f, "annotation stage failed: {err}"),
            Self::Classification(err) => write!(f, "classification stage failed: {err}"),
            Self::FineGrain(err) => write!(f, "fine-grain stage failed: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Annotation(err) => Some(err),
            Self::Classification(err) => Some(err),
            Self::FineGrain(err) => Some(err),
        }
    }
}

impl From<AnnotationError> for PipelineError {
    fn from(value: AnnotationError) -> Self {
        Self::Annotation(value)
    }
}

impl From<ClassificationError> for PipelineError {
    fn from(value: ClassificationError) -> Self {
        Self::Classification(value)
    }
}

impl From<FineGrainError> for PipelineError {
    fn from(value: FineGrainError) -> Self {
        Self::FineGrain(value)
    }
}

/// Every graph produced by one run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub layout: TimetableGraph,
    pub annotated: TimetableGraph,
    pub classified: TimetableGraph,
    /// Classified graph with hierarchy edges.
    pub semantic: LinkOutcome,
    /// Fine-grained graph with hierarchy edges, when enabled.
    pub fine_grained: Option<LinkOutcome>,
}

impl PipelineOutput {
    pub fn diagnostics(&self) -> impl Iterator<Item = &LinkDiagnostic> + '_ {
        self.semantic.diagnostics.iter().chain(
            self.fine_grained
                .iter()
                .flat_map(|outcome| outcome.diagnostics.iter()),
        )
    }
}

/// Runs every stage over `grid`.
///
/// # Errors
/// Returns the first stage error; later stages are not attempted.
pub fn run_pipeline<A: EntityAnnotator + ?Sized>(
    grid: &Grid,
    annotator: &A,
    options: PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    let layout = build_layout_graph(grid);
    let annotated = annotate_graph(&layout, annotator)?;
    let classified = classify_graph(&annotated)?;
    let semantic = link_semantics(&classified);

    let fine_grained = if options.fine_grain {
        let split = fine_grain(&classified)?;
        Some(link_semantics(&split))
    } else {
        None
    };

    let output = PipelineOutput {
        layout,
        annotated,
        classified,
        semantic,
        fine_grained,
    };
    info!(
        "event=pipeline_done module=pipeline status=ok nodes={} hierarchy_edges={} fine_grained={} diagnostics={}",
        output.classified.node_count(),
        output.semantic.edges.len(),
        options.fine_grain,
        output.diagnostics().count()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{run_pipeline, PipelineError, PipelineOptions};
    use crate::annotate::lookup::LookupAnnotator;
    use crate::annotate::patterns::PatternAnnotator;
    use crate::model::entity::{EntityLabel, ExtractedEntity};
    use crate::model::grid::Grid;

    #[test]
    fn empty_grid_runs_clean_with_diagnostics() {
        let grid = Grid::new(0, 0);
        let output = run_pipeline(&grid, &PatternAnnotator::builtin(), PipelineOptions::default())
            .expect("empty grid is valid");
        assert!(output.classified.is_empty());
        assert_eq!(output.semantic.diagnostics.len(), 3);
        assert_eq!(output.diagnostics().count(), 6);
    }

    #[test]
    fn fine_grain_can_be_disabled() {
        let grid = Grid::from_rows(vec![vec![Some("2024"), Some("January")]]).expect("grid");
        let output = run_pipeline(
            &grid,
            &PatternAnnotator::builtin(),
            PipelineOptions { fine_grain: false },
        )
        .expect("pipeline succeeds");
        assert!(output.fine_grained.is_none());
        assert_eq!(output.semantic.edges.len(), 1);
    }

    #[test]
    fn annotation_failure_aborts_the_run() {
        let grid = Grid::from_rows(vec![vec![Some("x")]]).expect("grid");
        let err = run_pipeline(&grid, &InvalidSpans, PipelineOptions::default())
            .expect_err("invalid spans must abort");
        assert!(matches!(err, PipelineError::Annotation(_)));
    }

    #[test]
    fn lookup_annotations_drive_classification() {
        let mut lookup = LookupAnnotator::default();
        lookup.insert(
            "Mar",
            vec![ExtractedEntity::unchecked("Mar", EntityLabel::Date, 0, 3)],
        );
        let grid = Grid::from_rows(vec![vec![Some("1999"), Some("Mar")]]).expect("grid");
        let output = run_pipeline(&grid, &lookup, PipelineOptions::default())
            .expect("pipeline succeeds");
        assert_eq!(output.semantic.edges.len(), 1);
    }

    struct InvalidSpans;

    impl crate::annotate::EntityAnnotator for InvalidSpans {
        fn annotate(&self, text: &str) -> Vec<ExtractedEntity> {
            vec![ExtractedEntity::unchecked(text, EntityLabel::Event, 0, 10)]
        }
    }
}
