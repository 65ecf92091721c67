//! Entity annotation boundary.
//!
//! # Responsibility
//! - Define the injected `EntityAnnotator` capability.
//! - Enforce the producer contract on annotator output before it reaches
//!   graph nodes.
//! - Attach entity lists to every node of a graph as one batch.
//!
//! # Invariants
//! - Every accepted span reproduces its text inside the parent cell.
//! - Spans are ordered by `start_char` and do not overlap.
//! - `Remove` spans never reach graph nodes.
//! - Annotating clears any stale `node_type`; classification must run again.

pub mod lookup;
pub mod patterns;

use crate::graph::{NodeAttribute, TimetableGraph};
use crate::model::entity::{EntityLabel, EntitySpanError, ExtractedEntity};
use crate::model::node::{LayoutNode, NodeId};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maps raw cell text to typed entity spans.
pub trait EntityAnnotator {
    fn annotate(&self, text: &str) -> Vec<ExtractedEntity>;
}

impl<A: EntityAnnotator + ?Sized> EntityAnnotator for &A {
    fn annotate(&self, text: &str) -> Vec<ExtractedEntity> {
        (**self).annotate(text)
    }
}

impl<A: EntityAnnotator + ?Sized> EntityAnnotator for Box<A> {
    fn annotate(&self, text: &str) -> Vec<ExtractedEntity> {
        (**self).annotate(text)
    }
}

/// Annotator output that violates the producer contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    /// Span offsets do not reproduce the entity text.
    Span {
        node: Option<NodeId>,
        source: EntitySpanError,
    },
    /// A span covers no characters.
    EmptySpan {
        node: Option<NodeId>,
        text: String,
        entity: ExtractedEntity,
    },
    /// Spans are out of order or overlap.
    Overlap {
        node: Option<NodeId>,
        text: String,
        previous: ExtractedEntity,
        next: ExtractedEntity,
    },
}

impl AnnotationError {
    fn at(self, id: NodeId) -> Self {
        match self {
            Self::Span { source, .. } => Self::Span {
                node: Some(id),
                source,
            },
            Self::EmptySpan { text, entity, .. } => Self::EmptySpan {
                node: Some(id),
                text,
                entity,
            },
            Self::Overlap {
                text,
                previous,
                next,
                ..
            } => Self::Overlap {
                node: Some(id),
                text,
                previous,
                next,
            },
        }
    }
}

impl Display for AnnotationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Span { node, source } => match node {
                Some(id) => write!(f, "node {id}: {source}"),
                None => write!(f, "{source}"),
            },
            Self::EmptySpan { node, text, entity } => {
                if let Some(id) = node {
                    write!(f, "node {id}: ")?;
                }
                write!(
                    f,
                    "empty {} span at {} in `{text}`",
                    entity.label, entity.start_char
                )
            }
            Self::Overlap {
                node,
                text,
                previous,
                next,
            } => {
                if let Some(id) = node {
                    write!(f, "node {id}: ")?;
                }
                write!(
                    f,
                    "entity `{}` [{}, {}) overlaps or precedes `{}` [{}, {}) in `{text}`",
                    next.text,
                    next.start_char,
                    next.end_char,
                    previous.text,
                    previous.start_char,
                    previous.end_char
                )
            }
        }
    }
}

impl Error for AnnotationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Span { source, .. } => Some(source),
            Self::EmptySpan { .. } | Self::Overlap { .. } => None,
        }
    }
}

/// Runs `annotator` on `text` and enforces the producer contract.
///
/// # Errors
/// - `AnnotationError::Span` when any span fails validation.
/// - `AnnotationError::EmptySpan` when a span covers no characters.
/// - `AnnotationError::Overlap` when spans are unordered or overlapping.
pub fn annotate_text<A: EntityAnnotator + ?Sized>(
    annotator: &A,
    text: &str,
) -> Result<Vec<ExtractedEntity>, AnnotationError> {
    let entities = annotator.annotate(text);

    let mut previous: Option<&ExtractedEntity> = None;
    for entity in &entities {
        entity.validate(text).map_err(|source| AnnotationError::Span {
            node: None,
            source,
        })?;
        if entity.start_char >= entity.end_char {
            return Err(AnnotationError::EmptySpan {
                node: None,
                text: text.to_string(),
                entity: entity.clone(),
            });
        }
        if let Some(prev) = previous {
            if entity.start_char < prev.end_char {
                return Err(AnnotationError::Overlap {
                    node: None,
                    text: text.to_string(),
                    previous: prev.clone(),
                    next: entity.clone(),
                });
            }
        }
        previous = Some(entity);
    }

    Ok(entities
        .into_iter()
        .filter(|entity| entity.label != EntityLabel::Remove)
        .collect())
}

/// Returns a copy of `graph` with `entities` set on every node.
///
/// The whole batch is annotated before the new graph is returned. Any
/// `node_type` left from an earlier classification is cleared.
pub fn annotate_graph<A: EntityAnnotator + ?Sized>(
    graph: &TimetableGraph,
    annotator: &A,
) -> Result<TimetableGraph, AnnotationError> {
    let mut entity_total = 0usize;
    let unclassified = graph.without_attribute(NodeAttribute::NodeType);
    let annotated = unclassified.try_map_nodes(|id, node| -> Result<LayoutNode, AnnotationError> {
        let entities = annotate_text(annotator, &node.raw_text).map_err(|err| err.at(*id))?;
        entity_total += entities.len();
        let mut next: LayoutNode = node.clone();
        next.entities = Some(entities);
        Ok(next)
    })?;

    info!(
        "event=graph_annotated module=annotate status=ok nodes={} entities={}",
        annotated.node_count(),
        entity_total
    );
    if let Some((id, node)) = annotated
        .nodes()
        .find(|(_, node)| node.entities.as_ref().is_some_and(|e| !e.is_empty()))
    {
        debug!(
            "event=annotation_example module=annotate node={} text={:?} entities={:?}",
            id, node.raw_text, node.entities
        );
    }

    Ok(annotated)
}
