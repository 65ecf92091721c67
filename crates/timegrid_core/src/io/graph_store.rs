//! Graph persistence between pipeline stages (node-link JSON files).

use crate::graph::node_link::{from_node_link, to_node_link, NodeLinkData};
use crate::graph::{GraphError, TimetableGraph};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[derive(Debug)]
pub enum GraphStoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Graph(GraphError),
}

impl Display for GraphStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "graph file io failed: {err}"),
            Self::Json(err) => write!(f, "invalid node-link document: {err}"),
            Self::Graph(err) => write!(f, "inconsistent node-link document: {err}"),
        }
    }
}

impl Error for GraphStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Graph(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for GraphStoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for GraphStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<GraphError> for GraphStoreError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

pub fn write_graph<W: Write>(mut writer: W, graph: &TimetableGraph) -> Result<(), GraphStoreError> {
    serde_json::to_writer(&mut writer, &to_node_link(graph))?;
    writer.flush()?;
    Ok(())
}

pub fn read_graph<R: Read>(reader: R) -> Result<TimetableGraph, GraphStoreError> {
    let data: NodeLinkData = serde_json::from_reader(reader)?;
    Ok(from_node_link(data)?)
}

pub fn save_graph(path: &Path, graph: &TimetableGraph) -> Result<(), GraphStoreError> {
    let file = File::create(path)?;
    write_graph(BufWriter::new(file), graph)?;
    info!(
        "event=graph_saved module=io status=ok path={} nodes={} edges={}",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(())
}

pub fn load_graph(path: &Path) -> Result<TimetableGraph, GraphStoreError> {
    let file = File::open(path)?;
    let graph = read_graph(BufReader::new(file))?;
    info!(
        "event=graph_loaded module=io status=ok path={} nodes={} edges={}",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}
