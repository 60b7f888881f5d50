//! The repository-wide call graph and the enrichment pass that derives it.

mod call_graph;
mod enrichment;

pub use call_graph::{CallGraph, CallGraphStatistics};
pub use enrichment::enrich;
