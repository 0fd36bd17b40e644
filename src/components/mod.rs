//! UI components.

/// Link-analysis graph component.
pub mod link_graph;
