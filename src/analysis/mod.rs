pub mod graph;
pub mod histogram;
pub mod ranking;
pub mod statistics;

pub use graph::{build_graph, build_graph_with, build_graphs, AddressDomain, CommunicationGraph, Graphs};
pub use histogram::ChartSeries;
pub use ranking::{CountEntry, CHART_TOP_N, TABLE_TOP_N};
pub use statistics::{aggregate, Statistics};
