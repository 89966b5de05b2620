pub mod analysis;
pub mod core;
pub mod filter;
pub mod network;
pub mod report;
pub mod setup_logger;
pub mod storage;

pub use crate::analysis::{aggregate, build_graph, build_graphs, AddressDomain, Statistics};
pub use crate::core::{AnalysisError, AnalysisPipeline, AnalysisResult, Configuration};
pub use crate::filter::{filter, FilterRequest, PredicateSet};
pub use crate::network::packet::PacketRecord;
pub use crate::network::vendor::resolve_vendor;
pub use crate::report::{assemble, ReportModel, SectionKey};
