pub mod assembly;
pub mod csv_export;
pub mod model;

pub use assembly::{assemble, parse_sections};
pub use csv_export::{to_csv_string, write_csv};
pub use model::{PacketRow, ReportModel, ReportSection, SectionContent, SectionKey};
