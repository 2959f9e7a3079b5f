pub mod header_locator;
pub mod source;
pub mod table_parser;

pub use header_locator::{HeaderLocator, LaunchMetadata};
pub use source::{decode_lossy, read_sounding_text};
pub use table_parser::{ParsedTable, TableParser};
