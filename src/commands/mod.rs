//! CLI commands implementation

pub mod catalog;
pub mod generate;
pub mod ingest;
pub mod init;
pub mod queries;
pub mod reindex;
pub mod status;
pub mod tables;

pub use catalog::*;
pub use generate::*;
pub use ingest::*;
pub use init::*;
pub use queries::*;
pub use reindex::*;
pub use status::*;
pub use tables::*;
