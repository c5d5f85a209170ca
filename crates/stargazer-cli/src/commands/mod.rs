pub mod config;
pub mod ingest;
pub mod mars;
pub mod status;

pub use ingest::run_ingest;
pub use mars::run_mars;
pub use status::show_status;
