pub mod benchmark;
pub mod compare;
pub mod digest;
pub mod export;

pub use benchmark::run_benchmark;
pub use compare::run_compare;
pub use digest::run_digest;
pub use export::{ExportFormat, export_to_file, export_to_string};
