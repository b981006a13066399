pub mod cli;
pub mod config;
pub mod context;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod executor;
pub mod models;
pub mod pipeline;
pub mod postprocess;
pub mod report;
pub mod util;
