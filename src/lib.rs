pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod join;
pub mod metrics;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod snapshot;
