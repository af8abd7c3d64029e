pub mod config;
pub mod engine;
pub mod metrics;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod session;
pub mod summary;

// Re-export the filter engine so consumers can reach individual filters
// through `toktrim::filter::*`.
pub use toktrim_filter::filter;
pub use toktrim_filter::Outcome;
