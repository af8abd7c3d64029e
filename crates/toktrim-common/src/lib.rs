pub mod config;
pub mod tracking;
