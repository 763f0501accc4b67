// Library root: re-exports all modules so integration tests and the
// `courtvision` binary can access the crate's public API.

pub mod cache;
pub mod config;
pub mod pipeline;
pub mod provider;
pub mod rating;
pub mod stats;
