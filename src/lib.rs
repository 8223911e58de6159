//! pesas library — exposes internal modules for integration tests.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod ledger;
pub mod report;
pub mod server;
pub mod slack;
pub mod store;
