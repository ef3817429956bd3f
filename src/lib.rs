pub mod aoi;
pub mod archive;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod parser;
pub mod query;
pub mod search;
pub mod transfer;
