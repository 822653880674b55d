pub mod agent;
pub mod agent_config;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod memory;
pub mod migrate;
pub mod phase;
pub mod prompt;
pub mod provider;
pub mod report;
pub mod scan;
pub mod testgen;
pub mod ux;
pub mod wire;
