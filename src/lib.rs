pub mod cli;
pub mod config;
pub mod crl;
pub mod server;
pub mod telemetry;
