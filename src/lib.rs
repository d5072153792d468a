pub mod accounts;
pub mod app;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod state;
