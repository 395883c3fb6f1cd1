pub mod commands;
pub mod config;
pub mod error;
pub mod github;
pub mod http;
pub mod pipeline;
pub mod plot;
pub mod progress;
pub mod registry;
pub mod table;
