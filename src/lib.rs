pub mod api;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod server;
pub mod service;
pub mod source;
