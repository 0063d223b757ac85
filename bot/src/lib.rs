pub mod config;
pub mod console;
pub mod engine;
pub mod help;
pub mod platform;
pub mod store;
