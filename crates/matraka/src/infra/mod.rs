pub mod clipboard;
pub mod config;
