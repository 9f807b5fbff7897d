pub mod cleanup;
pub mod config;
