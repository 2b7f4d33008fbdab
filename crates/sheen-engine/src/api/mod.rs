pub mod config;
pub mod engine;
pub mod scene;
pub mod types;
