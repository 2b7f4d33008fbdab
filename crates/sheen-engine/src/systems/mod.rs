pub mod cache;
pub mod jitter;
pub mod obstruction;
pub mod reflection;
