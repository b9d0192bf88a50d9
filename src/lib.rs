// Library root — the binary entry point is src/main.rs.

pub mod artifact;
pub mod bootstrap;
pub mod classifier;
pub mod core;
pub mod graph;
pub mod http;
pub mod recommend;
pub mod runtime;

pub use crate::bootstrap::logger;
pub use crate::core::{config, error};
