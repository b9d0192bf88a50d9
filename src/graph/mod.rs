//! Co-occurrence graph store.
//!
//! - **store** — [`CooccurrenceGraph`] and its [`GraphBuilder`].
//! - **loader** — builds a graph from the JSON reference artifact.

pub mod loader;
pub mod store;

pub use loader::{LoadedGraph, from_json, load};
pub use store::{CooccurrenceGraph, GraphBuilder, Role};
