//! Export of call graphs for downstream tooling.
//!
//! - **JSON**: a deterministic `{ nodes, edges }` snapshot

pub mod json;

pub use json::{export_json, to_json_value};
