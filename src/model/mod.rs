//! # Temporal Graph Model
//!
//! Plain data shared by every layer: identifiers, edge records and the
//! neighbor triples handed back to callers.
//!
//! No partition or sampling state lives here, and nothing in this module
//! performs I/O.

pub mod node;
pub mod edge;

pub use node::{NodeId, EdgeType, Timestamp, NEVER_DELETED};
pub use edge::{EdgeRecord, Neighbor};
