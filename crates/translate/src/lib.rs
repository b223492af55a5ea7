//! Ripple translation layer: classify change records by entity and turn each
//! one into an idempotent partial-update operation for the search index.
//!
//! Routing is an ordered first-claimer scan over a closed set of processors;
//! each processor may delegate to one level of sub-processors before the
//! generic diff/script translation applies.

#![forbid(unsafe_code)]

pub mod diff;
pub mod entities;
pub mod op;
pub mod processor;
pub mod registry;
pub mod script;

pub use diff::{diff_images, FieldDiff};
pub use entities::{OrderProcessor, ShipmentProcessor, UserProcessor};
pub use op::{ActionBody, ActionHeader, IndexOperation, Translation, UpdateScript};
pub use processor::{translate_record, ArraySpec, EntityProcessor};
pub use registry::Registry;
