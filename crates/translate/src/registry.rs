//! Ordered first-claimer routing over the closed processor set.

use ripple_core::ChangeRecord;

use crate::entities::{OrderProcessor, UserProcessor};
use crate::processor::EntityProcessor;

/// Routes each record to the first processor that claims it. Registration
/// order is significant: more specific categories go first, though the
/// default set is disjoint by key prefix anyway.
pub struct Registry {
    processors: Vec<Box<dyn EntityProcessor>>,
}

impl Registry {
    pub fn new(processors: Vec<Box<dyn EntityProcessor>>) -> Self {
        Self { processors }
    }

    /// The closed default set: orders (with shipment sub-processing), then
    /// users.
    pub fn with_default_processors() -> Self {
        Self::new(vec![Box::new(OrderProcessor::new()), Box::new(UserProcessor)])
    }

    /// First claimer in registration order, or `None` — an unclaimed record
    /// is skipped, not an error.
    pub fn route(&self, record: &ChangeRecord) -> Option<&dyn EntityProcessor> {
        self.processors.iter().find(|p| p.can_handle(record)).map(|p| &**p)
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
