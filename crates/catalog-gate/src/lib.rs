//! Write path: gates, applies, and audits every state-changing operation
//! against the catalog.

mod gate;

pub use gate::{DeleteOutcome, MutationGate, UpdateOutcome};
