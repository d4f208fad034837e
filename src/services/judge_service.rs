//! Read-only projections of the judge catalog.

use crate::state::{SharedState, judges::Judge};

/// Every judge in the catalog, including the glitch judge so clients can
/// render it when a verdict is hijacked.
pub fn list_judges(state: &SharedState) -> Vec<Judge> {
    state.catalog().all().to_vec()
}
