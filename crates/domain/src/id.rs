//! ID generation utilities.

use uuid::Uuid;

/// Generates a new random entity id.
///
/// This is the id format used for variables, scripts, headers and tree nodes
/// created locally. Imported documents may carry ids in any string format.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
