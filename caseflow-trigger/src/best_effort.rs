//! Non-fatal execution of optional steps.

use std::fmt::Display;

/// Run an optional step whose failure must not affect the caller.
///
/// `Ok(v)` becomes `Some(v)`. An error is logged at warn level with `label`
/// and becomes `None`. Every deliberately ignored error in the trigger goes
/// through here.
pub fn best_effort<T, E, F>(label: &str, step: F) -> Option<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    match step() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(step = label, error = %err, "optional step failed; continuing");
            None
        }
    }
}
