//! Logging setup
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job.

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Install a global `fmt` subscriber filtered by `directive`.
///
/// # Errors
///
/// Returns `Error::InvalidInput` if the directive does not parse or a global
/// subscriber is already installed.
pub fn init(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| Error::InvalidInput(format!("log filter {directive:?}: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| Error::InvalidInput(format!("logging already initialized: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_rejects_bad_directive() {
        let err = init("sinklab=notalevel").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
