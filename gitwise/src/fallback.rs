//! "Model first, local rules otherwise" in one place.
//!
//! Planning, risk review and commit messages all have a model-backed strategy
//! and a deterministic local one. [`Fallback`] picks the model when it is
//! available and falls back to the local strategy when it is not, or when the
//! model call fails. The local strategy cannot fail.

use anyhow::Result;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Fallback<P, L> {
    primary: Option<P>,
    local: L,
}

impl<P, L> Fallback<P, L> {
    pub fn new(primary: Option<P>, local: L) -> Self {
        Self { primary, local }
    }

    pub fn local_only(local: L) -> Self {
        Self {
            primary: None,
            local,
        }
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Run `primary` when available; on absence or error run `local`.
    pub fn run<T>(
        &self,
        what: &str,
        primary: impl FnOnce(&P) -> Result<T>,
        local: impl FnOnce(&L) -> T,
    ) -> T {
        match &self.primary {
            Some(strategy) => match primary(strategy) {
                Ok(value) => {
                    debug!(what, "model strategy answered");
                    return value;
                }
                Err(err) => {
                    warn!(what, err = %format!("{err:#}"), "model strategy failed, using local rules");
                }
            },
            None => debug!(what, "no model available, using local rules"),
        }
        local(&self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    #[test]
    fn uses_primary_when_it_succeeds() {
        let fallback = Fallback::new(Some(2), 1);
        let value = fallback.run("n", |p| Ok(*p * 10), |l| *l);
        assert_eq!(value, 20);
    }

    #[test]
    fn falls_back_on_primary_error() {
        let fallback = Fallback::new(Some(2), 1);
        let value = fallback.run("n", |_| Err(anyhow!("offline")), |l| *l);
        assert_eq!(value, 1);
    }

    #[test]
    fn local_only_never_calls_primary() {
        let called = Cell::new(false);
        let fallback: Fallback<u8, u8> = Fallback::local_only(7);
        let value = fallback.run(
            "n",
            |_| {
                called.set(true);
                Ok(0)
            },
            |l| *l,
        );
        assert_eq!(value, 7);
        assert!(!called.get());
        assert!(!fallback.has_primary());
    }
}
