//! Lifecycle of a lazily loaded panel.
//!
//! ```text
//! Unloaded -> Loading -> Ready
//!                |  ^
//!                v  | (attempts left)
//!              Failed
//!                | (budget exhausted)
//!                v
//!           Unavailable  (placeholder until `retry`)
//! ```

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Unloaded,
    Loading {
        attempt: u32,
    },
    Ready {
        attempts: u32,
    },
    Failed {
        attempt: u32,
        error: String,
    },
    Unavailable {
        attempts: u32,
        last_error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("invalid panel transition {from} -> {to}")]
    Invalid {
        from: &'static str,
        to: &'static str,
    },
}

impl PanelState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading { .. } => "loading",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
            Self::Unavailable { .. } => "unavailable",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Loading { .. } | Self::Ready { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Unloaded -> Loading(1), Failed(n) -> Loading(n + 1).
    pub fn begin_load(&mut self) -> Result<u32, TransitionError> {
        let attempt = match self {
            Self::Unloaded => 1,
            Self::Failed { attempt, .. } => attempt.saturating_add(1),
            other => return Err(invalid(other, "loading")),
        };
        *self = Self::Loading { attempt };
        Ok(attempt)
    }

    pub fn load_succeeded(&mut self) -> Result<(), TransitionError> {
        let Self::Loading { attempt } = *self else {
            return Err(invalid(self, "ready"));
        };
        *self = Self::Ready { attempts: attempt };
        Ok(())
    }

    /// Loading -> Failed while attempts remain, otherwise Unavailable.
    pub fn load_failed(
        &mut self,
        error: impl Into<String>,
        max_attempts: u32,
    ) -> Result<(), TransitionError> {
        let Self::Loading { attempt } = *self else {
            return Err(invalid(self, "failed"));
        };
        let error = error.into();
        *self = if attempt >= max_attempts.max(1) {
            Self::Unavailable {
                attempts: attempt,
                last_error: error,
            }
        } else {
            Self::Failed { attempt, error }
        };
        Ok(())
    }

    /// Manual retry from a placeholder or a failed load.
    pub fn retry(&mut self) -> Result<(), TransitionError> {
        match self {
            Self::Failed { .. } | Self::Unavailable { .. } => {
                *self = Self::Unloaded;
                Ok(())
            }
            other => Err(invalid(other, "unloaded")),
        }
    }

    /// Drops a loading or ready panel when another view takes over. Placeholders stay.
    pub fn unload(&mut self) {
        if !self.is_terminal() {
            *self = Self::Unloaded;
        }
    }
}

fn invalid(from: &PanelState, to: &'static str) -> TransitionError {
    TransitionError::Invalid {
        from: from.label(),
        to,
    }
}
