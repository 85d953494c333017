//! Lifecycle state machine for configuration instances.

use thiserror::Error;
use tracing::debug;

/// States a configuration instance can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigState {
    /// Instance allocated; load logic has not finished yet.
    Constructing,
    /// Stores are populated and defaults applied; writes are accepted.
    Loaded,
    /// Stores are frozen; writes are rejected until unlocked.
    Locked,
}

impl ConfigState {
    /// Returns `true` when writes are rejected.
    #[must_use]
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// Events that trigger lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Load logic finished and defaults were applied.
    Load,
    /// Freeze the instance.
    Lock,
    /// Thaw the instance.
    Unlock,
}

/// Lifecycle state manager.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    schema: String,
    state: ConfigState,
}

impl Lifecycle {
    pub(crate) fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            state: ConfigState::Constructing,
        }
    }

    pub(crate) const fn state(&self) -> ConfigState {
        self.state
    }

    /// Applies a lifecycle event, returning the resulting state.
    pub(crate) fn transition(&mut self, event: LifecycleEvent) -> LifecycleResult<ConfigState> {
        let next = match (self.state, event) {
            (ConfigState::Constructing, LifecycleEvent::Load)
            | (ConfigState::Loaded | ConfigState::Locked, LifecycleEvent::Unlock) => {
                Some(ConfigState::Loaded)
            }
            (ConfigState::Loaded | ConfigState::Locked, LifecycleEvent::Lock) => {
                Some(ConfigState::Locked)
            }
            _ => None,
        };

        let Some(next_state) = next else {
            return Err(LifecycleError::InvalidTransition {
                schema: self.schema.clone(),
                from: self.state,
                event,
            });
        };

        if next_state != self.state {
            debug!(
                schema = %self.schema,
                ?self.state,
                ?next_state,
                ?event,
                "config lifecycle transition"
            );
            self.state = next_state;
        }

        Ok(self.state)
    }
}

/// Errors emitted by the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Transition was not permitted from the current state.
    #[error("invalid lifecycle transition from {from:?} via {event:?} for config `{schema}`")]
    InvalidTransition {
        /// Schema of the instance whose transition failed.
        schema: String,
        /// State prior to the attempted transition.
        from: ConfigState,
        /// Event that triggered the failure.
        event: LifecycleEvent,
    },
}

/// Result alias used for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_then_lock_flow() {
        let mut lifecycle = Lifecycle::new("Basic");

        assert_eq!(lifecycle.state(), ConfigState::Constructing);
        lifecycle.transition(LifecycleEvent::Load).unwrap();
        assert_eq!(lifecycle.state(), ConfigState::Loaded);
        lifecycle.transition(LifecycleEvent::Lock).unwrap();
        assert!(lifecycle.state().is_locked());
    }

    #[test]
    fn lock_and_unlock_are_idempotent() {
        let mut lifecycle = Lifecycle::new("Basic");
        lifecycle.transition(LifecycleEvent::Load).unwrap();

        lifecycle.transition(LifecycleEvent::Unlock).unwrap();
        assert_eq!(lifecycle.state(), ConfigState::Loaded);
        lifecycle.transition(LifecycleEvent::Lock).unwrap();
        lifecycle.transition(LifecycleEvent::Lock).unwrap();
        assert_eq!(lifecycle.state(), ConfigState::Locked);
        lifecycle.transition(LifecycleEvent::Unlock).unwrap();
        assert_eq!(lifecycle.state(), ConfigState::Loaded);
    }

    #[test]
    fn locking_before_load_errors() {
        let mut lifecycle = Lifecycle::new("Basic");

        let err = lifecycle
            .transition(LifecycleEvent::Lock)
            .expect_err("lock should fail while constructing");

        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: ConfigState::Constructing,
                ..
            }
        ));
    }

    #[test]
    fn load_happens_once() {
        let mut lifecycle = Lifecycle::new("Basic");
        lifecycle.transition(LifecycleEvent::Load).unwrap();
        assert!(lifecycle.transition(LifecycleEvent::Load).is_err());
    }
}
