//! Scene readiness
//!
//! A scene is `WaitingForComponents` while any asynchronously loaded shared
//! component is outstanding, then `Ready`. `Ready` is terminal.

use std::fmt;

/// Readiness state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Components still loading
    WaitingForComponents,
    /// Everything requested so far has loaded
    Ready,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForComponents => f.write_str("WAITING_FOR_COMPONENTS"),
            Self::Ready => f.write_str("READY"),
        }
    }
}

/// Outcome of a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refresh {
    /// Pending count after the refresh
    pub pending: usize,
    /// State after the refresh
    pub state: LifecycleState,
    /// This refresh moved the scene to `Ready`
    pub became_ready: bool,
}

/// Readiness state machine of one scene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneLifecycle {
    state: LifecycleState,
    pending: usize,
}

impl SceneLifecycle {
    /// Start from the number of components outstanding at scene start
    pub const fn new(pending: usize) -> Self {
        let state = if pending > 0 {
            LifecycleState::WaitingForComponents
        } else {
            LifecycleState::Ready
        };
        Self { state, pending }
    }

    /// Recompute after a completion
    pub fn refresh(&mut self, pending: usize) -> Refresh {
        self.pending = pending;
        let became_ready = self.state == LifecycleState::WaitingForComponents && pending == 0;
        if became_ready {
            self.state = LifecycleState::Ready;
        }
        Refresh {
            pending,
            state: self.state,
            became_ready,
        }
    }

    /// Current state
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Outstanding components at the last refresh
    pub const fn pending(&self) -> usize {
        self.pending
    }

    /// In the terminal state
    pub fn is_ready(&self) -> bool {
        self.state == LifecycleState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_follows_pending_count() {
        assert_eq!(SceneLifecycle::new(0).state(), LifecycleState::Ready);
        assert_eq!(SceneLifecycle::new(3).state(), LifecycleState::WaitingForComponents);
    }

    #[test]
    fn becomes_ready_once() {
        let mut lifecycle = SceneLifecycle::new(2);
        let first = lifecycle.refresh(1);
        assert_eq!(first.state, LifecycleState::WaitingForComponents);
        assert!(!first.became_ready);

        let second = lifecycle.refresh(0);
        assert!(second.became_ready);
        assert!(lifecycle.is_ready());

        assert!(!lifecycle.refresh(0).became_ready);
    }

    #[test]
    fn ready_is_terminal() {
        let mut lifecycle = SceneLifecycle::new(0);
        let refresh = lifecycle.refresh(4);
        assert_eq!(refresh.state, LifecycleState::Ready);
        assert_eq!(lifecycle.pending(), 4);
    }
}
