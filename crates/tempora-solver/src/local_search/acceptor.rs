//! Acceptors for local search steps.
//!
//! Objective values are minimized: lower is better.

use std::fmt::Debug;

use tempora_config::{AcceptorKind, SearchConfig};

/// Decides whether a step to `candidate` is taken from `current`.
pub trait Acceptor: Send + Debug {
    fn is_accepted(&self, current: f64, candidate: f64) -> bool;

    /// Called when a search starts.
    fn phase_started(&mut self, _initial: f64) {}

    /// Called when a search ends.
    fn phase_ended(&mut self) {}

    fn step_started(&mut self) {}

    /// Called after an accepted step with the new objective value.
    fn step_ended(&mut self, _value: f64) {}
}

impl<A: Acceptor + ?Sized> Acceptor for Box<A> {
    fn is_accepted(&self, current: f64, candidate: f64) -> bool {
        (**self).is_accepted(current, candidate)
    }

    fn phase_started(&mut self, initial: f64) {
        (**self).phase_started(initial);
    }

    fn phase_ended(&mut self) {
        (**self).phase_ended();
    }

    fn step_started(&mut self) {
        (**self).step_started();
    }

    fn step_ended(&mut self, value: f64) {
        (**self).step_ended(value);
    }
}

/// Accepts steps that do not worsen the objective.
#[derive(Debug, Clone, Copy, Default)]
pub struct HillClimbingAcceptor;

impl HillClimbingAcceptor {
    pub fn new() -> Self {
        Self
    }
}

impl Acceptor for HillClimbingAcceptor {
    fn is_accepted(&self, current: f64, candidate: f64) -> bool {
        candidate <= current
    }
}

/// Accepts steps no worse than the objective `size` accepted steps ago.
///
/// ```
/// use tempora_solver::local_search::{Acceptor, LateAcceptanceAcceptor};
///
/// let mut acceptor = LateAcceptanceAcceptor::new(2);
/// acceptor.phase_started(10.0);
/// acceptor.step_ended(8.0);
/// acceptor.step_ended(12.0);
///
/// // worse than the current 7.0, but no worse than 8.0 two steps back
/// assert!(acceptor.is_accepted(7.0, 8.0));
/// assert!(!acceptor.is_accepted(7.0, 8.5));
/// ```
#[derive(Debug, Clone)]
pub struct LateAcceptanceAcceptor {
    history: Vec<f64>,
    index: usize,
}

impl LateAcceptanceAcceptor {
    pub const DEFAULT_SIZE: usize = 400;

    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "late acceptance size must be positive");
        Self {
            history: vec![f64::INFINITY; size],
            index: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.history.len()
    }
}

impl Default for LateAcceptanceAcceptor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

impl Acceptor for LateAcceptanceAcceptor {
    fn is_accepted(&self, current: f64, candidate: f64) -> bool {
        candidate <= current || candidate <= self.history[self.index]
    }

    fn phase_started(&mut self, initial: f64) {
        self.history.fill(initial);
        self.index = 0;
    }

    fn step_ended(&mut self, value: f64) {
        self.history[self.index] = value;
        self.index = (self.index + 1) % self.history.len();
    }
}

/// Builds the acceptor a search configuration names.
pub fn acceptor_for(config: &SearchConfig) -> Box<dyn Acceptor> {
    match config.acceptor {
        AcceptorKind::HillClimbing => Box::new(HillClimbingAcceptor::new()),
        AcceptorKind::LateAcceptance => {
            let size = match config.late_acceptance_size {
                0 => LateAcceptanceAcceptor::DEFAULT_SIZE,
                size => size,
            };
            Box::new(LateAcceptanceAcceptor::new(size))
        }
    }
}
