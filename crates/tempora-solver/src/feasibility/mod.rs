//! Branch-and-bound feasibility checking for the requests of one entity.
//!
//! The checker finds the largest number of requests that can be satisfied
//! together and, when not all of them can, an inclusion-minimal set of
//! requests that cannot ([`FeasibilityChecker::no_good`]). It does not touch
//! any assignment and is deterministic for a fixed request order.
//!
//! # Example
//!
//! ```
//! use tempora_solver::feasibility::{FeasibilityChecker, Request, RequestSet};
//! use tempora_test::enrollment::{sections, Enrollment};
//!
//! let mut enrollment = Enrollment::new();
//! let math = enrollment.course("Math", &[1]);
//! let art = enrollment.course("Art", &[1, 2]);
//! let model = enrollment.build();
//!
//! let requests = RequestSet::new()
//!     .with(Request::course(1, "Math", sections(&model, math)))
//!     .with(Request::course(2, "Art", sections(&model, art)));
//!
//! let outcome = FeasibilityChecker::new(&model).check(&requests);
//! assert!(outcome.complete);
//! assert_eq!(outcome.assigned(), 2);
//! ```

mod request;

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use tempora_config::FeasibilityConfig;
use tempora_core::{Payload, Value, ValueRef};
use tracing::{debug, info};

pub use request::{Consistency, ConsistencyFn, Request, RequestKind, RequestSet};

type PatternFn<P> = Box<dyn Fn(&Value<P>) -> u64 + Send + Sync>;

/// Exhaustive search over the candidates of a [`RequestSet`].
pub struct FeasibilityChecker<P, C> {
    consistency: C,
    pattern: Option<PatternFn<P>>,
    node_limit: Option<u64>,
    time_limit: Option<Duration>,
}

/// Best partial assignment found by [`FeasibilityChecker::check`].
#[derive(Debug)]
pub struct FeasibilityOutcome<P> {
    /// Request id and chosen value of every satisfied request.
    pub best: Vec<(usize, ValueRef<P>)>,
    /// Whether every non-alternative request could be satisfied.
    pub complete: bool,
    /// Search nodes visited.
    pub nodes: u64,
    /// Whether a node or time limit stopped the search early.
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl<P> FeasibilityOutcome<P> {
    /// Number of satisfied requests.
    pub fn assigned(&self) -> usize {
        self.best.len()
    }

    pub fn value_of(&self, request: usize) -> Option<&ValueRef<P>> {
        self.best
            .iter()
            .find(|(id, _)| *id == request)
            .map(|(_, value)| value)
    }
}

impl<P: Payload, C: Consistency<P>> FeasibilityChecker<P, C> {
    pub fn new(consistency: C) -> Self {
        Self {
            consistency,
            pattern: None,
            node_limit: None,
            time_limit: None,
        }
    }

    pub fn from_config(consistency: C, config: &FeasibilityConfig) -> Self {
        Self {
            node_limit: config.node_limit,
            time_limit: config.time_limit(),
            ..Self::new(consistency)
        }
    }

    /// Candidates of one request with equal keys are interchangeable; only
    /// the first of them is tried.
    pub fn with_pattern<F>(mut self, pattern: F) -> Self
    where
        F: Fn(&Value<P>) -> u64 + Send + Sync + 'static,
    {
        self.pattern = Some(Box::new(pattern));
        self
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Finds the most requests that can be satisfied together.
    pub fn check(&self, requests: &RequestSet<P>) -> FeasibilityOutcome<P> {
        let start = Instant::now();
        let mut search = Search {
            checker: self,
            requests: requests.requests(),
            current: vec![None; requests.len()],
            assigned: 0,
            best: None,
            best_assigned: 0,
            primary: requests.primary_count(),
            nodes: 0,
            deadline: self.time_limit.map(|limit| start + limit),
            timed_out: false,
        };
        search.backtrack(0);

        let best: Vec<(usize, ValueRef<P>)> = search
            .best
            .unwrap_or_default()
            .into_iter()
            .zip(requests.requests())
            .filter_map(|(value, request)| value.map(|value| (request.id(), value)))
            .collect();
        let outcome = FeasibilityOutcome {
            complete: best.len() >= search.primary,
            best,
            nodes: search.nodes,
            timed_out: search.timed_out,
            elapsed: start.elapsed(),
        };

        info!(
            event = "feasibility_end",
            requests = requests.len(),
            primary = search.primary,
            assigned = outcome.assigned(),
            complete = outcome.complete,
            nodes = outcome.nodes,
            timed_out = outcome.timed_out,
            duration_ms = outcome.elapsed.as_millis() as u64,
        );
        outcome
    }

    /// Ids of an inclusion-minimal subset of `requests` that cannot be
    /// satisfied completely; empty when the whole set can.
    ///
    /// Each request is dropped in turn and stays dropped if the rest is
    /// still proven infeasible. A check stopped by a limit proves nothing,
    /// so the request is kept in that case.
    pub fn no_good(&self, requests: &RequestSet<P>) -> Vec<usize> {
        if self.check(requests).complete {
            return Vec::new();
        }

        let mut kept: Vec<usize> = requests.requests().iter().map(Request::id).collect();
        let mut checks = 1;
        for id in requests.requests().iter().map(Request::id) {
            let reduced: Vec<usize> = kept.iter().copied().filter(|&k| k != id).collect();
            let outcome = self.check(&requests.subset(&reduced));
            checks += 1;
            if !outcome.complete && !outcome.timed_out {
                kept = reduced;
            }
        }

        debug!(event = "no_good", requests = requests.len(), size = kept.len(), checks = checks);
        kept
    }
}

impl<P, C: fmt::Debug> fmt::Debug for FeasibilityChecker<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeasibilityChecker")
            .field("consistency", &self.consistency)
            .field("pattern", &self.pattern.is_some())
            .field("node_limit", &self.node_limit)
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

struct Search<'a, P, C> {
    checker: &'a FeasibilityChecker<P, C>,
    requests: &'a [Request<P>],
    current: Vec<Option<ValueRef<P>>>,
    assigned: usize,
    best: Option<Vec<Option<ValueRef<P>>>>,
    best_assigned: usize,
    primary: usize,
    nodes: u64,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl<P: Payload, C: Consistency<P>> Search<'_, P, C> {
    fn stopped(&mut self) -> bool {
        if !self.timed_out {
            let nodes_spent = self
                .checker
                .node_limit
                .is_some_and(|limit| self.nodes >= limit);
            let time_spent = self.deadline.is_some_and(|d| Instant::now() >= d);
            self.timed_out = nodes_spent || time_spent;
        }
        self.timed_out
    }

    fn best_is_complete(&self) -> bool {
        self.best.is_some() && self.best_assigned >= self.primary
    }

    /// Upper bound on what this branch can still reach. Alternatives only
    /// stand in for primary requests, so the primary count caps it.
    fn bound(&self, index: usize) -> usize {
        (self.assigned + self.requests.len() - index).min(self.primary)
    }

    /// Alternative credit: an alternative request may only be satisfied
    /// while some non-waitlisted primary course is unsatisfied. Undecided
    /// requests count as unsatisfied, so an alternative ordered before its
    /// primaries can be satisfied alongside all of them.
    fn can_assign(&self, index: usize) -> bool {
        let request = &self.requests[index];
        if !request.is_alternative() {
            return true;
        }
        let mut credit = 0i64;
        for (i, other) in self.requests.iter().enumerate() {
            if i == index {
                continue;
            }
            if other.is_alternative() {
                if self.current[i].is_some() || other.is_waitlist() {
                    credit -= 1;
                }
            } else if other.kind() == (RequestKind::Course { waitlist: false })
                && self.current[i].is_none()
            {
                credit += 1;
            }
        }
        credit > 0
    }

    fn backtrack(&mut self, index: usize) {
        if self.stopped() {
            return;
        }
        self.nodes += 1;

        let requests = self.requests;
        let Some(request) = requests.get(index) else {
            if self.best.is_none() || self.assigned > self.best_assigned {
                self.best = Some(self.current.clone());
                self.best_assigned = self.assigned;
            }
            return;
        };
        if self.best_is_complete() {
            return;
        }
        if self.best.is_some() && self.bound(index) <= self.best_assigned {
            return;
        }
        if !self.can_assign(index) {
            self.backtrack(index + 1);
            return;
        }

        let checker = self.checker;
        let mut patterns = HashSet::new();
        let mut fitted = false;
        for candidate in request.candidates() {
            if let Some(pattern) = &checker.pattern {
                if !patterns.insert(pattern(candidate.as_ref())) {
                    continue;
                }
            }
            let clashes = self
                .current
                .iter()
                .flatten()
                .any(|other| !checker.consistency.consistent(candidate, other));
            if clashes {
                continue;
            }

            fitted = true;
            self.current[index] = Some(candidate.clone());
            self.assigned += 1;
            self.backtrack(index + 1);
            self.current[index] = None;
            self.assigned -= 1;
            if self.stopped() || self.best_is_complete() {
                return;
            }
        }

        match request.kind() {
            RequestKind::Course { .. } => self.backtrack(index + 1),
            RequestKind::FreeTime if !fitted => self.backtrack(index + 1),
            RequestKind::FreeTime => {}
        }
    }
}
