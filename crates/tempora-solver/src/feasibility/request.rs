//! Requests of one entity and pairwise consistency of their candidates.

use std::fmt;

use tempora_core::{Model, Payload, Value, ValueRef};

/// What a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// A course; `waitlist` requests hold their place even when unassigned.
    Course { waitlist: bool },
    /// A block of time to keep free.
    FreeTime,
}

impl RequestKind {
    fn is_waitlist(self) -> bool {
        matches!(self, RequestKind::Course { waitlist: true })
    }
}

/// One request with its candidate values, in preference order.
pub struct Request<P> {
    id: usize,
    name: String,
    kind: RequestKind,
    alternative: bool,
    candidates: Vec<ValueRef<P>>,
}

impl<P> Request<P> {
    pub fn course(id: usize, name: impl Into<String>, candidates: Vec<ValueRef<P>>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: RequestKind::Course { waitlist: false },
            alternative: false,
            candidates,
        }
    }

    pub fn free_time(id: usize, name: impl Into<String>, candidates: Vec<ValueRef<P>>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: RequestKind::FreeTime,
            alternative: false,
            candidates,
        }
    }

    /// Marks the request as a substitute for an unsatisfied primary one.
    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    pub fn waitlisted(mut self) -> Self {
        if let RequestKind::Course { waitlist } = &mut self.kind {
            *waitlist = true;
        }
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn is_alternative(&self) -> bool {
        self.alternative
    }

    pub fn is_waitlist(&self) -> bool {
        self.kind.is_waitlist()
    }

    pub fn candidates(&self) -> &[ValueRef<P>] {
        &self.candidates
    }
}

impl<P> Clone for Request<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            alternative: self.alternative,
            candidates: self.candidates.clone(),
        }
    }
}

impl<P> fmt::Debug for Request<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("alternative", &self.alternative)
            .field("candidates", &self.candidates.len())
            .finish()
    }
}

/// Ordered requests of one entity.
#[derive(Debug)]
pub struct RequestSet<P> {
    requests: Vec<Request<P>>,
}

impl<P> RequestSet<P> {
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
        }
    }

    pub fn push(&mut self, request: Request<P>) {
        self.requests.push(request);
    }

    pub fn with(mut self, request: Request<P>) -> Self {
        self.push(request);
        self
    }

    pub fn requests(&self) -> &[Request<P>] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&Request<P>> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Number of requests that are not alternatives.
    pub fn primary_count(&self) -> usize {
        self.requests.iter().filter(|r| !r.alternative).count()
    }

    /// The requests whose ids are in `ids`, in this set's order.
    pub fn subset(&self, ids: &[usize]) -> Self {
        Self {
            requests: self
                .requests
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect(),
        }
    }
}

impl<P> Default for RequestSet<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for RequestSet<P> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
        }
    }
}

impl<P> FromIterator<Request<P>> for RequestSet<P> {
    fn from_iter<I: IntoIterator<Item = Request<P>>>(iter: I) -> Self {
        Self {
            requests: iter.into_iter().collect(),
        }
    }
}

/// Whether two candidate values can be held together.
pub trait Consistency<P> {
    fn consistent(&self, first: &Value<P>, second: &Value<P>) -> bool;
}

impl<P, T: Consistency<P> + ?Sized> Consistency<P> for &T {
    fn consistent(&self, first: &Value<P>, second: &Value<P>) -> bool {
        (**self).consistent(first, second)
    }
}

/// Consistent when no hard constraint of the model forbids the pair.
impl<P: Payload> Consistency<P> for Model<P> {
    fn consistent(&self, first: &Value<P>, second: &Value<P>) -> bool {
        self.constraints()
            .filter(|c| c.is_hard())
            .all(|c| c.is_consistent(first, second))
    }
}

/// Consistency given by a closure.
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyFn<F>(pub F);

impl<P, F> Consistency<P> for ConsistencyFn<F>
where
    F: Fn(&Value<P>, &Value<P>) -> bool,
{
    fn consistent(&self, first: &Value<P>, second: &Value<P>) -> bool {
        (self.0)(first, second)
    }
}
