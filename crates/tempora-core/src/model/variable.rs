//! Decision variables and their domains.

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::value::{Value, ValueRef, ValueSpec};

/// Stable handle of a variable inside its [`Model`](super::Model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(usize);

impl VariableId {
    pub const fn new(index: usize) -> Self {
        VariableId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Generates the domain of a variable on first use.
pub type DomainFn<P> = Box<dyn Fn(VariableId) -> Vec<ValueRef<P>> + Send + Sync>;

/// Where a variable's candidate values come from.
pub enum Domain<P> {
    /// Value specs known at load time, bound to the variable on registration.
    Fixed(Vec<ValueSpec<P>>),
    /// Values built on first access and cached until invalidated.
    Lazy(DomainFn<P>),
}

impl<P> fmt::Debug for Domain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Fixed(specs) => write!(f, "Fixed({} values)", specs.len()),
            Domain::Lazy(_) => write!(f, "Lazy"),
        }
    }
}

enum Source<P> {
    Fixed,
    Lazy(DomainFn<P>),
}

/// A decision entity with a finite set of candidate values.
pub struct Variable<P> {
    id: VariableId,
    name: String,
    source: Source<P>,
    values: OnceLock<Vec<ValueRef<P>>>,
    initial: Option<ValueRef<P>>,
}

impl<P> Variable<P> {
    pub(crate) fn bind(id: VariableId, def: VariableDef<P>) -> Self {
        let values = OnceLock::new();
        let source = match def.domain {
            Domain::Fixed(specs) => {
                let bound: Vec<ValueRef<P>> = specs
                    .into_iter()
                    .map(|spec| Arc::new(Value::from_spec(id, spec)))
                    .collect();
                let _ = values.set(bound);
                Source::Fixed
            }
            Domain::Lazy(generate) => Source::Lazy(generate),
        };
        let initial = def.initial.and_then(|index| {
            values
                .get()
                .and_then(|vals: &Vec<ValueRef<P>>| vals.get(index).cloned())
        });
        Self {
            id,
            name: def.name,
            source,
            values,
            initial,
        }
    }

    pub fn id(&self) -> VariableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the domain, generating it on first access.
    pub fn values(&self) -> &[ValueRef<P>] {
        self.values.get_or_init(|| match &self.source {
            Source::Lazy(generate) => generate(self.id),
            Source::Fixed => Vec::new(),
        })
    }

    /// The value this variable held in the input, for minimal perturbation.
    pub fn initial(&self) -> Option<&ValueRef<P>> {
        self.initial.as_ref()
    }

    pub fn set_initial(&mut self, value: Option<ValueRef<P>>) {
        debug_assert!(value.as_ref().map_or(true, |v| v.variable() == self.id));
        self.initial = value;
    }

    /// Drops a lazily generated domain so it is rebuilt on next access.
    ///
    /// Fixed domains are kept. Returns whether anything was dropped.
    pub(crate) fn invalidate(&mut self) -> bool {
        match self.source {
            Source::Lazy(_) => self.values.take().is_some(),
            Source::Fixed => false,
        }
    }
}

impl<P> fmt::Debug for Variable<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("domain_size", &self.values.get().map(Vec::len))
            .finish()
    }
}

/// Definition of a variable handed to [`Model::add_variable`](super::Model::add_variable).
///
/// # Example
///
/// ```
/// use tempora_core::model::{Model, ValueSpec, VariableDef};
///
/// let mut model: Model<u32> = Model::new();
/// let id = model.add_variable(
///     VariableDef::fixed("Lecture 1", vec![ValueSpec::new(1), ValueSpec::new(2)]).with_initial(1),
/// );
///
/// assert_eq!(model.values_of(id).len(), 2);
/// assert_eq!(*model.variable(id).unwrap().initial().unwrap().payload(), 2);
/// ```
pub struct VariableDef<P> {
    name: String,
    domain: Domain<P>,
    initial: Option<usize>,
}

impl<P> VariableDef<P> {
    pub fn fixed(name: impl Into<String>, values: Vec<ValueSpec<P>>) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Fixed(values),
            initial: None,
        }
    }

    pub fn lazy<F>(name: impl Into<String>, generate: F) -> Self
    where
        F: Fn(VariableId) -> Vec<ValueRef<P>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            domain: Domain::Lazy(Box::new(generate)),
            initial: None,
        }
    }

    /// Marks the value at `index` of a fixed domain as the initial one.
    pub fn with_initial(mut self, index: usize) -> Self {
        self.initial = Some(index);
        self
    }
}
