//! Criteria instantiated by configuration name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tempora_config::{CriterionConfig, Properties, ValueUpdate};
use tempora_core::criterion::{Criterion, ValueCostCriterion};
use tempora_core::{Model, OwnerHandle, Payload};
use tracing::{debug, warn};

/// Resolved settings handed to a criterion constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionSettings {
    pub name: String,
    pub weight: f64,
    pub update: ValueUpdate,
}

type Constructor<P> = Box<dyn Fn(&CriterionSettings) -> Arc<dyn Criterion<P>> + Send + Sync>;

/// Registry of criterion constructors.
///
/// A weight comes from the configuration entry, else from the
/// `<Name>.Weight` property, else defaults to 1.
pub struct CriterionFactory<P> {
    constructors: BTreeMap<String, Constructor<P>>,
    properties: Properties,
}

impl<P: Payload> CriterionFactory<P> {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    /// An empty registry.
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
            properties: Properties::new(),
        }
    }

    /// A registry knowing the generic criteria of the core crate:
    /// `ValueCost`.
    pub fn with_defaults() -> Self {
        Self::new().register("ValueCost", |settings| {
            Arc::new(
                ValueCostCriterion::new(settings.name.clone())
                    .with_weight(settings.weight)
                    .with_policy(settings.update),
            )
        })
    }

    pub fn register<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&CriterionSettings) -> Arc<dyn Criterion<P>> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    pub fn settings(&self, config: &CriterionConfig) -> CriterionSettings {
        let weight = config.weight.unwrap_or_else(|| {
            self.properties
                .get_f64(&format!("{}.Weight", config.name), Self::DEFAULT_WEIGHT)
        });
        CriterionSettings {
            name: config.name.clone(),
            weight,
            update: config.update.unwrap_or_default(),
        }
    }

    /// Builds the criterion `config` names, or `None` if no constructor is
    /// registered under that name.
    pub fn create(&self, config: &CriterionConfig) -> Option<Arc<dyn Criterion<P>>> {
        let Some(constructor) = self.constructors.get(&config.name) else {
            warn!(event = "unknown_criterion", name = %config.name);
            return None;
        };
        let settings = self.settings(config);
        debug!(
            event = "criterion_created",
            name = %settings.name,
            weight = settings.weight,
            update = ?settings.update,
        );
        Some(constructor(&settings))
    }

    /// Registers every known criterion of `configs` with `model`; unknown
    /// names are skipped.
    pub fn install(&self, model: &mut Model<P>, configs: &[CriterionConfig]) -> Vec<OwnerHandle> {
        configs
            .iter()
            .filter_map(|config| self.create(config))
            .map(|criterion| model.add_shared_criterion(criterion))
            .collect()
    }
}

impl<P: Payload> Default for CriterionFactory<P> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<P> fmt::Debug for CriterionFactory<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriterionFactory")
            .field("constructors", &self.constructors.keys().collect::<Vec<_>>())
            .field("properties", &self.properties)
            .finish()
    }
}
