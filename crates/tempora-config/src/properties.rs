//! String-keyed solver properties.
//!
//! Components read named options (`Swap.MaxAttempts`, `<Criterion>.Weight`)
//! through typed getters. A missing key yields the caller's default; an
//! unparsable one yields the default too, with a warning.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Flat map of named options.
///
/// # Examples
///
/// ```
/// use tempora_config::Properties;
///
/// let properties: Properties = [("TimePreferences.Weight", "2.5")].into_iter().collect();
///
/// assert_eq!(properties.get_f64("TimePreferences.Weight", 1.0), 2.5);
/// assert_eq!(properties.get_f64("RoomPreferences.Weight", 1.0), 1.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.parse_or(key, default)
    }

    pub fn get_opt_f64(&self, key: &str) -> Option<f64> {
        let raw = self.get_str(key)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(event = "property_ignored", key, value = raw, %error);
                None
            }
        }
    }

    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.parse_or(key, default)
    }

    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.parse_or(key, default)
    }

    /// Accepts `true`/`false` in any case, plus `1`/`0`, `yes`/`no`, `on`/`off`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let Some(raw) = self.get_str(key) else {
            return default;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => {
                warn!(event = "property_fallback", key, value = raw, default);
                default
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn parse_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        let Some(raw) = self.get_str(key) else {
            return default;
        };
        match raw.trim().parse() {
            Ok(value) => value,
            Err(error) => {
                warn!(
                    event = "property_fallback",
                    key,
                    value = raw,
                    default = %default,
                    %error,
                );
                default
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Properties::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}
