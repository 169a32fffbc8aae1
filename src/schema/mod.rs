//! Preference schemas: named groups of typed descriptors.
//!
//! A schema is declared once per domain object type and is immutable after
//! [`SchemaBuilder::build`]:
//!
//! ```
//! use serial_preferences::{Pref, PreferenceSchema};
//!
//! let schema = PreferenceSchema::builder("BusinessPreferences")
//!     .group("Fuel", "Fuel Settings", |g| {
//!         g.add("prepay_enabled", Pref::boolean().with_default(true))
//!             .add("max_prepay_amount", Pref::integer().with_default(15000).with_ge(0))
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.groups()[0].key(), "fuel");
//! assert_eq!(schema.get("prepay_enabled").unwrap().group_key(), "fuel");
//! ```
//!
//! Group keys are derived from the declared group name (`FuelSettings` becomes
//! `fuel_settings`). Preference keys must be unique across the whole schema.

pub mod kdl;
mod pref;

pub use pref::{Choice, Pref, ValueKind};

use crate::validators::coerce_and_validate;
use crate::{Error, Result};
use std::collections::HashMap;

/// A labeled, ordered collection of preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceGroup {
    key: String,
    name: String,
    label: String,
    prefs: Vec<Pref>,
}

impl PreferenceGroup {
    /// Group key derived from the declared name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The name the group was declared with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Preferences in declaration order.
    pub fn preferences(&self) -> &[Pref] {
        &self.prefs
    }
}

/// A complete preference schema for one domain object type.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceSchema {
    name: String,
    groups: Vec<PreferenceGroup>,
    /// key -> (group index, preference index)
    index: HashMap<String, (usize, usize)>,
}

impl PreferenceSchema {
    /// Start declaring a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Groups in declaration order.
    pub fn groups(&self) -> &[PreferenceGroup] {
        &self.groups
    }

    /// Look up a group by its derived key.
    pub fn group(&self, key: &str) -> Option<&PreferenceGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Look up a preference by key.
    pub fn get(&self, key: &str) -> Option<&Pref> {
        self.index
            .get(key)
            .map(|&(group, pref)| &self.groups[group].prefs[pref])
    }

    /// Look up a preference by key, failing with [`Error::UnknownPreference`].
    pub fn require(&self, key: &str) -> Result<&Pref> {
        self.get(key)
            .ok_or_else(|| Error::UnknownPreference(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// All preferences, group by group, in declaration order.
    pub fn preferences(&self) -> impl Iterator<Item = &Pref> {
        self.groups.iter().flat_map(|g| g.prefs.iter())
    }

    /// All preference keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.preferences().map(Pref::key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Collects the preferences of one group during declaration.
#[derive(Debug, Default)]
pub struct GroupBuilder {
    prefs: Vec<(String, Pref)>,
}

impl GroupBuilder {
    /// Add a preference under `key`.
    pub fn add(mut self, key: impl Into<String>, pref: Pref) -> Self {
        self.prefs.push((key.into(), pref));
        self
    }
}

/// Declarative schema builder. Errors are reported by [`SchemaBuilder::build`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    groups: Vec<(String, String, Vec<(String, Pref)>)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    /// Declare a group. `name` is converted to the group key; `label` is for display.
    pub fn group<F>(mut self, name: impl Into<String>, label: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        let group = declare(GroupBuilder::default());
        self.groups.push((name.into(), label.into(), group.prefs));
        self
    }

    /// Register every declared group and produce the immutable schema.
    pub fn build(self) -> Result<PreferenceSchema> {
        let mut groups: Vec<PreferenceGroup> = Vec::with_capacity(self.groups.len());
        let mut index: HashMap<String, (usize, usize)> = HashMap::new();

        for (group_idx, (name, label, prefs)) in self.groups.into_iter().enumerate() {
            let group_key = to_snake(&name);
            if group_key.is_empty() {
                return Err(Error::SchemaConfiguration(format!(
                    "schema '{}' declares a group with an empty name",
                    self.name
                )));
            }
            if let Some(existing) = groups.iter().find(|g| g.key == group_key) {
                return Err(Error::SchemaConfiguration(format!(
                    "groups '{}' and '{}' both map to key '{}'",
                    existing.name, name, group_key
                )));
            }

            let mut registered = Vec::with_capacity(prefs.len());
            for (pref_idx, (key, mut pref)) in prefs.into_iter().enumerate() {
                if key.is_empty() {
                    return Err(Error::SchemaConfiguration(format!(
                        "group '{}' declares a preference with an empty key",
                        group_key
                    )));
                }
                if let Some(&(other, _)) = index.get(&key) {
                    let other_key = if other == group_idx {
                        group_key.as_str()
                    } else {
                        groups[other].key.as_str()
                    };
                    return Err(Error::SchemaConfiguration(format!(
                        "duplicate preference key '{}' in groups '{}' and '{}'",
                        key, other_key, group_key
                    )));
                }

                pref.stamp(&key, &group_key);
                check_bounds(&pref)?;
                if !pref.default_value().is_null() {
                    let default = coerce_and_validate(pref.default_value(), &pref).map_err(|e| {
                        Error::SchemaConfiguration(format!("invalid default for '{}': {}", key, e))
                    })?;
                    pref.set_default(default);
                }

                index.insert(key, (group_idx, pref_idx));
                registered.push(pref);
            }

            tracing::debug!(
                schema = %self.name,
                group = %group_key,
                preferences = registered.len(),
                "registered preference group"
            );
            groups.push(PreferenceGroup {
                key: group_key,
                name,
                label,
                prefs: registered,
            });
        }

        Ok(PreferenceSchema {
            name: self.name,
            groups,
            index,
        })
    }
}

/// Bounds must be numbers, and only numeric kinds may declare them.
fn check_bounds(pref: &Pref) -> Result<()> {
    for (name, bound) in [("ge", pref.ge()), ("le", pref.le())] {
        let Some(bound) = bound else { continue };
        if !bound.is_number() {
            return Err(Error::SchemaConfiguration(format!(
                "'{}' bound for '{}' must be a number, got {}",
                name,
                pref.key(),
                bound
            )));
        }
        if !pref.kind().is_numeric() {
            return Err(Error::SchemaConfiguration(format!(
                "'{}' bound on '{}' requires a numeric kind, not {}",
                name,
                pref.key(),
                pref.kind()
            )));
        }
    }
    Ok(())
}

/// Convert a CamelCase group name to snake_case.
///
/// Every uppercase letter after the first character starts a new word.
pub fn to_snake(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            result.push('_');
        }
        result.extend(ch.to_lowercase());
    }
    result
}
