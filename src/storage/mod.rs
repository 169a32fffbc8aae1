//! Storage layer for preference records.
//!
//! A record is one domain object's preference document plus the links needed
//! to find its parent. Records are persisted through a [`StorageBackend`]; the
//! stored mapping holds overrides only and is written verbatim.
//!
//! ## Inheritance paths
//!
//! Each record may name related records (`business -> "acme"`) and an
//! `inherits_from` path walked through those relations. A store declaring
//! `inherits_from = "business.chain"` inherits from whatever record its
//! business's `chain` relation names.

pub mod backend;

pub use backend::{BackendType, FileBackend, MemoryBackend, RecordMap, StorageBackend};

use crate::proxy::{Document, PreferenceProxy};
use crate::schema::PreferenceSchema;
use crate::validators::coerce_and_validate;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;

/// One domain object's preferences and relationships.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inherits_from: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    relations: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    preferences: RefCell<Document>,
}

/// A stored `"preferences": null` reads as an empty document.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<RefCell<Document>, D::Error>
where
    D: Deserializer<'de>,
{
    let doc = Option::<Document>::deserialize(deserializer)?;
    Ok(RefCell::new(doc.unwrap_or_default()))
}

impl Record {
    pub fn new(inherits_from: Option<String>) -> Self {
        Self {
            inherits_from,
            ..Default::default()
        }
    }

    /// Dotted relationship path to the parent record.
    pub fn inherits_from(&self) -> Option<&str> {
        self.inherits_from.as_deref()
    }

    /// Relation name to record name.
    pub fn relations(&self) -> &BTreeMap<String, String> {
        &self.relations
    }

    pub(crate) fn relations_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.relations
    }

    /// The record's own document. Proxies borrow this cell.
    pub fn preferences(&self) -> &RefCell<Document> {
        &self.preferences
    }
}

/// Validate a whole mapping against a schema.
///
/// Unknown keys fail with [`Error::UnknownPreference`]; every other pair is
/// coerced and validated. Returns the coerced mapping.
pub fn validate_document(schema: &PreferenceSchema, values: &Map<String, Value>) -> Result<Document> {
    let mut coerced = Document::new();
    for (key, value) in values {
        let pref = schema.require(key)?;
        coerced.insert(key.clone(), coerce_and_validate(value, pref)?);
    }
    Ok(coerced)
}

/// Storage manager: a schema, its records, and where they persist.
pub struct Storage {
    backend: Box<dyn StorageBackend>,
    schema: PreferenceSchema,
    records: RecordMap,
}

impl Storage {
    /// Load every record from `backend`, validating each document against `schema`.
    pub fn open(backend: Box<dyn StorageBackend>, schema: PreferenceSchema) -> Result<Self> {
        let mut records = backend.read_records()?;
        for (name, record) in records.iter_mut() {
            let doc = record.preferences.get_mut();
            let coerced = validate_document(&schema, doc.as_map()).inspect_err(|e| {
                tracing::warn!(record = %name, error = %e, "stored preferences are invalid");
            })?;
            *doc = coerced;
        }

        tracing::debug!(
            location = %backend.location(),
            backend = %backend.backend_type(),
            records = records.len(),
            "opened preference storage"
        );
        Ok(Self {
            backend,
            schema,
            records,
        })
    }

    pub fn schema(&self) -> &PreferenceSchema {
        &self.schema
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    /// Record names in sorted order.
    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn record(&self, name: &str) -> Result<&Record> {
        self.records
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("record '{}'", name)))
    }

    /// Create an empty record.
    ///
    /// Relation targets must already exist. An `inherits_from` path may name
    /// relations that are linked later; until then the record has no parent.
    pub fn create_record(
        &mut self,
        name: &str,
        inherits_from: Option<String>,
        relations: BTreeMap<String, String>,
    ) -> Result<&Record> {
        if name.is_empty() {
            return Err(Error::InvalidInput("record name cannot be empty".to_string()));
        }
        if self.records.contains_key(name) {
            return Err(Error::AlreadyExists(format!("record '{}'", name)));
        }
        for target in relations.values() {
            self.record(target)?;
        }

        let record = Record {
            inherits_from,
            relations,
            preferences: RefCell::default(),
        };
        self.records.insert(name.to_string(), record);
        if let Err(e) = self.parent_name(name) {
            self.records.remove(name);
            return Err(e);
        }

        tracing::debug!(record = name, "created preference record");
        self.record(name)
    }

    /// Point `relation` on record `name` at `target`.
    pub fn link(&mut self, name: &str, relation: &str, target: &str) -> Result<()> {
        self.record(target)?;
        let record = self
            .records
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("record '{}'", name)))?;
        record
            .relations_mut()
            .insert(relation.to_string(), target.to_string());
        tracing::debug!(record = name, relation, target, "linked records");
        Ok(())
    }

    /// Remove a record that no other record relates to.
    pub fn remove_record(&mut self, name: &str) -> Result<Record> {
        self.record(name)?;
        if let Some((other, _)) = self
            .records
            .iter()
            .find(|(other, r)| other.as_str() != name && r.relations.values().any(|t| t == name))
        {
            return Err(Error::InvalidInput(format!(
                "record '{}' is still related to by '{}'",
                name, other
            )));
        }
        self.records
            .remove(name)
            .ok_or_else(|| Error::NotFound(format!("record '{}'", name)))
    }

    /// Name of the record that `name` inherits from, if any.
    ///
    /// A relation missing anywhere along the path means no parent, so lookups
    /// fall back to schema defaults. A relation naming a record that does not
    /// exist is [`Error::NotFound`].
    pub fn parent_name(&self, name: &str) -> Result<Option<String>> {
        let record = self.record(name)?;
        let Some(path) = record.inherits_from.as_deref() else {
            return Ok(None);
        };

        let mut current = name;
        for segment in path.split('.') {
            let Some(next) = self.record(current)?.relations.get(segment) else {
                tracing::debug!(record = name, path, segment, "relation not set, no parent");
                return Ok(None);
            };
            current = next.as_str();
        }
        self.record(current)?;
        Ok(Some(current.to_string()))
    }

    /// Replace a record's whole document after validating every pair.
    pub fn replace_preferences(&self, name: &str, values: &Map<String, Value>) -> Result<()> {
        let record = self.record(name)?;
        let coerced = validate_document(&self.schema, values)?;
        *record
            .preferences
            .try_borrow_mut()
            .map_err(|_| Error::DocumentBusy)? = coerced;
        Ok(())
    }

    /// Proxy over record `name`, with its parent chain wired from `inherits_from`.
    pub fn proxy(&self, name: &str) -> Result<PreferenceProxy<'_>> {
        let mut chain = vec![name.to_string()];
        while let Some(parent) = self.parent_name(&chain[chain.len() - 1])? {
            if chain.contains(&parent) {
                chain.push(parent);
                return Err(Error::InheritanceCycle(chain.join(" -> ")));
            }
            chain.push(parent);
        }

        let mut proxy: Option<PreferenceProxy<'_>> = None;
        for record_name in chain.iter().rev() {
            let view = PreferenceProxy::new(&self.schema, self.record(record_name)?.preferences());
            proxy = Some(match proxy {
                Some(parent) => view.with_parent(parent)?,
                None => view,
            });
        }
        proxy.ok_or_else(|| Error::NotFound(format!("record '{}'", name)))
    }

    /// Persist every record through the backend.
    pub fn save(&mut self) -> Result<()> {
        self.backend.write_records(&self.records)?;
        tracing::debug!(
            location = %self.backend.location(),
            records = self.records.len(),
            "saved preference storage"
        );
        Ok(())
    }
}
