//! Command implementations for the `prefs` CLI.
//!
//! Each command returns a result type implementing [`Output`], which `main`
//! prints as JSON (default) or human-readable text. Commands that change a
//! record save the storage before returning.

use crate::introspection::{GroupDescription, PreferenceValue, export_schema, export_values};
use crate::schema::kdl::load_schema_from_file;
use crate::storage::{FileBackend, Storage};
use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Directory used when neither `--data-dir` nor `PREFS_DATA_DIR` is given.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("serial-preferences"))
        .ok_or_else(|| Error::Other("Could not determine a data directory".to_string()))
}

/// Load the schema and open file-backed storage for it.
pub fn open_storage(schema_path: &Path, data_dir: &Path) -> Result<Storage> {
    let schema = load_schema_from_file(schema_path)?;
    Storage::open(Box::new(FileBackend::new(data_dir)), schema)
}

/// Parse a CLI value as JSON, falling back to the raw string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

// === schema ===

#[derive(Serialize)]
#[serde(transparent)]
pub struct SchemaDescription {
    pub groups: Vec<GroupDescription>,
}

impl Output for SchemaDescription {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for group in &self.groups {
            lines.push(format!("{} [{}]", group.label, group.key));
            for pref in &group.preferences {
                let mut line = format!(
                    "  {} ({}) = {}",
                    pref.key,
                    pref.type_name,
                    display_value(&pref.default)
                );
                if !pref.label.is_empty() {
                    line.push_str(&format!("  {}", pref.label));
                }
                if pref.required {
                    line.push_str("  [required]");
                }
                lines.push(line);
                if let Some(choices) = &pref.choices {
                    let values: Vec<_> = choices.iter().map(|c| c.value.as_str()).collect();
                    lines.push(format!("      choices: {}", values.join(", ")));
                }
            }
        }
        if lines.is_empty() {
            return "Schema declares no preferences.".to_string();
        }
        lines.join("\n")
    }
}

/// Describe the schema at `schema_path`.
pub fn schema_describe(schema_path: &Path) -> Result<SchemaDescription> {
    let schema = load_schema_from_file(schema_path)?;
    Ok(SchemaDescription {
        groups: export_schema(&schema),
    })
}

// === record ===

#[derive(Serialize)]
pub struct RecordCreated {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Output for RecordCreated {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        match &self.parent {
            Some(parent) => format!("Created record {} (inherits from {})", self.name, parent),
            None => format!("Created record {}", self.name),
        }
    }
}

/// Create an empty record.
pub fn record_create(
    storage: &mut Storage,
    name: &str,
    inherits_from: Option<String>,
    relations: Vec<(String, String)>,
) -> Result<RecordCreated> {
    let relations: BTreeMap<String, String> = relations.into_iter().collect();
    storage.create_record(name, inherits_from.clone(), relations)?;
    let parent = storage.parent_name(name)?;
    storage.save()?;
    Ok(RecordCreated {
        name: name.to_string(),
        inherits_from,
        parent,
    })
}

#[derive(Serialize)]
pub struct RecordLinked {
    pub name: String,
    pub relation: String,
    pub target: String,
}

impl Output for RecordLinked {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Linked {}.{} -> {}", self.name, self.relation, self.target)
    }
}

/// Point a relation of `name` at `target`.
pub fn record_link(
    storage: &mut Storage,
    name: &str,
    relation: &str,
    target: &str,
) -> Result<RecordLinked> {
    storage.link(name, relation, target)?;
    storage.save()?;
    Ok(RecordLinked {
        name: name.to_string(),
        relation: relation.to_string(),
        target: target.to_string(),
    })
}

#[derive(Serialize)]
pub struct RecordSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, String>,
    pub overrides: usize,
}

#[derive(Serialize)]
pub struct RecordList {
    pub records: Vec<RecordSummary>,
    pub count: usize,
}

impl Output for RecordList {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        if self.records.is_empty() {
            return "No records.".to_string();
        }
        let mut lines = vec![format!("{} record(s):", self.count)];
        for record in &self.records {
            let mut line = format!("  {} ({} override(s))", record.name, record.overrides);
            if let Some(path) = &record.inherits_from {
                line.push_str(&format!(" inherits from {}", path));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// List all records.
pub fn record_list(storage: &Storage) -> Result<RecordList> {
    let mut records = Vec::new();
    for name in storage.record_names() {
        let record = storage.record(name)?;
        let overrides = record
            .preferences()
            .try_borrow()
            .map_err(|_| Error::DocumentBusy)?
            .len();
        records.push(RecordSummary {
            name: name.to_string(),
            inherits_from: record.inherits_from().map(str::to_string),
            relations: record.relations().clone(),
            overrides,
        });
    }
    let count = records.len();
    Ok(RecordList { records, count })
}

#[derive(Serialize)]
pub struct RecordRemoved {
    pub name: String,
    pub removed: bool,
}

impl Output for RecordRemoved {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("Removed record {}", self.name)
    }
}

/// Remove a record.
pub fn record_remove(storage: &mut Storage, name: &str) -> Result<RecordRemoved> {
    storage.remove_record(name)?;
    storage.save()?;
    Ok(RecordRemoved {
        name: name.to_string(),
        removed: true,
    })
}

// === get / set / reset ===

#[derive(Serialize)]
pub struct PrefValue {
    pub record: String,
    pub key: String,
    pub value: Value,
    pub source: String,
    pub is_inherited: bool,
}

impl Output for PrefValue {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!("{} = {} ({})", self.key, display_value(&self.value), self.source)
    }
}

/// Resolve one preference on a record.
pub fn pref_get(storage: &Storage, record: &str, key: &str) -> Result<PrefValue> {
    let proxy = storage.proxy(record)?;
    let resolved = proxy.resolve(key)?;
    Ok(PrefValue {
        record: record.to_string(),
        key: key.to_string(),
        is_inherited: resolved.source.is_inherited(),
        source: resolved.source.to_string(),
        value: resolved.value,
    })
}

#[derive(Serialize)]
pub struct PrefSet {
    pub record: String,
    pub key: String,
    pub value: Value,
    pub previous: Value,
}

impl Output for PrefSet {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        format!(
            "Set {}.{} = {} (was {})",
            self.record,
            self.key,
            display_value(&self.value),
            display_value(&self.previous)
        )
    }
}

/// Override a preference. `raw` is parsed with [`parse_value`].
pub fn pref_set(storage: &mut Storage, record: &str, key: &str, raw: &str) -> Result<PrefSet> {
    let (previous, value) = {
        let proxy = storage.proxy(record)?;
        let previous = proxy.get(key)?;
        proxy.set(key, parse_value(raw))?;
        (previous, proxy.get(key)?)
    };
    storage.save()?;
    Ok(PrefSet {
        record: record.to_string(),
        key: key.to_string(),
        value,
        previous,
    })
}

/// Remove an override and report the value now inherited.
pub fn pref_reset(storage: &mut Storage, record: &str, key: &str) -> Result<PrefValue> {
    storage.proxy(record)?.reset(key)?;
    storage.save()?;
    pref_get(storage, record, key)
}

// === show ===

#[derive(Serialize)]
pub struct RecordShow {
    pub record: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub preferences: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<PreferenceValue>>,
}

impl Output for RecordShow {
    fn to_json(&self) -> String {
        json_string(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![match &self.parent {
            Some(parent) => format!("{} (inherits from {})", self.record, parent),
            None => self.record.clone(),
        }];
        match &self.values {
            Some(values) => {
                for v in values {
                    let marker = if v.is_inherited { "inherited" } else { "set" };
                    lines.push(format!("  {} = {} ({})", v.key, display_value(&v.value), marker));
                }
            }
            None if self.preferences.is_empty() => lines.push("  (no overrides)".to_string()),
            None => {
                for (key, value) in &self.preferences {
                    lines.push(format!("  {} = {}", key, display_value(value)));
                }
            }
        }
        lines.join("\n")
    }
}

/// Show a record's overrides, or with `full` every resolved value.
pub fn record_show(storage: &Storage, record: &str, full: bool) -> Result<RecordShow> {
    let proxy = storage.proxy(record)?;
    let values = if full {
        Some(export_values(&proxy)?)
    } else {
        None
    };
    Ok(RecordShow {
        record: record.to_string(),
        parent: storage.parent_name(record)?,
        preferences: proxy.to_dict()?.into_inner(),
        values,
    })
}
