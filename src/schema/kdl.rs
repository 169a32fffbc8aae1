//! KDL schema files.
//!
//! Lets a schema be declared in a file instead of in code, which is how the
//! `prefs` binary loads its schema.
//!
//! # KDL Schema
//!
//! ```kdl
//! schema "BusinessPreferences"
//!
//! group "General" label="General Settings" {
//!     pref "receipt_footer" type="string" default="Thank you!" max-length=200
//! }
//!
//! group "Fuel" label="Fuel Settings" {
//!     pref "max_prepay_amount" type="integer" default=15000 ge=0 label="Max prepay (cents)"
//!     pref "default_grade" type="string" default="regular" {
//!         choice "regular" "Regular"
//!         choice "premium" "Premium"
//!     }
//!     pref "tags" type="list" {
//!         default "a" "b"
//!     }
//! }
//! ```
//!
//! `pref` properties: `type` (required), `default`, `label`, `help-text`,
//! `required`, `ge`, `le`, `max-length`. List defaults are written as a
//! `default` child node with one argument per element.

use super::{Pref, PreferenceSchema, SchemaBuilder, ValueKind};
use crate::{Error, Result};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde_json::{Number, Value};
use std::path::Path;

/// Build a schema from a parsed KDL document.
///
/// The document must contain exactly one `schema "Name"` node; `group` nodes
/// are registered in file order.
pub fn parse_schema(doc: &KdlDocument) -> Result<PreferenceSchema> {
    let mut name: Option<String> = None;
    let mut groups: Vec<(String, String, Vec<(String, Pref)>)> = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "schema" => {
                if name.is_some() {
                    return Err(Error::InvalidInput(
                        "schema node declared more than once".to_string(),
                    ));
                }
                name = Some(required_string_arg(node, "schema")?);
            }
            "group" => groups.push(parse_group_node(node)?),
            other => {
                return Err(Error::InvalidInput(format!(
                    "unknown top-level node '{}'",
                    other
                )));
            }
        }
    }

    let name = name
        .ok_or_else(|| Error::InvalidInput("missing `schema \"Name\"` node".to_string()))?;

    let mut builder = SchemaBuilder::new(name);
    for (group_name, label, prefs) in groups {
        builder = builder.group(group_name, label, |mut g| {
            for (key, pref) in prefs {
                g = g.add(key, pref);
            }
            g
        });
    }
    builder.build()
}

/// Parse KDL text into a schema.
pub fn parse_schema_str(content: &str) -> Result<PreferenceSchema> {
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Kdl(format!("Failed to parse schema: {}", e)))?;
    parse_schema(&doc)
}

/// Load a schema from a KDL file.
pub fn load_schema_from_file(path: &Path) -> Result<PreferenceSchema> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "schema file {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Kdl(format!("Failed to parse {}: {}", path.display(), e)))?;

    let schema = parse_schema(&doc)?;
    tracing::debug!(path = %path.display(), schema = %schema.name(), "loaded schema file");
    Ok(schema)
}

fn parse_group_node(node: &KdlNode) -> Result<(String, String, Vec<(String, Pref)>)> {
    let name = required_string_arg(node, "group")?;
    let mut label = name.clone();

    for entry in properties(node) {
        match property_name(entry) {
            "label" => label = string_value(entry, "label")?,
            other => {
                return Err(Error::InvalidInput(format!(
                    "unknown property '{}' on group '{}'",
                    other, name
                )));
            }
        }
    }

    let mut prefs = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "pref" => prefs.push(parse_pref_node(child)?),
                other => {
                    return Err(Error::InvalidInput(format!(
                        "unknown node '{}' in group '{}'",
                        other, name
                    )));
                }
            }
        }
    }

    Ok((name, label, prefs))
}

fn parse_pref_node(node: &KdlNode) -> Result<(String, Pref)> {
    let key = required_string_arg(node, "pref")?;

    let kind = properties(node)
        .find(|e| property_name(e) == "type")
        .map(|e| string_value(e, "type"))
        .transpose()?
        .ok_or_else(|| Error::InvalidInput(format!("pref '{}' is missing type=", key)))?;
    let kind = ValueKind::parse(&kind).ok_or_else(|| {
        Error::InvalidInput(format!("unknown type '{}' for pref '{}'", kind, key))
    })?;

    let mut pref = Pref::new(kind);
    let mut has_default = false;

    for entry in properties(node) {
        match property_name(entry) {
            "type" => {}
            "default" => {
                pref = pref.with_default(to_json(entry.value())?);
                has_default = true;
            }
            "label" => pref = pref.with_label(string_value(entry, "label")?),
            "help-text" => pref = pref.with_help_text(string_value(entry, "help-text")?),
            "required" => {
                let required = entry.value().as_bool().ok_or_else(|| {
                    Error::InvalidInput(format!("required= on '{}' must be #true or #false", key))
                })?;
                pref = pref.with_required(required);
            }
            "ge" => pref = pref.with_ge(to_json(entry.value())?),
            "le" => pref = pref.with_le(to_json(entry.value())?),
            "max-length" => {
                let max = entry
                    .value()
                    .as_integer()
                    .and_then(|i| usize::try_from(i).ok())
                    .ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "max-length on '{}' must be a non-negative integer",
                            key
                        ))
                    })?;
                pref = pref.with_max_length(max);
            }
            other => {
                return Err(Error::InvalidInput(format!(
                    "unknown property '{}' on pref '{}'",
                    other, key
                )));
            }
        }
    }

    let mut choices = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "choice" => {
                    let mut args = arguments(child);
                    let value = args
                        .next()
                        .map(|e| string_value(e, "choice"))
                        .transpose()?
                        .ok_or_else(|| {
                            Error::InvalidInput(format!("choice in '{}' needs a value", key))
                        })?;
                    let label = args
                        .next()
                        .map(|e| string_value(e, "choice"))
                        .transpose()?
                        .unwrap_or_else(|| value.clone());
                    choices.push((value, label));
                }
                "default" => {
                    if has_default {
                        return Err(Error::InvalidInput(format!(
                            "pref '{}' declares its default twice",
                            key
                        )));
                    }
                    let items = arguments(child)
                        .map(|e| to_json(e.value()))
                        .collect::<Result<Vec<_>>>()?;
                    pref = pref.with_default(Value::Array(items));
                    has_default = true;
                }
                other => {
                    return Err(Error::InvalidInput(format!(
                        "unknown node '{}' in pref '{}'",
                        other, key
                    )));
                }
            }
        }
    }
    if !choices.is_empty() {
        pref = pref.with_choices(choices);
    }

    Ok((key, pref))
}

/// Convert a KDL scalar to a JSON value.
fn to_json(value: &KdlValue) -> Result<Value> {
    match value {
        KdlValue::String(s) => Ok(Value::String(s.clone())),
        KdlValue::Integer(i) => i64::try_from(*i)
            .map(Value::from)
            .map_err(|_| Error::InvalidInput(format!("integer {} out of range", i))),
        KdlValue::Float(f) => Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| Error::InvalidInput(format!("float {} is not finite", f))),
        KdlValue::Bool(b) => Ok(Value::Bool(*b)),
        KdlValue::Null => Ok(Value::Null),
    }
}

fn arguments(node: &KdlNode) -> impl Iterator<Item = &KdlEntry> {
    node.entries().iter().filter(|e| e.name().is_none())
}

fn properties(node: &KdlNode) -> impl Iterator<Item = &KdlEntry> {
    node.entries().iter().filter(|e| e.name().is_some())
}

fn property_name(entry: &KdlEntry) -> &str {
    entry.name().map(|n| n.value()).unwrap_or_default()
}

fn string_value(entry: &KdlEntry, what: &str) -> Result<String> {
    entry
        .value()
        .as_string()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::InvalidInput(format!("{} must be a string", what)))
}

/// Get the first argument of a node as a string, or fail naming the node.
fn required_string_arg(node: &KdlNode, what: &str) -> Result<String> {
    arguments(node)
        .next()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::InvalidInput(format!("{} node must have a name argument", what)))
}
