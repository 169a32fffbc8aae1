//! Resolution proxy: typed access to one preference document.
//!
//! A [`PreferenceProxy`] binds a caller-owned [`Document`] (and optionally a
//! parent proxy over the same schema) to a [`PreferenceSchema`].
//!
//! ## Lookup order (highest to lowest)
//!
//! 1. The local document
//! 2. The parent proxy, resolved the same way
//! 3. The preference's schema default
//!
//! Resolution is re-evaluated on every call, so changes to a parent's document
//! show up in the child on its next read. Writes coerce and validate first and
//! leave the document untouched on failure.
//!
//! ## Ownership
//!
//! The document lives in a `RefCell` owned by the caller (typically a storage
//! record). Every proxy borrows that cell, so any number of views over the same
//! document observe each other's writes. A proxy never outlives its document.

use crate::schema::{Pref, PreferenceSchema};
use crate::validators::coerce_and_validate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::{Ref, RefCell, RefMut};

/// Maximum number of parents above a single proxy.
pub const MAX_INHERITANCE_DEPTH: usize = 16;

/// The persisted mapping of overridden preference keys to coerced values.
///
/// Never contains defaults or inherited values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a JSON object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::InvalidInput(format!(
                "preference data must be an object, got {}",
                other
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Object(doc.0)
    }
}

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Set in the proxy's own document
    Local,
    /// Set in an ancestor's document; 1 is the direct parent
    Parent(usize),
    /// Schema default
    Default,
}

impl ValueSource {
    pub fn is_inherited(&self) -> bool {
        !matches!(self, ValueSource::Local)
    }
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Local => write!(f, "local"),
            ValueSource::Parent(1) => write!(f, "parent"),
            ValueSource::Parent(level) => write!(f, "parent:{}", level),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Typed view over a preference document with parent fallback.
pub struct PreferenceProxy<'a> {
    schema: &'a PreferenceSchema,
    document: &'a RefCell<Document>,
    parent: Option<Box<PreferenceProxy<'a>>>,
}

impl<'a> PreferenceProxy<'a> {
    /// Create a proxy with no parent.
    pub fn new(schema: &'a PreferenceSchema, document: &'a RefCell<Document>) -> Self {
        Self {
            schema,
            document,
            parent: None,
        }
    }

    /// Fall back to `parent` for keys this document does not set.
    ///
    /// The child takes the parent view itself; the parent's document stays
    /// borrowed from its owner, so other views over it remain live. The parent
    /// must be declared against the same schema, and the resulting chain may
    /// not exceed [`MAX_INHERITANCE_DEPTH`].
    pub fn with_parent(mut self, parent: PreferenceProxy<'a>) -> Result<Self> {
        if !same_schema(self.schema, parent.schema) {
            return Err(Error::SchemaMismatch {
                child: self.schema.name().to_string(),
                parent: parent.schema.name().to_string(),
            });
        }
        let depth = parent.depth() + 1;
        if depth > MAX_INHERITANCE_DEPTH {
            return Err(Error::InheritanceTooDeep(MAX_INHERITANCE_DEPTH));
        }
        self.parent = Some(Box::new(parent));
        Ok(self)
    }

    pub fn schema(&self) -> &'a PreferenceSchema {
        self.schema
    }

    /// The borrowed document backing this proxy.
    pub fn document(&self) -> &'a RefCell<Document> {
        self.document
    }

    pub fn parent(&self) -> Option<&PreferenceProxy<'a>> {
        self.parent.as_deref()
    }

    /// Number of parents above this proxy.
    pub fn depth(&self) -> usize {
        self.parent.as_ref().map_or(0, |p| p.depth() + 1)
    }

    /// Resolved value of `key`: local, then parent, then default.
    pub fn get(&self, key: &str) -> Result<Value> {
        Ok(self.resolve(key)?.value)
    }

    /// Resolved value of `key` along with where it came from.
    pub fn resolve(&self, key: &str) -> Result<Resolved<Value>> {
        let pref = self.schema.require(key)?;
        self.lookup(pref, 0)
    }

    fn lookup(&self, pref: &Pref, level: usize) -> Result<Resolved<Value>> {
        if let Some(value) = self.read()?.get(pref.key()) {
            let source = if level == 0 {
                ValueSource::Local
            } else {
                ValueSource::Parent(level)
            };
            return Ok(Resolved::new(value.clone(), source));
        }
        match &self.parent {
            Some(parent) => parent.lookup(pref, level + 1),
            None => Ok(Resolved::new(
                pref.default_value().clone(),
                ValueSource::Default,
            )),
        }
    }

    /// Coerce, validate and store `value` as a local override.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let pref = self.schema.require(key)?;
        let coerced = coerce_and_validate(&value.into(), pref)?;
        tracing::trace!(schema = %self.schema.name(), key, value = %coerced, "set preference");
        self.write()?.insert(key, coerced);
        Ok(())
    }

    /// Set several keys at once. Nothing is written unless every pair is valid.
    pub fn update(&self, values: &Map<String, Value>) -> Result<()> {
        let mut coerced = Vec::with_capacity(values.len());
        for (key, value) in values {
            let pref = self.schema.require(key)?;
            coerced.push((key.clone(), coerce_and_validate(value, pref)?));
        }
        let mut doc = self.write()?;
        for (key, value) in coerced {
            doc.insert(key, value);
        }
        Ok(())
    }

    /// Drop the local override so the value is inherited again.
    pub fn reset(&self, key: &str) -> Result<()> {
        self.schema.require(key)?;
        if self.write()?.remove(key).is_some() {
            tracing::trace!(schema = %self.schema.name(), key, "reset preference");
        }
        Ok(())
    }

    /// True if `key` has no local override.
    pub fn is_inherited(&self, key: &str) -> Result<bool> {
        self.schema.require(key)?;
        Ok(!self.read()?.contains_key(key))
    }

    /// Copy of the local overrides only.
    pub fn to_dict(&self) -> Result<Document> {
        Ok(self.read()?.clone())
    }

    /// Every schema key with its resolved value, in declaration order.
    pub fn to_full_dict(&self) -> Result<Map<String, Value>> {
        let mut result = Map::new();
        for pref in self.schema.preferences() {
            result.insert(pref.key().to_string(), self.lookup(pref, 0)?.value);
        }
        Ok(result)
    }

    fn read(&self) -> Result<Ref<'a, Document>> {
        self.document.try_borrow().map_err(|_| Error::DocumentBusy)
    }

    fn write(&self) -> Result<RefMut<'a, Document>> {
        self.document.try_borrow_mut().map_err(|_| Error::DocumentBusy)
    }
}

impl std::fmt::Debug for PreferenceProxy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<PreferenceProxy({})", self.schema.name())?;
        match self.document.try_borrow() {
            Ok(doc) => write!(f, " {}>", Value::Object(doc.as_map().clone())),
            Err(_) => write!(f, " <busy>>"),
        }
    }
}

fn same_schema(a: &PreferenceSchema, b: &PreferenceSchema) -> bool {
    std::ptr::eq(a, b) || a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Pref;
    use crate::test_utils::{business_schema, simple_schema};
    use crate::validators::ValidationError;
    use serde_json::json;

    fn doc(value: Value) -> RefCell<Document> {
        RefCell::new(Document::from_json(value).unwrap())
    }

    // ==================== Document Tests ====================

    #[test]
    fn test_document_from_json_rejects_non_object() {
        assert!(Document::from_json(json!({"a": 1})).is_ok());
        let err = Document::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_document_serializes_transparently() {
        let d = Document::from_json(json!({"count": 3})).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), r#"{"count":3}"#);
        let back: Document = serde_json::from_str(r#"{"count":3}"#).unwrap();
        assert_eq!(back, d);
    }

    // ==================== ValueSource Tests ====================

    #[test]
    fn test_value_source_display() {
        assert_eq!(format!("{}", ValueSource::Local), "local");
        assert_eq!(format!("{}", ValueSource::Parent(1)), "parent");
        assert_eq!(format!("{}", ValueSource::Parent(3)), "parent:3");
        assert_eq!(format!("{}", ValueSource::Default), "default");
        assert!(!ValueSource::Local.is_inherited());
        assert!(ValueSource::Default.is_inherited());
    }

    // ==================== Get / Set Tests ====================

    #[test]
    fn test_returns_defaults_when_empty() {
        let schema = business_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        assert_eq!(proxy.get("store_name_on_receipt").unwrap(), json!(true));
        assert_eq!(proxy.get("receipt_footer").unwrap(), json!("Thank you!"));
        assert_eq!(proxy.get("prepay_enabled").unwrap(), json!(true));
        assert_eq!(proxy.get("max_prepay_amount").unwrap(), json!(15000));
        assert_eq!(proxy.get("default_grade").unwrap(), json!("regular"));
    }

    #[test]
    fn test_returns_explicit_value() {
        let schema = business_schema();
        let data = doc(json!({"prepay_enabled": false}));
        let proxy = PreferenceProxy::new(&schema, &data);
        assert_eq!(proxy.get("prepay_enabled").unwrap(), json!(false));
        assert_eq!(
            proxy.resolve("prepay_enabled").unwrap().source,
            ValueSource::Local
        );
    }

    #[test]
    fn test_set_writes_through_to_document() {
        let schema = business_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        proxy.set("max_prepay_amount", 300).unwrap();
        assert_eq!(proxy.get("max_prepay_amount").unwrap(), json!(300));
        assert_eq!(data.borrow().get("max_prepay_amount"), Some(&json!(300)));
    }

    #[test]
    fn test_set_coerces() {
        let schema = simple_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        proxy.set("count", "42").unwrap();
        let value = proxy.get("count").unwrap();
        assert_eq!(value, json!(42));
        assert!(value.is_i64());
    }

    #[test]
    fn test_set_null_stores_null_override() {
        let schema = simple_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        proxy.set("tags", Value::Null).unwrap();
        assert_eq!(proxy.get("tags").unwrap(), Value::Null);
        assert!(!proxy.is_inherited("tags").unwrap());
    }

    #[test]
    fn test_out_of_range_leaves_document_unchanged() {
        let schema = business_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        let err = proxy.set("max_prepay_amount", -1).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(data.borrow().is_empty());
        assert_eq!(proxy.get("max_prepay_amount").unwrap(), json!(15000));
    }

    #[test]
    fn test_large_integer_above_bound_rejected() {
        let schema = PreferenceSchema::builder("Large")
            .group("General", "General", |g| {
                g.add("n", Pref::integer().with_le(9007199254740992i64))
            })
            .build()
            .unwrap();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        let err = proxy.set("n", 9007199254740993i64).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(data.borrow().is_empty());
        proxy.set("n", 9007199254740992i64).unwrap();
        assert_eq!(proxy.get("n").unwrap(), json!(9007199254740992i64));
    }

    #[test]
    fn test_invalid_choice_rejected() {
        let schema = business_schema();
        let data = doc(json!({"default_grade": "mid"}));
        let proxy = PreferenceProxy::new(&schema, &data);
        let err = proxy.set("default_grade", "diesel").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidChoice { .. })
        ));
        assert_eq!(proxy.get("default_grade").unwrap(), json!("mid"));
    }

    #[test]
    fn test_coercion_error_leaves_document_unchanged() {
        let schema = simple_schema();
        let data = doc(json!({"count": 5}));
        let proxy = PreferenceProxy::new(&schema, &data);
        let err = proxy.set("count", "lots").unwrap_err();
        assert!(matches!(err, Error::Coercion(_)));
        assert_eq!(proxy.get("count").unwrap(), json!(5));
    }

    #[test]
    fn test_unknown_key_rejected_everywhere() {
        let schema = business_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        assert!(matches!(
            proxy.get("nonexistent"),
            Err(Error::UnknownPreference(_))
        ));
        assert!(matches!(
            proxy.set("nonexistent", "value"),
            Err(Error::UnknownPreference(_))
        ));
        assert!(matches!(
            proxy.reset("nonexistent"),
            Err(Error::UnknownPreference(_))
        ));
        assert!(matches!(
            proxy.is_inherited("nonexistent"),
            Err(Error::UnknownPreference(_))
        ));
        assert!(data.borrow().is_empty());
    }

    // ==================== Reset / Serialization Tests ====================

    #[test]
    fn test_reset_is_idempotent() {
        let schema = business_schema();
        let data = doc(json!({"prepay_enabled": false}));
        let proxy = PreferenceProxy::new(&schema, &data);
        proxy.reset("prepay_enabled").unwrap();
        assert_eq!(proxy.get("prepay_enabled").unwrap(), json!(true));
        let after_once = proxy.to_dict().unwrap();
        proxy.reset("prepay_enabled").unwrap();
        assert_eq!(proxy.to_dict().unwrap(), after_once);
        assert!(proxy.is_inherited("prepay_enabled").unwrap());
    }

    #[test]
    fn test_to_dict_only_local() {
        let schema = business_schema();
        let data = doc(json!({"prepay_enabled": false}));
        let proxy = PreferenceProxy::new(&schema, &data);
        assert_eq!(
            Value::from(proxy.to_dict().unwrap()),
            json!({"prepay_enabled": false})
        );
    }

    #[test]
    fn test_to_full_dict_includes_all_keys_in_order() {
        let schema = business_schema();
        let data = doc(json!({"receipt_footer": "Bye"}));
        let proxy = PreferenceProxy::new(&schema, &data);
        let full = proxy.to_full_dict().unwrap();
        let keys: Vec<_> = full.keys().map(String::as_str).collect();
        assert_eq!(keys, schema.keys().collect::<Vec<_>>());
        assert_eq!(full["receipt_footer"], json!("Bye"));
        assert_eq!(full["max_prepay_amount"], json!(15000));
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let schema = simple_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);

        let bad = json!({"enabled": "yes", "count": 500});
        let err = proxy.update(bad.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(data.borrow().is_empty());

        let good = json!({"enabled": "yes", "count": "7"});
        proxy.update(good.as_object().unwrap()).unwrap();
        assert_eq!(
            Value::from(proxy.to_dict().unwrap()),
            json!({"enabled": true, "count": 7})
        );
    }

    #[test]
    fn test_debug_names_schema() {
        let schema = business_schema();
        let data = doc(json!({"prepay_enabled": false}));
        let proxy = PreferenceProxy::new(&schema, &data);
        let repr = format!("{:?}", proxy);
        assert!(repr.contains("PreferenceProxy"));
        assert!(repr.contains("BusinessPreferences"));
        assert!(repr.contains("prepay_enabled"));
    }

    #[test]
    fn test_busy_document_reports_error() {
        let schema = business_schema();
        let data = doc(json!({}));
        let proxy = PreferenceProxy::new(&schema, &data);
        let _guard = data.borrow_mut();
        assert!(matches!(
            proxy.get("prepay_enabled"),
            Err(Error::DocumentBusy)
        ));
    }

    // ==================== Inheritance Tests ====================

    #[test]
    fn test_child_falls_back_to_parent() {
        let schema = business_schema();
        let parent_data = doc(json!({"prepay_enabled": false}));
        let child_data = doc(json!({}));
        let child = PreferenceProxy::new(&schema, &child_data)
            .with_parent(PreferenceProxy::new(&schema, &parent_data))
            .unwrap();
        assert_eq!(child.get("prepay_enabled").unwrap(), json!(false));
        assert!(child.is_inherited("prepay_enabled").unwrap());
        assert_eq!(
            child.resolve("prepay_enabled").unwrap().source,
            ValueSource::Parent(1)
        );
    }

    #[test]
    fn test_child_override_wins_and_parent_unaffected() {
        let schema = business_schema();
        let parent_data = doc(json!({"prepay_enabled": false}));
        let child_data = doc(json!({}));
        let child = PreferenceProxy::new(&schema, &child_data)
            .with_parent(PreferenceProxy::new(&schema, &parent_data))
            .unwrap();

        child.set("prepay_enabled", true).unwrap();
        assert!(!child.is_inherited("prepay_enabled").unwrap());
        assert_eq!(child.get("prepay_enabled").unwrap(), json!(true));
        assert_eq!(
            parent_data.borrow().get("prepay_enabled"),
            Some(&json!(false))
        );
    }

    #[test]
    fn test_child_falls_back_to_default_when_parent_unset() {
        let schema = business_schema();
        let parent_data = doc(json!({}));
        let child_data = doc(json!({}));
        let child = PreferenceProxy::new(&schema, &child_data)
            .with_parent(PreferenceProxy::new(&schema, &parent_data))
            .unwrap();
        assert_eq!(child.get("prepay_enabled").unwrap(), json!(true));
        assert_eq!(
            child.resolve("prepay_enabled").unwrap().source,
            ValueSource::Default
        );
    }

    #[test]
    fn test_reset_restores_inheritance() {
        let schema = business_schema();
        let parent_data = doc(json!({"max_prepay_amount": 500}));
        let child_data = doc(json!({"max_prepay_amount": 100}));
        let child = PreferenceProxy::new(&schema, &child_data)
            .with_parent(PreferenceProxy::new(&schema, &parent_data))
            .unwrap();
        assert_eq!(child.get("max_prepay_amount").unwrap(), json!(100));
        child.reset("max_prepay_amount").unwrap();
        assert_eq!(child.get("max_prepay_amount").unwrap(), json!(500));
        assert!(child.is_inherited("max_prepay_amount").unwrap());
    }

    #[test]
    fn test_to_dict_excludes_inherited() {
        let schema = business_schema();
        let parent_data = doc(json!({"prepay_enabled": false}));
        let child_data = doc(json!({"max_prepay_amount": 100}));
        let child = PreferenceProxy::new(&schema, &child_data)
            .with_parent(PreferenceProxy::new(&schema, &parent_data))
            .unwrap();
        assert_eq!(
            Value::from(child.to_dict().unwrap()),
            json!({"max_prepay_amount": 100})
        );
        let full = child.to_full_dict().unwrap();
        assert_eq!(full["prepay_enabled"], json!(false));
        assert_eq!(full["max_prepay_amount"], json!(100));
    }

    #[test]
    fn test_parent_changes_reflected_in_child() {
        let schema = business_schema();
        let parent_data = doc(json!({"prepay_enabled": false}));
        let child_data = doc(json!({}));
        let child = PreferenceProxy::new(&schema, &child_data)
            .with_parent(PreferenceProxy::new(&schema, &parent_data))
            .unwrap();
        assert_eq!(child.get("prepay_enabled").unwrap(), json!(false));

        // A separate view over the parent's document.
        PreferenceProxy::new(&schema, &parent_data)
            .set("prepay_enabled", true)
            .unwrap();
        assert_eq!(child.get("prepay_enabled").unwrap(), json!(true));

        child.parent().unwrap().reset("prepay_enabled").unwrap();
        parent_data
            .borrow_mut()
            .insert("max_prepay_amount", json!(1));
        assert_eq!(child.get("max_prepay_amount").unwrap(), json!(1));
    }

    #[test]
    fn test_grandparent_chain() {
        let schema = business_schema();
        let top = doc(json!({"receipt_footer": "Top"}));
        let middle = doc(json!({}));
        let bottom = doc(json!({}));
        let parent = PreferenceProxy::new(&schema, &middle)
            .with_parent(PreferenceProxy::new(&schema, &top))
            .unwrap();
        let child = PreferenceProxy::new(&schema, &bottom)
            .with_parent(parent)
            .unwrap();
        assert_eq!(child.depth(), 2);
        let resolved = child.resolve("receipt_footer").unwrap();
        assert_eq!(resolved.value, json!("Top"));
        assert_eq!(resolved.source, ValueSource::Parent(2));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let business = business_schema();
        let simple = simple_schema();
        let a = doc(json!({}));
        let b = doc(json!({}));
        let err = PreferenceProxy::new(&business, &a)
            .with_parent(PreferenceProxy::new(&simple, &b))
            .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_equal_schema_copies_are_compatible() {
        let one = business_schema();
        let two = business_schema();
        let a = doc(json!({}));
        let b = doc(json!({"receipt_footer": "Hi"}));
        let child = PreferenceProxy::new(&one, &a)
            .with_parent(PreferenceProxy::new(&two, &b))
            .unwrap();
        assert_eq!(child.get("receipt_footer").unwrap(), json!("Hi"));
    }

    #[test]
    fn test_depth_limit() {
        let schema = PreferenceSchema::builder("Deep")
            .group("General", "General", |g| g.add("x", Pref::integer()))
            .build()
            .unwrap();
        let docs: Vec<_> = (0..=MAX_INHERITANCE_DEPTH + 1)
            .map(|_| doc(json!({})))
            .collect();

        let mut proxy = PreferenceProxy::new(&schema, &docs[0]);
        for d in &docs[1..=MAX_INHERITANCE_DEPTH] {
            proxy = PreferenceProxy::new(&schema, d).with_parent(proxy).unwrap();
        }
        assert_eq!(proxy.depth(), MAX_INHERITANCE_DEPTH);

        let err = PreferenceProxy::new(&schema, &docs[MAX_INHERITANCE_DEPTH + 1])
            .with_parent(proxy)
            .unwrap_err();
        assert!(matches!(err, Error::InheritanceTooDeep(_)));
    }
}
