//! Schema and value export for form generation and API layers.
//!
//! The exported structures serialize to the JSON shape consumers render forms
//! from: optional fields (`help_text`, `choices`, bounds, `max_length`) are
//! omitted entirely when a preference does not declare them.

use crate::proxy::PreferenceProxy;
use crate::schema::{Pref, PreferenceGroup, PreferenceSchema};
use crate::Result;
use serde::Serialize;
use serde_json::Value;

/// One allowed value of a choice preference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceDescription {
    pub value: String,
    pub label: String,
}

/// Serializable description of a single preference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceDescription {
    pub key: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub default: Value,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceDescription>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ge: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub le: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl From<&Pref> for PreferenceDescription {
    fn from(pref: &Pref) -> Self {
        Self {
            key: pref.key().to_string(),
            type_name: pref.type_name().to_string(),
            default: pref.default_value().clone(),
            label: pref.label().to_string(),
            required: pref.is_required(),
            help_text: Some(pref.help_text())
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            choices: pref.choices().map(|choices| {
                choices
                    .iter()
                    .map(|c| ChoiceDescription {
                        value: c.value.clone(),
                        label: c.label.clone(),
                    })
                    .collect()
            }),
            ge: pref.ge().cloned(),
            le: pref.le().cloned(),
            max_length: pref.max_length(),
        }
    }
}

/// Serializable description of a preference group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDescription {
    pub key: String,
    pub label: String,
    pub preferences: Vec<PreferenceDescription>,
}

impl From<&PreferenceGroup> for GroupDescription {
    fn from(group: &PreferenceGroup) -> Self {
        Self {
            key: group.key().to_string(),
            label: group.label().to_string(),
            preferences: group
                .preferences()
                .iter()
                .map(PreferenceDescription::from)
                .collect(),
        }
    }
}

/// The resolved value of one preference on a proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceValue {
    pub key: String,
    pub value: Value,
    pub is_inherited: bool,
}

/// Describe every group and preference of a schema, in declaration order.
pub fn export_schema(schema: &PreferenceSchema) -> Vec<GroupDescription> {
    schema.groups().iter().map(GroupDescription::from).collect()
}

/// Resolved value and inheritance flag for every key of the proxy's schema.
pub fn export_values(proxy: &PreferenceProxy<'_>) -> Result<Vec<PreferenceValue>> {
    proxy
        .schema()
        .keys()
        .map(|key| {
            let resolved = proxy.resolve(key)?;
            Ok(PreferenceValue {
                key: key.to_string(),
                value: resolved.value,
                is_inherited: resolved.source.is_inherited(),
            })
        })
        .collect()
}
