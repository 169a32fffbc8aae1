//! Preference descriptors.
//!
//! A [`Pref`] is the definition of one named, typed setting: its default,
//! display metadata and constraints. Descriptors are built with the `with_*`
//! methods and handed to a [`super::SchemaBuilder`]; registration stamps the
//! key and group key, after which the descriptor is read-only.

use serde_json::Value;

/// The value kind a preference coerces its input to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
    /// A list of strings.
    List,
    /// Untyped: values pass through coercion unchanged.
    #[default]
    Any,
}

impl ValueKind {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "boolean" | "bool" => Some(ValueKind::Boolean),
            "integer" | "int" => Some(ValueKind::Integer),
            "float" | "number" => Some(ValueKind::Float),
            "string" | "str" => Some(ValueKind::String),
            "list" | "array" => Some(ValueKind::List),
            "any" => Some(ValueKind::Any),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Any => "any",
        }
    }

    /// Whether `ge`/`le` bounds apply to values of this kind.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One allowed value of a choice preference, with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl<V: Into<String>, L: Into<String>> From<(V, L)> for Choice {
    fn from((value, label): (V, L)) -> Self {
        Choice::new(value, label)
    }
}

/// Descriptor for a single preference.
#[derive(Debug, Clone, PartialEq)]
pub struct Pref {
    kind: ValueKind,
    default: Value,
    label: String,
    help_text: String,
    required: bool,
    choices: Option<Vec<Choice>>,
    ge: Option<Value>,
    le: Option<Value>,
    max_length: Option<usize>,
    key: String,
    group_key: String,
}

impl Pref {
    /// Create a descriptor of the given kind with no default and no constraints.
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            default: Value::Null,
            label: String::new(),
            help_text: String::new(),
            required: false,
            choices: None,
            ge: None,
            le: None,
            max_length: None,
            key: String::new(),
            group_key: String::new(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(ValueKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(ValueKind::Integer)
    }

    pub fn float() -> Self {
        Self::new(ValueKind::Float)
    }

    pub fn string() -> Self {
        Self::new(ValueKind::String)
    }

    pub fn list() -> Self {
        Self::new(ValueKind::List)
    }

    /// Set the default value (`null` when absent).
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_help_text(mut self, help_text: impl Into<String>) -> Self {
        self.help_text = help_text.into();
        self
    }

    /// Mark whether a resolved `null` is an error.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Restrict values to the given `(value, label)` pairs, in order.
    pub fn with_choices<C, I>(mut self, choices: I) -> Self
    where
        C: Into<Choice>,
        I: IntoIterator<Item = C>,
    {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Inclusive lower bound. Must be a number; checked at registration.
    pub fn with_ge(mut self, bound: impl Into<Value>) -> Self {
        self.ge = Some(bound.into());
        self
    }

    /// Inclusive upper bound. Must be a number; checked at registration.
    pub fn with_le(mut self, bound: impl Into<Value>) -> Self {
        self.le = Some(bound.into());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn choices(&self) -> Option<&[Choice]> {
        self.choices.as_deref()
    }

    pub fn ge(&self) -> Option<&Value> {
        self.ge.as_ref()
    }

    pub fn le(&self) -> Option<&Value> {
        self.le.as_ref()
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// The preference key. Empty until the descriptor is registered.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key of the owning group. Empty until the descriptor is registered.
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    /// Type name reported to schema consumers.
    ///
    /// Choice preferences report `choice` (or `multi_choice` for lists);
    /// everything else maps its kind, with untyped preferences reported as `string`.
    pub fn type_name(&self) -> &'static str {
        if self.choices.as_ref().is_some_and(|c| !c.is_empty()) {
            if self.kind == ValueKind::List {
                return "multi_choice";
            }
            return "choice";
        }
        match self.kind {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::List => "array",
            ValueKind::Any => "string",
        }
    }

    /// Whether a value is one of the declared choices.
    pub(crate) fn allows_choice(&self, value: &Value) -> bool {
        match (&self.choices, value) {
            (None, _) => true,
            (Some(choices), Value::String(s)) => choices.iter().any(|c| &c.value == s),
            (Some(_), _) => false,
        }
    }

    pub(crate) fn stamp(&mut self, key: &str, group_key: &str) {
        self.key = key.to_string();
        self.group_key = group_key.to_string();
    }

    pub(crate) fn set_default(&mut self, default: Value) {
        self.default = default;
    }
}
