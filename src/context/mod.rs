//! Render contexts and data payload ingestion.
//!
//! A [`Context`] is an immutable, persistent map from property names to [`Value`]s. Entering a
//! range or a list-row iteration never mutates the enclosing context: it builds a child
//! context by copy-on-merge, and structural sharing in `im::HashMap` keeps that cheap. A
//! child is dropped when its branch returns, so nothing leaks to siblings or callers.
//!
//! A [`Payload`] is what the caller supplies for a whole workbook: either one context shared
//! by every sheet, or one context per sheet index.

use serde::{Serialize, Serializer};

use crate::diagnostics::Result;
use crate::{err_msg, SheetError};

pub mod value;

pub use value::{Mapping, Value};

// ============================================================================
// CONTEXT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context {
    vars: Mapping,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(vars: Mapping) -> Self {
        Self { vars }
    }

    /// Builds a context from any serializable value that serializes to a mapping.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        let json = serde_json::to_value(data)
            .map_err(|e| SheetError::payload("context data is not serializable", e))?;
        match Value::from(json) {
            Value::Map(vars) => Ok(Self { vars }),
            other => Err(err_msg!(
                Payload,
                "context must be a mapping, got {}",
                other.type_name()
            )),
        }
    }

    /// Returns this context with `key` bound to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn mapping(&self) -> &Mapping {
        &self.vars
    }

    /// Copies every key of `self`, then overwrites with every key of `local`.
    ///
    /// Local keys shadow outer keys of the same name; unrelated outer keys stay visible.
    pub fn merged(&self, local: &Context) -> Context {
        let mut vars = self.vars.clone();
        for (k, v) in local.vars.iter() {
            vars.insert(k.clone(), v.clone());
        }
        Context { vars }
    }

    /// A child context with `key` bound to `value`. `self` is left untouched.
    pub fn rebound(&self, key: &str, value: Value) -> Context {
        Context {
            vars: self.vars.update(key.to_string(), value),
        }
    }

    /// Context for one iteration of a range over `property`.
    ///
    /// The item's keys are merged over the enclosing context. The item is also bound under
    /// the singular form of `property`, unless the enclosing context already binds that name.
    pub(crate) fn enter_range(&self, property: &str, item: &Context) -> Context {
        match singular_alias(property) {
            Some(alias) if !self.contains(&alias) => self
                .rebound(&alias, Value::Map(item.vars.clone()))
                .merged(item),
            _ => self.merged(item),
        }
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolves `property` as a list of sub-contexts.
    ///
    /// Returns `None` when the property is absent, not a list, or holds any element that is
    /// not a mapping. An empty list resolves to zero sub-contexts.
    pub fn range_contexts(&self, property: &str) -> Option<Vec<Context>> {
        let items = self.vars.get(property)?.as_list()?;
        items
            .iter()
            .map(|item| item.as_map().map(|m| Context::from_mapping(m.clone())))
            .collect()
    }

    /// True when `property` is bound to a list of any element type.
    pub fn is_array_property(&self, property: &str) -> bool {
        self.array_items(property).is_some()
    }

    pub fn array_items(&self, property: &str) -> Option<&[Value]> {
        self.vars.get(property)?.as_list()
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        value::serialize_mapping(&self.vars, serializer)
    }
}

impl From<Mapping> for Context {
    fn from(vars: Mapping) -> Self {
        Self { vars }
    }
}

/// Singular form of a plural property name (`employees` -> `employee`,
/// `categories` -> `category`, `boxes` -> `box`). `None` when no suffix rule applies.
pub fn singular_alias(property: &str) -> Option<String> {
    if property.len() < 2 || !property.is_ascii() {
        return None;
    }
    if let Some(stem) = property.strip_suffix("ies") {
        if !stem.is_empty() {
            return Some(format!("{}y", stem));
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if property.ends_with(suffix) {
            return Some(property[..property.len() - 2].to_string());
        }
    }
    if property.ends_with("ss") || property.ends_with("us") || property.ends_with("is") {
        return None;
    }
    property
        .strip_suffix('s')
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

// ============================================================================
// PAYLOAD
// ============================================================================

/// Data supplied for a whole workbook render.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No data; every sheet renders against an empty context.
    #[default]
    Empty,
    /// One context applied to every sheet.
    Shared(Context),
    /// One context per sheet index. Missing or non-mapping entries get an empty context.
    PerSheet(Vec<Option<Context>>),
}

impl Payload {
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match Value::from(json) {
            Value::Nil => Ok(Payload::Empty),
            Value::Map(vars) => Ok(Payload::Shared(Context::from_mapping(vars))),
            Value::List(items) => Ok(Payload::PerSheet(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Map(vars) => Some(Context::from_mapping(vars)),
                        _ => None,
                    })
                    .collect(),
            )),
            other => Err(err_msg!(
                Payload,
                "data payload must be a mapping or a list of mappings, got {}",
                other.type_name()
            )),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| SheetError::payload("data payload is not valid JSON", e))?;
        Self::from_json(json)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let json: serde_json::Value = serde_yaml::from_str(text)
            .map_err(|e| SheetError::payload("data payload is not valid YAML", e))?;
        Self::from_json(json)
    }

    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        let json = serde_json::to_value(data)
            .map_err(|e| SheetError::payload("data payload is not serializable", e))?;
        Self::from_json(json)
    }

    /// The context the sheet at `index` renders against.
    pub fn context_for_sheet(&self, index: usize) -> Context {
        match self {
            Payload::Empty => Context::new(),
            Payload::Shared(ctx) => ctx.clone(),
            Payload::PerSheet(contexts) => contexts
                .get(index)
                .and_then(|ctx| ctx.clone())
                .unwrap_or_default(),
        }
    }
}

impl From<Context> for Payload {
    fn from(ctx: Context) -> Self {
        Payload::Shared(ctx)
    }
}

impl From<Vec<Context>> for Payload {
    fn from(contexts: Vec<Context>) -> Self {
        Payload::PerSheet(contexts.into_iter().map(Some).collect())
    }
}

#[cfg(test)]
mod context_unit_tests {
    use super::*;

    #[test]
    fn test_singular_alias_rules() {
        assert_eq!(singular_alias("employees").as_deref(), Some("employee"));
        assert_eq!(singular_alias("categories").as_deref(), Some("category"));
        assert_eq!(singular_alias("boxes").as_deref(), Some("box"));
        assert_eq!(singular_alias("branches").as_deref(), Some("branch"));
        assert_eq!(singular_alias("addresses").as_deref(), Some("address"));
        assert_eq!(singular_alias("status"), None);
        assert_eq!(singular_alias("class"), None);
        assert_eq!(singular_alias("data"), None);
        assert_eq!(singular_alias("s"), None);
    }

    #[test]
    fn test_rebound_leaves_parent_untouched() {
        let parent = Context::new().with("items", Value::List(vec![1i64.into(), 2i64.into()]));
        let child = parent.rebound("items", Value::from(1i64));
        assert_eq!(child.get("items"), Some(&Value::from(1i64)));
        assert!(parent.is_array_property("items"));
    }

    #[test]
    fn test_enter_range_alias_never_hides_outer_keys() {
        let item = Context::new().with("name", "Ann");

        let fresh = Context::new().with("title", "Staff");
        let child = fresh.enter_range("employees", &item);
        assert_eq!(
            child.get("employee").and_then(Value::as_map),
            Some(item.mapping())
        );
        assert_eq!(child.get("title"), Some(&Value::from("Staff")));

        let bound = Context::new().with("employee", "Boss");
        let child = bound.enter_range("employees", &item);
        assert_eq!(child.get("employee"), Some(&Value::from("Boss")));
        assert_eq!(child.get("name"), Some(&Value::from("Ann")));

        let own = Context::new().with("employee", "Ann's own");
        let child = Context::new().enter_range("employees", &own);
        assert_eq!(child.get("employee"), Some(&Value::from("Ann's own")));
    }
}
