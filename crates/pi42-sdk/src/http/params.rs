/*
[INPUT]:  Endpoint arguments (scalars) in call order
[OUTPUT]: Insertion-ordered parameter map + canonical query/JSON payloads
[POS]:    HTTP layer - canonical request representation for signing
[UPDATE]: When changing value rendering or canonical payload format
*/

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::http::Result;

/// Insertion-ordered request parameters.
///
/// The same instance produces both the transmitted payload and the signed
/// payload, so the two never diverge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    inner: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, replacing an existing key in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.inner.insert(key.into(), value.into());
        self
    }

    /// Insert only when a value is present
    pub fn insert_opt<V: Into<Value>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Insert a decimal as a JSON number
    pub fn insert_decimal(&mut self, key: impl Into<String>, value: Decimal) -> Result<&mut Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.insert(key, value))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Key/value pairs rendered the way they appear in a query string
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.inner
            .iter()
            .map(|(key, value)| (key.clone(), render_scalar(value)))
            .collect()
    }

    /// `k1=v1&k2=v2` in insertion order (signed payload for GET)
    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Compact JSON in insertion order (signed payload and body for POST/PUT/DELETE)
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.inner)?)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(inner: Map<String, Value>) -> Self {
        Self { inner }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
