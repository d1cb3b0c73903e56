//! Cache keys for stored pages.
//!
//! Params are compared by value: they are serialized to JSON with object keys
//! sorted at every depth, so two differently built but equal params produce
//! the same key. Params must be plain serializable data for this to hold.

use crate::error::Result;
use crate::page::PaginationArgs;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Identity of one cached page: namespace, pagination and params.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    namespace: String,
    page: u32,
    page_size: u32,
    params: String,
}

impl CacheKey {
    /// Build a key, canonicalizing `params`.
    pub fn new<P: Serialize + ?Sized>(
        namespace: &str,
        args: PaginationArgs,
        params: Option<&P>,
    ) -> Result<Self> {
        let params = match params {
            Some(params) => canonical_json(&serde_json::to_value(params)?),
            None => canonical_json(&Value::Null),
        };
        Ok(Self {
            namespace: namespace.to_string(),
            page: args.page,
            page_size: args.page_size,
            params,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pagination_args(&self) -> PaginationArgs {
        PaginationArgs::new(self.page, self.page_size)
    }

    /// Canonical JSON of the params component.
    pub fn params(&self) -> &str {
        &self.params
    }

    /// Key within the namespace, used by stores that index on it.
    pub fn entry_key(&self) -> String {
        format!("{}:{}:{}", self.page, self.page_size, self.params)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.entry_key())
    }
}

/// Serialize a JSON value with object keys sorted recursively.
pub(crate) fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
