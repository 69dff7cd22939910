//! SQL statements with bound parameters.

use super::Value;
use std::fmt::Write as _;

/// A SQL text plus positional parameter values.
///
/// Parameters are always sent to the warehouse as bindings; values are never
/// spliced into the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    /// Creates a statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends a positional parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound parameters, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Key identifying this statement in the result cache.
    ///
    /// Two statements share a key exactly when their SQL text and their
    /// parameter values (including the value kind) are equal.
    pub fn cache_key(&self) -> String {
        let mut key = self.sql.clone();
        for param in &self.params {
            key.push('\u{1f}');
            // Debug keeps the variant tag so Int(1) and String("1") differ
            let _ = write!(key, "{param:?}");
        }
        key
    }
}
