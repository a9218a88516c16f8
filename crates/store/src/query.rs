//! Conjunctive equality queries: `field==value [AND field==value]*`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use crate::error::StoreError;

const AND: &str = " AND ";

/// A conjunction of `field==value` clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<(String, String)>,
}

impl Query {
    /// Creates an empty query that matches every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `field==value` clause.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.clauses.push((field.into(), value.to_string()));
        self
    }

    /// Joins two queries with AND.
    #[must_use]
    pub fn and(mut self, other: Self) -> Self {
        self.clauses.extend(other.clauses);
        self
    }

    /// Returns the clauses in order.
    #[must_use]
    pub fn clauses(&self) -> &[(String, String)] {
        &self.clauses
    }

    /// Returns true if the query has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Value required for `field`, if constrained.
    #[must_use]
    pub fn value_of(&self, field: &str) -> Option<&str> {
        self.clauses
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Evaluates the query against the camelCase JSON form of `record`.
    ///
    /// Missing and null fields never match.
    #[must_use]
    pub fn matches<T: Serialize>(&self, record: &T) -> bool {
        let Ok(value) = serde_json::to_value(record) else {
            return false;
        };
        self.clauses.iter().all(|(field, expected)| {
            match value.get(field) {
                Some(Value::String(actual)) => actual == expected,
                Some(Value::Null) | None => false,
                Some(other) => other.to_string() == *expected,
            }
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, value)) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(AND)?;
            }
            if value.chars().any(char::is_whitespace) {
                write!(f, "{field}==\"{value}\"")?;
            } else {
                write!(f, "{field}=={value}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Query {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::new());
        }
        s.split(AND)
            .map(|clause| {
                let (field, value) = clause
                    .split_once("==")
                    .ok_or_else(|| StoreError::InvalidQuery(clause.to_string()))?;
                let field = field.trim();
                if field.is_empty() {
                    return Err(StoreError::InvalidQuery(clause.to_string()));
                }
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Ok((field.to_string(), value.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|clauses| Self { clauses })
    }
}
