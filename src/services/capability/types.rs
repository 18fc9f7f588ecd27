/*
 * Responsibility
 * - Capability / ConstraintValue の型定義 (token の `att` に入るデータ)
 * - serde 表現: { "cap": ..., "id": ..., <name>: number | string, ... }
 * - `id` も ConstraintValue として読む (数値の id は decode エラーではなく比較で落ちる)
 *
 * Capability はただのデータ。有効かどうかは chain との比較でしか決まらない。
 */
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the constraint that carries the resource scope.
pub const ID: &str = "id";

/// Name of the numeric constraint bounding how many bytes may be stored.
pub const STORAGE_LIMIT: &str = "storageLimit";

/// A single constraint value. Only numeric limits and string scopes are comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstraintValue {
    Limit(f64),
    Scope(String),
}

impl fmt::Display for ConstraintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // An omitted limit claim is reported as unbounded.
            Self::Limit(n) if n.is_infinite() => f.write_str("Infinity"),
            Self::Limit(n) => write!(f, "{}", n),
            Self::Scope(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ConstraintValue {
    fn from(value: f64) -> Self {
        Self::Limit(value)
    }
}

impl From<u64> for ConstraintValue {
    fn from(value: u64) -> Self {
        Self::Limit(value as f64)
    }
}

impl From<&str> for ConstraintValue {
    fn from(value: &str) -> Self {
        Self::Scope(value.to_string())
    }
}

impl From<String> for ConstraintValue {
    fn from(value: String) -> Self {
        Self::Scope(value)
    }
}

/// Operation name + resource scope + named constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub cap: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConstraintValue>,
    #[serde(flatten)]
    pub constraints: BTreeMap<String, ConstraintValue>,
}

impl Capability {
    pub fn new(cap: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            cap: cap.into(),
            id: Some(ConstraintValue::Scope(id.into())),
            constraints: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) a named constraint.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ConstraintValue>) -> Self {
        self.constraints.insert(name.into(), value.into());
        self
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} {}", self.cap, id),
            None => f.write_str(&self.cap),
        }
    }
}
