//! Schema Representation - Declarative Contracts
//!
//! A schema is a tree mixing rule applications and nested schemas. Each
//! key is classified structurally exactly once, at compile time: a JSON
//! object value describes a child schema, anything else is the argument
//! of the rule named by the key.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::registry::{RuleArgs, RuleDefinition, RuleRef};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Cannot read schema: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One classified schema key: a rule application or a nested schema.
#[derive(Debug, Clone)]
pub enum SchemaEntry {
    Rule { rule: RuleRef, args: RuleArgs },
    Nested(SchemaNode),
}

/// An ordered set of classified entries. Rule keys and child-schema keys
/// can sit side by side at the same level.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    entries: IndexMap<String, SchemaEntry>,
}

impl SchemaNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the named rule with literal JSON arguments. The key doubles
    /// as the rule name, as in the JSON schema form.
    pub fn rule(mut self, name: impl Into<String>, args: Value) -> Self {
        let name = name.into();
        self.entries.insert(
            name.clone(),
            SchemaEntry::Rule {
                rule: RuleRef::Named(name),
                args: RuleArgs::Value(args),
            },
        );
        self
    }

    /// Apply the named rule with inline sub-check blocks (conform-style).
    pub fn rule_blocks(
        mut self,
        name: impl Into<String>,
        blocks: Vec<RuleDefinition>,
    ) -> Self {
        let name = name.into();
        self.entries.insert(
            name.clone(),
            SchemaEntry::Rule {
                rule: RuleRef::Named(name),
                args: RuleArgs::Blocks(blocks),
            },
        );
        self
    }

    /// Apply a one-off inline rule definition under the given key. The key
    /// becomes the rule identifier in result entries.
    pub fn check(mut self, key: impl Into<String>, def: RuleDefinition) -> Self {
        self.entries.insert(
            key.into(),
            SchemaEntry::Rule {
                rule: RuleRef::Inline(def),
                args: RuleArgs::None,
            },
        );
        self
    }

    /// Attach a child schema. Against an object value it describes the
    /// member named by the key; against an array value it describes every
    /// element (the key itself never appears in element paths).
    pub fn nested(mut self, key: impl Into<String>, node: SchemaNode) -> Self {
        self.entries.insert(key.into(), SchemaEntry::Nested(node));
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &SchemaEntry)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify every key of a JSON node. Purely structural: any future
    /// rule whose argument is itself a JSON object would classify as a
    /// nested schema here; such rules are only expressible through the
    /// programmatic builder.
    pub fn compile(value: &Value) -> Self {
        let mut entries = IndexMap::new();
        if let Value::Object(map) = value {
            for (key, node) in map {
                let entry = match node {
                    Value::Object(_) => SchemaEntry::Nested(SchemaNode::compile(node)),
                    other => SchemaEntry::Rule {
                        rule: RuleRef::Named(key.clone()),
                        args: RuleArgs::Value(other.clone()),
                    },
                };
                entries.insert(key.clone(), entry);
            }
        }
        Self { entries }
    }
}

/// Top-level schema: an ordered map from field name to that field's node.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, SchemaNode>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.fields.insert(name.into(), node);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compile a JSON schema value. Malformed shapes degrade to empty
    /// nodes ("no rules matched") rather than erroring - validation always
    /// produces a report, never a fault, for data-shape reasons.
    pub fn compile(value: &Value) -> Self {
        let mut fields = IndexMap::new();
        if let Value::Object(map) = value {
            for (name, node) in map {
                if !node.is_object() {
                    debug!(field = %name, "top-level schema value is not an object; no rules matched");
                }
                fields.insert(name.clone(), SchemaNode::compile(node));
            }
        } else {
            debug!("schema root is not an object; compiling to empty schema");
        }
        Self { fields }
    }

    /// Load and compile a JSON schema file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        Ok(Self::compile(&value))
    }
}
