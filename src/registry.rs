//! Rule Registry - Definitions, References, Resolution
//!
//! A rule is a predicate plus a message template plus gating flags.
//! The registry maps names to definitions and is immutable once built.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::RuleContext;

/// Outcome of a single predicate invocation.
///
/// `Failed` makes the engine format the rule's message template with its
/// positional arguments. `Messages` bypasses the template entirely: each
/// string is an independent failure, and an empty list means the rule
/// passed. This is how multi-check rules (conform-style) report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Passed,
    Failed,
    Messages(Vec<String>),
}

impl From<bool> for RuleOutcome {
    fn from(passed: bool) -> Self {
        if passed {
            RuleOutcome::Passed
        } else {
            RuleOutcome::Failed
        }
    }
}

/// Predicate signature shared by every rule.
///
/// The value is `None` when the field is absent from its parent, and
/// `Some(Value::Null)` when it is present but null - the two cases gate
/// independently via [`RuleDefinition::evaluate_undefined`] and
/// [`RuleDefinition::evaluate_null`].
pub type RuleFn = Arc<dyn Fn(Option<&Value>, &[Value], &RuleContext) -> RuleOutcome + Send + Sync>;

/// A named, reusable predicate plus failure message template.
///
/// Flag defaults: rules skip null and absent values, run unless their
/// configured argument is literally `false`, receive array arguments
/// spread positionally, and include their arguments in result entries.
#[derive(Clone)]
pub struct RuleDefinition {
    pub func: RuleFn,
    pub message: String,
    pub evaluate_null: bool,
    pub evaluate_undefined: bool,
    pub always_run: bool,
    pub arg_array: bool,
    pub include_args: bool,
}

impl RuleDefinition {
    pub fn new(
        message: impl Into<String>,
        func: impl Fn(Option<&Value>, &[Value], &RuleContext) -> RuleOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            func: Arc::new(func),
            message: message.into(),
            evaluate_null: false,
            evaluate_undefined: false,
            always_run: false,
            arg_array: false,
            include_args: true,
        }
    }
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("message", &self.message)
            .field("evaluate_null", &self.evaluate_null)
            .field("evaluate_undefined", &self.evaluate_undefined)
            .field("always_run", &self.always_run)
            .field("arg_array", &self.arg_array)
            .field("include_args", &self.include_args)
            .finish_non_exhaustive()
    }
}

/// A rule as referenced from a schema: by registered name, or as an
/// inline definition carried directly in the schema entry.
#[derive(Debug, Clone)]
pub enum RuleRef {
    Named(String),
    Inline(RuleDefinition),
}

impl From<&str> for RuleRef {
    fn from(name: &str) -> Self {
        RuleRef::Named(name.to_string())
    }
}

impl From<String> for RuleRef {
    fn from(name: String) -> Self {
        RuleRef::Named(name)
    }
}

impl From<RuleDefinition> for RuleRef {
    fn from(def: RuleDefinition) -> Self {
        RuleRef::Inline(def)
    }
}

/// Arguments configured for a rule application.
///
/// `Value` is the literal JSON from the schema (`minLength: 4`,
/// `present: [...]`). `Blocks` carries inline sub-check definitions for
/// conform-style rules; those cannot be written in JSON and enter through
/// the programmatic schema builder.
#[derive(Debug, Clone, Default)]
pub enum RuleArgs {
    #[default]
    None,
    Value(Value),
    Blocks(Vec<RuleDefinition>),
}

impl RuleArgs {
    /// A literal `false` argument disables the rule for that field
    /// (unless the definition sets `always_run`).
    pub fn is_disabled(&self) -> bool {
        matches!(self, RuleArgs::Value(Value::Bool(false)))
    }

    /// Normalize to the positional list handed to predicates.
    ///
    /// Arrays spread into individual arguments unless `arg_array` is set,
    /// in which case the whole value is passed as a single argument (for
    /// rules whose argument is itself a collection, like membership).
    pub fn normalize(&self, arg_array: bool) -> Vec<Value> {
        match self {
            RuleArgs::None | RuleArgs::Blocks(_) => Vec::new(),
            RuleArgs::Value(value) => {
                if arg_array {
                    vec![value.clone()]
                } else {
                    match value {
                        Value::Array(items) => items.clone(),
                        other => vec![other.clone()],
                    }
                }
            }
        }
    }

    /// The literal argument value, if any, for inclusion in result entries.
    pub fn literal(&self) -> Option<&Value> {
        match self {
            RuleArgs::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for RuleArgs {
    fn from(value: Value) -> Self {
        RuleArgs::Value(value)
    }
}

/// Name -> definition mapping, built once from the built-in catalog plus
/// caller-supplied definitions, then never mutated.
pub struct RuleRegistry {
    rules: HashMap<String, RuleDefinition>,
}

impl RuleRegistry {
    /// Registry holding only the built-in catalog.
    pub fn new() -> Self {
        Self {
            rules: crate::rules::builtin_rules(),
        }
    }

    /// Overlay caller definitions on the built-ins. A custom rule with the
    /// same name as a built-in replaces it entirely.
    pub fn with_rules(custom: impl IntoIterator<Item = (String, RuleDefinition)>) -> Self {
        let mut rules = crate::rules::builtin_rules();
        rules.extend(custom);
        Self { rules }
    }

    /// Resolve a rule reference. Inline definitions resolve to themselves;
    /// names look up the registered definition, `None` if unknown.
    pub fn resolve<'a>(&'a self, rule: &'a RuleRef) -> Option<&'a RuleDefinition> {
        match rule {
            RuleRef::Named(name) => self.rules.get(name.as_str()),
            RuleRef::Inline(def) => Some(def),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RuleDefinition> {
        self.rules.get(name)
    }

    /// Registered rule names, sorted for stable presentation.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
