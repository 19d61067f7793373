//! Evaluation Engine - Recursive Schema Walk
//!
//! Validation failures are data, not exceptions. Every rule failure,
//! unresolved rule name, or shape mismatch becomes a report entry or a
//! silent graceful skip; `validate` always returns a report and never
//! faults for data-shape reasons.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::message::format_template;
use crate::registry::{RuleArgs, RuleDefinition, RuleOutcome, RuleRef, RuleRegistry};
use crate::schema::{Schema, SchemaEntry, SchemaNode};

/// Message reported when a schema names a rule the registry cannot
/// resolve. A misconfigured schema surfaces through the same channel as
/// any other failure.
pub const INVALID_RULE: &str = "invalid rule specified";

/// Error-map key used for rule failures with no path name, so every
/// failure stays addressable even for schema-less root-level rules.
pub const ROOT_KEY: &str = "*";

/// One failed rule invocation at one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub rule: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// Flat mapping from dotted data path to ordered failure list. Absence of
/// a key means that path is valid. Paths encode nesting: a root key, a
/// `parent.child` member, or a `parent.2` array element.
pub type ErrorMap = IndexMap<String, Vec<ResultEntry>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: ErrorMap,
}

impl ValidationReport {
    /// `valid` is derived, never computed independently: true iff the
    /// error map is empty.
    fn from_errors(errors: ErrorMap) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Merge `b` into `a`, concatenating entry lists on key collisions.
///
/// Later results append after earlier ones, so multiple element
/// sub-schemas targeting the same array accumulate per element path
/// instead of overwriting each other.
pub fn merge_error_maps(a: &mut ErrorMap, b: ErrorMap) {
    for (key, entries) in b {
        a.entry(key).or_default().extend(entries);
    }
}

/// Handle passed to every predicate.
///
/// `context` is the nearest enclosing data node (the immediate parent of
/// the value under test, or the array element itself), for cross-field
/// rules. `run_rule` lets predicates recurse into the engine, which is
/// how conform-style rules evaluate their sub-checks.
pub struct RuleContext<'a> {
    pub context: &'a Value,
    pub raw_args: &'a RuleArgs,
    engine: &'a Validator,
}

impl RuleContext<'_> {
    pub fn run_rule(&self, rule: &RuleRef, value: Option<&Value>, args: &RuleArgs) -> Vec<String> {
        self.engine.run_rule(self.context, rule, value, args)
    }
}

/// The validator: a rule registry plus the recursive evaluation engine.
///
/// Construction is the only mutation; a built validator is shareable
/// across threads and never mutates schemas or input objects.
pub struct Validator {
    rules: RuleRegistry,
}

impl Validator {
    /// Validator with the built-in rule catalog only.
    pub fn new() -> Self {
        Self {
            rules: RuleRegistry::new(),
        }
    }

    /// Validator with caller-supplied rules overlaid on the built-ins.
    /// A custom rule replaces a same-named built-in entirely.
    pub fn with_rules(custom: impl IntoIterator<Item = (String, RuleDefinition)>) -> Self {
        Self {
            rules: RuleRegistry::with_rules(custom),
        }
    }

    /// The merged rule set, exposed for inspection.
    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Validate an object against a schema.
    ///
    /// Invokes [`evaluate_object`](Self::evaluate_object) once per
    /// top-level schema key with the object itself as context and merges
    /// the per-key error maps.
    pub fn validate(&self, schema: &Schema, obj: &Value) -> ValidationReport {
        let mut errors = ErrorMap::new();
        for (key, node) in schema.fields() {
            let sub = self.evaluate_object(obj, node, obj.get(key.as_str()), key);
            merge_error_maps(&mut errors, sub);
        }
        ValidationReport::from_errors(errors)
    }

    /// Recursively evaluate one schema node against one value.
    ///
    /// `name` is the dotted path accumulated so far (empty at the root).
    /// Leaf rule failures land under `name` (or [`ROOT_KEY`] when empty);
    /// child schemas recurse into object members at `name.key` and into
    /// array elements at `name.index`. Recursion into null, absent, or
    /// non-container values is skipped silently - only sibling rules at
    /// the mismatched level itself still fire, so a wrongly-typed nested
    /// object never cascades into spurious errors for its descendants.
    pub fn evaluate_object(
        &self,
        context: &Value,
        node: &SchemaNode,
        value: Option<&Value>,
        name: &str,
    ) -> ErrorMap {
        let mut errors = ErrorMap::new();

        for (key, entry) in node.entries() {
            match entry {
                SchemaEntry::Rule { rule, args } => {
                    let messages = self.run_rule(context, rule, value, args);
                    if messages.is_empty() {
                        continue;
                    }

                    let path = if name.is_empty() {
                        ROOT_KEY.to_string()
                    } else {
                        name.to_string()
                    };
                    trace!(path = %path, rule = %key, failures = messages.len(), "rule failed");

                    // Two or more messages from one rule key stay
                    // individually addressable as key-0, key-1, ...
                    let disambiguate = messages.len() > 1;
                    let entry_args = self.entry_args(rule, args);
                    let slot = errors.entry(path).or_default();
                    for (index, result) in messages.into_iter().enumerate() {
                        let rule_id = if disambiguate {
                            format!("{key}-{index}")
                        } else {
                            key.clone()
                        };
                        slot.push(ResultEntry {
                            rule: rule_id,
                            result,
                            args: entry_args.clone(),
                        });
                    }
                }
                SchemaEntry::Nested(child) => match value {
                    Some(Value::Array(elements)) => {
                        for (index, element) in elements.iter().enumerate() {
                            let sub = self.evaluate_object(
                                element,
                                child,
                                Some(element),
                                &format!("{name}.{index}"),
                            );
                            merge_error_maps(&mut errors, sub);
                        }
                    }
                    None | Some(Value::Null) => {
                        // Absent or null: the whole branch is skipped. Any
                        // leaf rule siblings in this node have already run
                        // against the null value itself.
                        trace!(path = %name, child = %key, "skipping recursion into null/absent value");
                    }
                    Some(inner) => {
                        // Objects recurse into the named member. Wrongly
                        // typed values (scalars) recurse with an absent
                        // member, so rules attached at the child's own
                        // level still fire while its descendants stay
                        // silent - no cascade of spurious errors.
                        let path = if name.is_empty() {
                            key.clone()
                        } else {
                            format!("{name}.{key}")
                        };
                        let sub =
                            self.evaluate_object(inner, child, inner.get(key.as_str()), &path);
                        merge_error_maps(&mut errors, sub);
                    }
                },
            }
        }

        errors
    }

    /// Resolve and invoke a single rule against a value.
    ///
    /// Returns the list of failure messages: empty on pass or skip, one
    /// formatted message for a plain failure, or the predicate's own
    /// message list verbatim. An unresolvable name yields
    /// `["invalid rule specified"]` - a reportable outcome, not a fault.
    pub fn run_rule(
        &self,
        context: &Value,
        rule: &RuleRef,
        value: Option<&Value>,
        args: &RuleArgs,
    ) -> Vec<String> {
        let Some(def) = self.rules.resolve(rule) else {
            return vec![INVALID_RULE.to_string()];
        };

        // Gating: a literal `false` argument disables the rule for this
        // field, and null/absent values are skipped unless the rule opts
        // in. A skipped rule contributes nothing.
        if !def.always_run && args.is_disabled() {
            return Vec::new();
        }
        match value {
            None if !def.evaluate_undefined => return Vec::new(),
            Some(Value::Null) if !def.evaluate_null => return Vec::new(),
            _ => {}
        }

        let positional = args.normalize(def.arg_array);
        let ctx = RuleContext {
            context,
            raw_args: args,
            engine: self,
        };

        match (def.func)(value, &positional, &ctx) {
            RuleOutcome::Passed => Vec::new(),
            RuleOutcome::Failed => vec![format_template(&def.message, &positional)],
            RuleOutcome::Messages(messages) => messages,
        }
    }

    /// Args echoed into a result entry: the literal configured value,
    /// unless the definition opts out via `include_args: false`.
    fn entry_args(&self, rule: &RuleRef, args: &RuleArgs) -> Option<Value> {
        let def = self.rules.resolve(rule)?;
        if !def.include_args {
            return None;
        }
        args.literal().cloned()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
