//! Schemaguard - Declarative Schema Validator
//!
//! # The Contract (Non-Negotiable)
//! 1. Failures Are Data, Never Exceptions
//! 2. Schemas Are Classified Once, Walked Read-Only
//! 3. Every Failure Has An Addressable Dotted Path
//! 4. Gating Before Execution (null / absent / disabled)
//! 5. Deterministic Report Ordering
//!
//! Given a tree-shaped schema of per-field rules and a candidate JSON
//! object, produce a report of every violation keyed by the dotted path
//! to the offending field:
//!
//! ```
//! use schemaguard::{Schema, Validator};
//! use serde_json::json;
//!
//! let schema = Schema::compile(&json!({"field": {"required": true}}));
//! let report = Validator::new().validate(&schema, &json!({"notfield": "value"}));
//!
//! assert!(!report.valid);
//! assert_eq!(report.errors["field"][0].result, "is required");
//! ```

pub mod engine;
pub mod message;
pub mod registry;
pub mod rules;
pub mod schema;

pub use engine::{
    merge_error_maps, ErrorMap, ResultEntry, RuleContext, ValidationReport, Validator,
    INVALID_RULE, ROOT_KEY,
};
pub use message::format_template;
pub use registry::{RuleArgs, RuleDefinition, RuleFn, RuleOutcome, RuleRef, RuleRegistry};
pub use schema::{Schema, SchemaEntry, SchemaError, SchemaNode};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
