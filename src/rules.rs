//! Built-in Rule Catalog
//!
//! Each rule is an independent pure predicate. The engine only depends on
//! the [`RuleDefinition`] shape, so any of these can be replaced wholesale
//! by a caller-supplied definition of the same name.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::engine::RuleContext;
use crate::registry::{RuleArgs, RuleDefinition, RuleOutcome, RuleRef};

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());
static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});
static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());
static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}:\d{2}(:\d{2})?$").unwrap());
static IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(\.(25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}$")
        .unwrap()
});

/// Shorthand for simple boolean predicates that ignore the context.
fn predicate(
    message: &str,
    func: impl Fn(Option<&Value>, &[Value]) -> bool + Send + Sync + 'static,
) -> RuleDefinition {
    RuleDefinition::new(message, move |value, args, _ctx| func(value, args).into())
}

/// String character count or array element count.
fn length(value: Option<&Value>) -> Option<usize> {
    match value {
        Some(Value::String(s)) => Some(s.chars().count()),
        Some(Value::Array(items)) => Some(items.len()),
        _ => None,
    }
}

fn required() -> RuleDefinition {
    RuleDefinition {
        evaluate_null: true,
        evaluate_undefined: true,
        include_args: false,
        ..predicate("is required", |value, _| {
            !matches!(value, None | Some(Value::Null))
        })
    }
}

fn not_empty() -> RuleDefinition {
    RuleDefinition {
        include_args: false,
        ..predicate("cannot be blank", |value, _| match value {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            _ => true,
        })
    }
}

fn min_length() -> RuleDefinition {
    // A missing or non-numeric bound fails closed so the misconfiguration
    // surfaces through the normal reporting channel.
    predicate("is too short", |value, args| {
        match (length(value), args.first().and_then(Value::as_u64)) {
            (Some(len), Some(min)) => len as u64 >= min,
            _ => false,
        }
    })
}

fn max_length() -> RuleDefinition {
    predicate("is too long", |value, args| {
        match (length(value), args.first().and_then(Value::as_u64)) {
            (Some(len), Some(max)) => len as u64 <= max,
            _ => false,
        }
    })
}

fn type_rule() -> RuleDefinition {
    predicate("expected {0}", |value, args| {
        let Some(value) = value else { return false };
        match args.first().and_then(Value::as_str) {
            Some("string") => value.is_string(),
            Some("number") => value.is_number(),
            Some("integer") => value.is_i64() || value.is_u64(),
            Some("boolean") => value.is_boolean(),
            Some("array") => value.is_array(),
            Some("object") => value.is_object(),
            Some("null") => value.is_null(),
            _ => false,
        }
    })
}

fn match_rule() -> RuleDefinition {
    RuleDefinition {
        include_args: false,
        ..predicate("does not match supplied pattern", |value, args| {
            let (Some(Value::String(s)), Some(pattern)) =
                (value, args.first().and_then(Value::as_str))
            else {
                return false;
            };
            Regex::new(pattern).is_ok_and(|re| re.is_match(s))
        })
    }
}

fn format() -> RuleDefinition {
    predicate("expected format {0}", |value, args| {
        let (Some(Value::String(s)), Some(name)) = (value, args.first().and_then(Value::as_str))
        else {
            return false;
        };
        match name {
            "email" => EMAIL.is_match(s),
            "url" => URL.is_match(s),
            "uuid" => UUID.is_match(s),
            "date" => DATE.is_match(s),
            "time" => TIME.is_match(s),
            "ipv4" => IPV4.is_match(s),
            _ => false,
        }
    })
}

fn present() -> RuleDefinition {
    RuleDefinition {
        arg_array: true,
        ..predicate("not in allowed values", |value, args| {
            match (value, args.first().and_then(Value::as_array)) {
                (Some(value), Some(allowed)) => allowed.contains(value),
                _ => false,
            }
        })
    }
}

fn min() -> RuleDefinition {
    predicate("is too small", |value, args| {
        match (
            value.and_then(Value::as_f64),
            args.first().and_then(Value::as_f64),
        ) {
            (Some(n), Some(min)) => n >= min,
            _ => false,
        }
    })
}

fn max() -> RuleDefinition {
    predicate("is too large", |value, args| {
        match (
            value.and_then(Value::as_f64),
            args.first().and_then(Value::as_f64),
        ) {
            (Some(n), Some(max)) => n <= max,
            _ => false,
        }
    })
}

/// Runs every inline sub-check block against the value and reports each
/// failure independently. Two or more failing blocks explode into
/// `conform-0`, `conform-1`, ... entries in the error map.
fn conform() -> RuleDefinition {
    RuleDefinition {
        include_args: false,
        ..RuleDefinition::new("does not conform", |value, _args, ctx: &RuleContext| {
            let RuleArgs::Blocks(checks) = ctx.raw_args else {
                return RuleOutcome::Messages(Vec::new());
            };
            let mut messages = Vec::new();
            for check in checks {
                messages.extend(ctx.run_rule(
                    &RuleRef::Inline(check.clone()),
                    value,
                    &RuleArgs::None,
                ));
            }
            RuleOutcome::Messages(messages)
        })
    }
}

/// Cross-field equality through the evaluation context, e.g.
/// `confirmPassword: { matchesField: "password" }`.
fn matches_field() -> RuleDefinition {
    RuleDefinition::new("must match {0}", |value, args, ctx: &RuleContext| {
        let (Some(value), Some(other)) = (value, args.first().and_then(Value::as_str)) else {
            return RuleOutcome::Failed;
        };
        (ctx.context.get(other) == Some(value)).into()
    })
}

/// The default rule set loaded into every registry.
pub fn builtin_rules() -> HashMap<String, RuleDefinition> {
    let mut rules = HashMap::new();
    rules.insert("required".to_string(), required());
    rules.insert("notEmpty".to_string(), not_empty());
    rules.insert("minLength".to_string(), min_length());
    rules.insert("maxLength".to_string(), max_length());
    rules.insert("type".to_string(), type_rule());
    rules.insert("match".to_string(), match_rule());
    rules.insert("format".to_string(), format());
    rules.insert("present".to_string(), present());
    rules.insert("min".to_string(), min());
    rules.insert("max".to_string(), max());
    rules.insert("conform".to_string(), conform());
    rules.insert("matchesField".to_string(), matches_field());
    rules
}
