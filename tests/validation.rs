//! End-to-End Validation Tests
//!
//! Exercises the public contract: registry construction, direct rule
//! invocation, recursive object/array evaluation, and full reports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use schemaguard::{
    RuleArgs, RuleContext, RuleDefinition, RuleOutcome, RuleRef, Schema, SchemaNode, Validator,
    INVALID_RULE,
};

fn fail_on(needle: &'static str, message: &str) -> RuleDefinition {
    RuleDefinition::new(message, move |value, _, _| {
        (value != Some(&json!(needle))).into()
    })
}

// --- Construction ---

#[test]
fn custom_rules_are_added_to_the_builtin_set() {
    let control = Validator::new();
    let validator = Validator::with_rules([(
        "myRule".to_string(),
        RuleDefinition::new("hello!", |value, _, _| {
            value.and_then(Value::as_u64).is_some_and(|n| n > 10).into()
        }),
    )]);

    assert_eq!(validator.rules().len(), control.rules().len() + 1);
    assert_eq!(validator.rules().get("myRule").unwrap().message, "hello!");
}

#[test]
fn custom_rule_overrides_builtin_of_same_name() {
    let control = Validator::new();
    let validator = Validator::with_rules([(
        "required".to_string(),
        RuleDefinition::new("hello!", |value, _, _| value.is_some().into()),
    )]);

    assert_eq!(validator.rules().len(), control.rules().len());
    assert_eq!(validator.rules().get("required").unwrap().message, "hello!");
}

// --- run_rule ---

#[test]
fn named_rules_see_the_context_and_can_recurse() {
    let called = Arc::new(AtomicBool::new(false));
    let seen = called.clone();

    let validator = Validator::with_rules([(
        "rule".to_string(),
        RuleDefinition::new("message", move |value, _, ctx: &RuleContext| {
            assert_eq!(ctx.context, &json!({"field": true, "otherfield": "hi"}));
            // The context exposes the engine for recursive invocation.
            assert!(ctx
                .run_rule(&RuleRef::from("required"), value, &RuleArgs::from(json!(true)))
                .is_empty());
            seen.store(true, Ordering::SeqCst);
            matches!(value, Some(Value::Bool(true))).into()
        }),
    )]);

    let messages = validator.run_rule(
        &json!({"field": true, "otherfield": "hi"}),
        &RuleRef::from("rule"),
        Some(&json!(true)),
        &RuleArgs::None,
    );

    assert!(messages.is_empty());
    assert!(called.load(Ordering::SeqCst));
}

#[test]
fn named_rules_receive_schema_args_positionally() {
    let validator = Validator::with_rules([(
        "rule".to_string(),
        RuleDefinition::new("message", |value, args, _| {
            assert_eq!(args, [json!(10)]);
            value
                .and_then(Value::as_str)
                .is_some_and(|s| s.len() > 10)
                .into()
        }),
    )]);

    let messages = validator.run_rule(
        &json!({}),
        &RuleRef::from("rule"),
        Some(&json!("this is longer than ten characters")),
        &RuleArgs::from(json!([10])),
    );
    assert!(messages.is_empty());
}

#[test]
fn unknown_rule_names_report_instead_of_failing() {
    let messages = Validator::new().run_rule(
        &json!({}),
        &RuleRef::from("slithy"),
        Some(&json!("test")),
        &RuleArgs::from(json!("field")),
    );
    assert_eq!(messages, vec![INVALID_RULE]);
}

// --- evaluate_object: object trees ---

#[test]
fn nested_objects_validate_through() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "obj": {
            "required": true,
            "field": {"required": true}
        }
    }));
    let obj = json!({"obj": {"field": "value"}});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert!(errors.is_empty());
}

#[test]
fn failures_deep_in_the_tree_carry_dotted_paths() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "parent": {"obj": {"field": {"required": true}}}
    }));
    let obj = json!({"parent": {"obj": {}}});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key("parent.obj.field"));
}

#[test]
fn null_nested_values_abort_recursion() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "obj": {"field": {"minLength": 10}}
    }));
    let obj = json!({"obj": null});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert!(errors.is_empty());
}

#[test]
fn wrongly_typed_nested_values_abort_descendants() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "obj": {"field": {"subfield": {"required": true}}}
    }));
    let obj = json!({"obj": "stop here"});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert!(errors.is_empty());
}

#[test]
fn immediate_rules_of_wrongly_typed_values_still_fire() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "obj": {
            "field": {
                "required": true,
                "subfield": {"required": true}
            }
        }
    }));
    let obj = json!({"obj": "stop here"});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["obj.field"][0].rule, "required");
}

// --- evaluate_object: arrays ---

#[test]
fn arrays_of_conforming_simple_values_pass() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {"required": true, "values": {"required": true}}
    }));
    let obj = json!({"array": ["one", "two"]});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert!(errors.is_empty());
}

#[test]
fn arrays_of_conforming_complex_values_pass() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {
            "required": true,
            "values": {"required": true, "field": {"required": true}}
        }
    }));
    let obj = json!({"array": [{"field": "value"}]});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert!(errors.is_empty());
}

#[test]
fn nonconforming_elements_fail_individually() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {"required": true, "values": {"required": true}}
    }));
    let obj = json!({"array": ["one", "two", null]});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key("array.2"));
    assert!(!errors.contains_key("array.0"));
    assert!(!errors.contains_key("array.1"));
}

#[test]
fn nonconforming_complex_elements_fail_at_member_paths() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {
            "required": true,
            "values": {"required": true, "field": {"required": true}}
        }
    }));
    let obj = json!({"array": [{"notfield": "value"}]});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key("array.0.field"));
}

#[test]
fn null_arrays_abort_recursion() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {"values": {"required": true}}
    }));
    let obj = json!({"array": null});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert!(errors.is_empty());
}

#[test]
fn wrongly_typed_arrays_abort_descendants() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {"values": {"field": {"required": true}}}
    }));
    let obj = json!({"array": "this is not an array"});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert!(errors.is_empty());
}

#[test]
fn immediate_rules_of_wrongly_typed_arrays_still_fire() {
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {
            "values": {"required": true, "field": {"required": true}}
        }
    }));
    let obj = json!({"array": "this is not an array"});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");
    assert_eq!(errors.len(), 1);
}

#[test]
fn multiple_array_subschemas_accumulate_per_element() {
    // Two element sub-schemas on the same array concatenate their results
    // per generated path; neither overwrites the other.
    let validator = Validator::new();
    let node = SchemaNode::compile(&json!({
        "array": {
            "required": true,
            "values": {"minLength": 5},
            "values2": {"maxLength": 2}
        }
    }));
    let obj = json!({"array": ["one", "two"]});

    let errors = validator.evaluate_object(&obj, &node, Some(&obj), "");

    for path in ["array.0", "array.1"] {
        let rules: Vec<&str> = errors[path].iter().map(|e| e.rule.as_str()).collect();
        assert_eq!(rules, vec!["minLength", "maxLength"], "at {path}");
    }
}

// --- validate ---

#[test]
fn empty_schema_and_object_are_valid() {
    let report = Validator::new().validate(&Schema::new(), &json!({}));
    assert!(report.valid);
    assert!(report.errors.is_empty());
}

#[test]
fn passing_object_yields_empty_report() {
    let schema = Schema::compile(&json!({"field": {"required": true}}));
    let report = Validator::new().validate(&schema, &json!({"field": "value"}));
    assert!(report.valid);
    assert!(report.errors.is_empty());
}

#[test]
fn missing_required_field_is_reported() {
    let schema = Schema::compile(&json!({"field": {"required": true}}));
    let report = Validator::new().validate(&schema, &json!({"notfield": "value"}));

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "valid": false,
            "errors": {
                "field": [{"rule": "required", "result": "is required"}]
            }
        })
    );
}

#[test]
fn rule_disabled_with_false_never_executes() {
    let schema = Schema::compile(&json!({"field": {"required": false}}));
    let report = Validator::new().validate(&schema, &json!({}));
    assert!(report.valid);
}

#[test]
fn validation_is_deterministic() {
    let schema = Schema::compile(&json!({
        "a": {"required": true},
        "b": {"minLength": 3, "values": {"required": true}}
    }));
    let obj = json!({"b": ["x", null]});

    let validator = Validator::new();
    let first = validator.validate(&schema, &obj);
    let second = validator.validate(&schema, &obj);

    assert_eq!(first, second);
    assert_eq!(first.valid, first.errors.is_empty());
}

#[test]
fn array_element_errors_use_indexed_paths_end_to_end() {
    let schema = Schema::compile(&json!({
        "array": {"required": true, "values": {"required": true}}
    }));
    let report = Validator::new().validate(&schema, &json!({"array": ["one", "two", null]}));

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors["array.2"].len(), 1);
    assert_eq!(report.errors["array.2"][0].rule, "required");
}

#[test]
fn kitchen_sink_report_matches_expected_shape() {
    let validator = Validator::new();
    let schema = Schema::new()
        .field(
            "username",
            SchemaNode::new()
                .rule("required", json!(true))
                .rule("notEmpty", json!(true))
                .rule("minLength", json!(4))
                .rule("maxLength", json!(20))
                .rule("match", json!(r"^\S+$")),
        )
        .field(
            "email",
            SchemaNode::new()
                .rule("required", json!(true))
                .rule("notEmpty", json!(true))
                .rule("format", json!("email")),
        )
        .field(
            "bio",
            SchemaNode::new().rule("type", json!("string")).rule_blocks(
                "conform",
                vec![RuleDefinition::new(
                    "not sufficiently disruptive to extant paradigms",
                    |value, _, _| {
                        value
                            .and_then(Value::as_str)
                            .and_then(|bio| bio.find("innovation"))
                            .is_some_and(|at| at > 0)
                            .into()
                    },
                )],
            ),
        )
        .field(
            "scores",
            SchemaNode::new()
                .rule("type", json!("array"))
                .rule("minLength", json!(3))
                .nested(
                    "values",
                    SchemaNode::new()
                        .nested(
                            "key",
                            SchemaNode::new()
                                .rule("required", json!(true))
                                .rule("notEmpty", json!(true))
                                .rule("present", json!(["test 1", "test 2", "test 3"])),
                        )
                        .nested(
                            "value",
                            SchemaNode::new()
                                .rule("type", json!("number"))
                                .rule("min", json!(0))
                                .rule("max", json!(100)),
                        ),
                ),
        );

    let report = validator.validate(
        &schema,
        &json!({
            "username": "",
            "email": "test",
            "bio": "hello this is my bio",
            "scores": [{"key": "a test"}]
        }),
    );

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "valid": false,
            "errors": {
                "username": [
                    {"rule": "notEmpty", "result": "cannot be blank"},
                    {"rule": "minLength", "result": "is too short", "args": 4},
                    {"rule": "match", "result": "does not match supplied pattern"}
                ],
                "email": [
                    {"rule": "format", "result": "expected format email", "args": "email"}
                ],
                "bio": [
                    {"rule": "conform", "result": "not sufficiently disruptive to extant paradigms"}
                ],
                "scores": [
                    {"rule": "minLength", "result": "is too short", "args": 3}
                ],
                "scores.0.key": [
                    {"rule": "present", "result": "not in allowed values", "args": ["test 1", "test 2", "test 3"]}
                ]
            }
        })
    );
}

#[test]
fn cross_field_rules_validate_against_siblings() {
    let schema = Schema::compile(&json!({
        "password": {"required": true, "minLength": 8},
        "confirm": {"required": true, "matchesField": "password"}
    }));
    let validator = Validator::new();

    let good = validator.validate(
        &schema,
        &json!({"password": "hunter22!", "confirm": "hunter22!"}),
    );
    assert!(good.valid);

    let bad = validator.validate(
        &schema,
        &json!({"password": "hunter22!", "confirm": "hunter23!"}),
    );
    assert!(!bad.valid);
    assert_eq!(bad.errors["confirm"][0].result, "must match password");
}

#[test]
fn multi_message_rules_explode_into_indexed_entries() {
    let validator = Validator::new();
    let schema = Schema::new().field(
        "field",
        SchemaNode::new().rule_blocks(
            "conform",
            vec![fail_on("test", "one"), fail_on("test", "two")],
        ),
    );

    let report = validator.validate(&schema, &json!({"field": "test"}));
    let entries = &report.errors["field"];

    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].rule.as_str(), entries[0].result.as_str()), ("conform-0", "one"));
    assert_eq!((entries[1].rule.as_str(), entries[1].result.as_str()), ("conform-1", "two"));
}

#[test]
fn inline_checks_report_under_their_schema_key() {
    let validator = Validator::new();
    let schema = Schema::new().field(
        "field",
        SchemaNode::new().check("shouty", {
            RuleDefinition::new("must be upper case", |value, _, _| {
                value
                    .and_then(Value::as_str)
                    .is_some_and(|s| s == s.to_uppercase())
                    .into()
            })
        }),
    );

    let report = validator.validate(&schema, &json!({"field": "quiet"}));
    assert_eq!(report.errors["field"][0].rule, "shouty");
    assert_eq!(report.errors["field"][0].result, "must be upper case");
}

#[test]
fn custom_multi_outcome_rule_through_validate() {
    let validator = Validator::with_rules([(
        "digits".to_string(),
        RuleDefinition::new("unused", |value, _, _| {
            let Some(s) = value.and_then(Value::as_str) else {
                return RuleOutcome::Failed;
            };
            let mut messages = Vec::new();
            if !s.chars().any(|c| c.is_ascii_digit()) {
                messages.push("needs a digit".to_string());
            }
            if s.len() < 8 {
                messages.push("needs eight characters".to_string());
            }
            RuleOutcome::Messages(messages)
        }),
    )]);

    let schema = Schema::compile(&json!({"password": {"digits": true}}));
    let report = validator.validate(&schema, &json!({"password": "short"}));
    let entries = &report.errors["password"];

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].rule, "digits-0");
    assert_eq!(entries[1].rule, "digits-1");
}
