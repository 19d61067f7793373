//! Message Formatting - Positional Placeholder Templates
//!
//! The engine calls this once per failing rule invocation. Templates use
//! indexed placeholders: `"must be longer than {0} characters"`.

use serde_json::Value;

/// Substitute indexed placeholders (`{0}`, `{1}`, ...) with positional args.
///
/// Strings substitute bare (no quotes); every other JSON value renders as
/// JSON. Placeholders with no matching argument, non-numeric placeholders,
/// and unpaired braces pass through untouched.
pub fn format_template(template: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        if let Some(close) = after.find('}') {
            if let Ok(index) = after[..close].parse::<usize>() {
                match args.get(index) {
                    Some(arg) => out.push_str(&render(arg)),
                    None => {
                        out.push('{');
                        out.push_str(&after[..=close]);
                    }
                }
                rest = &after[close + 1..];
                continue;
            }
        }

        out.push('{');
        rest = after;
    }

    out.push_str(rest);
    out
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
