//! Conversion between the OpenCode and Claude Code MCP document formats.
//!
//! OpenCode keeps program and arguments together in a `command` array and
//! names its environment `environment`. Claude Code splits `command`/`args`,
//! uses `env`, and wants an explicit `type`.

use mcpbridge_snapshot::Source;
use serde_json::{json, Map, Value};

const SHARED_KEYS: [&str; 4] = ["url", "headers", "transport", "timeout"];

/// Converts a document written for `from` into the format `to` expects.
/// Same-source conversion returns the document unchanged.
pub fn convert_for_target(config: &Value, from: Source, to: Source) -> Value {
    match (from, to) {
        (Source::OpenCode, Source::Claude) => opencode_to_claude(config),
        (Source::Claude, Source::OpenCode) => claude_to_opencode(config),
        _ => config.clone(),
    }
}

/// OpenCode to Claude Code. `enabled` and `description` have no Claude
/// counterpart and are dropped.
pub fn opencode_to_claude(config: &Value) -> Value {
    let mut out = Map::new();

    match config.get("command") {
        Some(Value::Array(argv)) => {
            if let Some((program, rest)) = argv.split_first() {
                out.insert("command".into(), program.clone());
                if !rest.is_empty() {
                    out.insert("args".into(), Value::Array(rest.to_vec()));
                }
            }
        }
        Some(other) => {
            out.insert("command".into(), other.clone());
        }
        None => {}
    }

    if let Some(env) = config.get("environment") {
        out.insert("env".into(), env.clone());
    }
    copy_keys(config, &mut out, &SHARED_KEYS);

    if config.get("url").is_some() {
        out.insert("type".into(), json!("http"));
    } else if config.get("command").is_some() {
        out.insert("type".into(), json!("stdio"));
    }

    Value::Object(out)
}

/// Claude Code to OpenCode. Synced items always land enabled.
pub fn claude_to_opencode(config: &Value) -> Value {
    let mut out = Map::new();

    let kind = if config.get("url").is_some() {
        "remote"
    } else {
        "local"
    };
    out.insert("type".into(), json!(kind));
    out.insert("enabled".into(), json!(true));

    let mut argv = Vec::new();
    match config.get("command") {
        Some(Value::String(program)) => argv.push(Value::String(program.clone())),
        Some(Value::Array(parts)) => argv.extend(parts.iter().cloned()),
        _ => {}
    }
    if let Some(args) = config.get("args").and_then(Value::as_array) {
        argv.extend(args.iter().cloned());
    }
    if !argv.is_empty() {
        out.insert("command".into(), Value::Array(argv));
    }

    if let Some(env) = config.get("env") {
        out.insert("environment".into(), env.clone());
    }
    copy_keys(config, &mut out, &SHARED_KEYS);
    copy_keys(config, &mut out, &["description"]);

    Value::Object(out)
}

fn copy_keys(from: &Value, to: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = from.get(*key) {
            to.insert((*key).to_string(), value.clone());
        }
    }
}
