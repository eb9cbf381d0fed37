//! Canonical view over opaque MCP configuration documents.
//!
//! Display paths use [`parse`]/[`parse_value`], which never fail: anything
//! unreadable falls back to an empty remote shape. Submission paths use
//! [`validate_for_submit`], which is strict and surfaces every problem.

use crate::error::{Error, Result};
use mcpbridge_snapshot::McpItem;
use serde_json::{Map, Value};

/// Coarse classification of an MCP item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Launched as a child process through a command.
    Local,
    /// Reached over the network through a URL.
    Remote,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Remote => "remote",
        })
    }
}

/// A command as written in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// `"command": "npx"`, arguments (if any) live in `args`.
    Line(String),
    /// `"command": ["npx", "-y", "pkg"]`, program and arguments together.
    Argv(Vec<String>),
}

impl CommandSpec {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self::Line(s.clone())),
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|v| v.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
                .map(Self::Argv),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Line(s) => Value::String(s.clone()),
            Self::Argv(argv) => Value::from(argv.clone()),
        }
    }
}

/// Parsed shape of a configuration document.
///
/// `extra` carries every field the parser does not model, including `type`
/// and any `command` whose shape is not understood, so
/// [`ParsedConfig::into_value`] reproduces the original document.
///
/// The default is the empty remote shape, `{"url": "", "headers": {}}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedConfig {
    Remote {
        url: Option<String>,
        headers: Option<Map<String, Value>>,
        extra: Map<String, Value>,
    },
    Local {
        command: Option<CommandSpec>,
        args: Option<Vec<String>>,
        env: Option<Map<String, Value>>,
        extra: Map<String, Value>,
    },
    /// Valid JSON that is not an object.
    Unknown { raw: Value },
}

impl Default for ParsedConfig {
    fn default() -> Self {
        Self::Remote {
            url: Some(String::new()),
            headers: Some(Map::new()),
            extra: Map::new(),
        }
    }
}

fn type_tag(doc: &Map<String, Value>) -> Option<String> {
    doc.get("type")
        .or_else(|| doc.get("mcp_type"))
        .and_then(Value::as_str)
        .map(|t| t.trim().to_ascii_lowercase())
}

fn is_local_tag(tag: &str) -> bool {
    matches!(tag, "stdio" | "local")
}

/// Any non-null `command` other than a blank string counts, whatever its shape.
fn has_command(doc: &Map<String, Value>) -> bool {
    match doc.get("command") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// Parses raw text. Malformed input yields the default remote shape.
pub fn parse(raw: &str) -> ParsedConfig {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => parse_value(&value),
        Err(err) => {
            tracing::debug!(error = %err, "Unparseable MCP config, treating as remote");
            ParsedConfig::default()
        }
    }
}

/// Parses an already-decoded document.
pub fn parse_value(value: &Value) -> ParsedConfig {
    let Value::Object(doc) = value else {
        return ParsedConfig::Unknown { raw: value.clone() };
    };

    let local_tag = type_tag(doc).as_deref().is_some_and(is_local_tag);

    let mut extra = doc.clone();
    if has_command(doc) || local_tag {
        let command = doc.get("command").and_then(CommandSpec::from_value);
        // Only take fields whose shape we understand; anything else stays in extra.
        if command.is_some() {
            extra.remove("command");
        }
        let args = match doc.get("args") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(String::from))
                .collect::<Option<Vec<_>>>(),
            _ => None,
        };
        if args.is_some() {
            extra.remove("args");
        }
        let env = take_object(&mut extra, "env");
        ParsedConfig::Local {
            command,
            args,
            env,
            extra,
        }
    } else {
        let url = match doc.get("url") {
            Some(Value::String(url)) => {
                extra.remove("url");
                Some(url.clone())
            }
            _ => None,
        };
        let headers = take_object(&mut extra, "headers");
        ParsedConfig::Remote {
            url,
            headers,
            extra,
        }
    }
}

fn take_object(extra: &mut Map<String, Value>, key: &str) -> Option<Map<String, Value>> {
    match extra.get(key) {
        Some(Value::Object(_)) => match extra.remove(key) {
            Some(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// A present command wins over any type tag, even one of an unexpected
/// shape. `stdio`/`local` tags also mean local. Everything else is remote.
pub fn classify(parsed: &ParsedConfig) -> Kind {
    match parsed {
        ParsedConfig::Local { .. } => Kind::Local,
        ParsedConfig::Remote { .. } | ParsedConfig::Unknown { .. } => Kind::Remote,
    }
}

impl ParsedConfig {
    /// URL of the item, also for local items that happen to carry one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Remote { url, .. } => url.as_deref(),
            Self::Local { extra, .. } => extra.get("url").and_then(Value::as_str),
            Self::Unknown { .. } => None,
        }
    }

    /// Full command line, program first.
    pub fn command_line(&self) -> Option<String> {
        let Self::Local { command, args, .. } = self else {
            return None;
        };
        match command.as_ref()? {
            CommandSpec::Argv(argv) => Some(argv.join(" ")),
            CommandSpec::Line(program) => {
                let mut parts = vec![program.as_str()];
                if let Some(args) = args {
                    parts.extend(args.iter().map(String::as_str));
                }
                Some(parts.join(" "))
            }
        }
    }

    /// Rebuilds the document, unknown fields included.
    pub fn into_value(self) -> Value {
        match self {
            Self::Unknown { raw } => raw,
            Self::Remote {
                url,
                headers,
                mut extra,
            } => {
                if let Some(url) = url {
                    extra.insert("url".into(), Value::String(url));
                }
                if let Some(headers) = headers {
                    extra.insert("headers".into(), Value::Object(headers));
                }
                Value::Object(extra)
            }
            Self::Local {
                command,
                args,
                env,
                mut extra,
            } => {
                if let Some(command) = command {
                    extra.insert("command".into(), command.to_value());
                }
                if let Some(args) = args {
                    extra.insert("args".into(), Value::from(args));
                }
                if let Some(env) = env {
                    extra.insert("env".into(), Value::Object(env));
                }
                Value::Object(extra)
            }
        }
    }
}

/// One-line summary shown next to an item.
pub fn describe(item: &McpItem, parsed: &ParsedConfig) -> String {
    if let Some(description) = item.description.as_deref().filter(|d| !d.trim().is_empty()) {
        return description.to_string();
    }
    if let Some(url) = parsed.url().filter(|u| !u.is_empty()) {
        return url.to_string();
    }
    parsed.command_line().unwrap_or_default()
}

/// Strict check run before add/update. Returns the document untouched.
pub fn validate_for_submit(name: &str, raw: &str) -> Result<Value> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".into()));
    }
    let value: Value = serde_json::from_str(raw).map_err(|e| Error::Parse(e.to_string()))?;
    let Value::Object(doc) = &value else {
        return Err(Error::Validation(
            "config must be a JSON object".into(),
        ));
    };
    if let Some(command) = doc.get("command") {
        let ok = match command {
            Value::String(_) => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            _ => false,
        };
        if !ok {
            return Err(Error::Validation(
                "'command' must be a string or an array of strings".into(),
            ));
        }
    }
    if doc.get("url").is_some_and(|url| !url.is_string()) {
        return Err(Error::Validation("'url' must be a string".into()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpbridge_snapshot::Source;
    use serde_json::json;

    fn item(description: Option<&str>) -> McpItem {
        McpItem {
            name: "x".into(),
            config: json!({}),
            source: Source::OpenCode,
            enabled: true,
            description: description.map(String::from),
        }
    }

    #[test]
    fn command_wins_over_remote_type_tag() {
        let parsed = parse(r#"{"type": "remote", "command": "npx", "url": "https://x"}"#);
        assert_eq!(classify(&parsed), Kind::Local);

        let parsed = parse(r#"{"type": "http", "command": ["uvx", "srv"]}"#);
        assert_eq!(classify(&parsed), Kind::Local);
    }

    #[test]
    fn local_type_tags_force_local() {
        for tag in ["stdio", "local", "STDIO"] {
            let parsed = parse_value(&json!({"type": tag}));
            assert_eq!(classify(&parsed), Kind::Local, "tag {tag}");
        }
        let legacy = parse_value(&json!({"mcp_type": "stdio"}));
        assert_eq!(classify(&legacy), Kind::Local);
    }

    #[test]
    fn url_only_is_remote() {
        let parsed = parse(r#"{"url": "https://x/mcp"}"#);
        assert_eq!(classify(&parsed), Kind::Remote);
        assert_eq!(parsed.url(), Some("https://x/mcp"));
    }

    #[test]
    fn blank_or_null_command_is_absent() {
        assert_eq!(classify(&parse(r#"{"command": ""}"#)), Kind::Remote);
        assert_eq!(classify(&parse(r#"{"command": "  "}"#)), Kind::Remote);
        assert_eq!(classify(&parse(r#"{"command": null, "url": "https://x"}"#)), Kind::Remote);
    }

    #[test]
    fn present_command_of_any_shape_is_local() {
        for doc in [
            json!({"command": []}),
            json!({"command": ["npx", 1]}),
            json!({"command": 42}),
            json!({"type": "remote", "command": {"bin": "npx"}, "url": "https://x"}),
        ] {
            let parsed = parse_value(&doc);
            assert_eq!(classify(&parsed), Kind::Local, "{doc}");
            assert!(matches!(parsed, ParsedConfig::Local { command: None, .. }));
            assert_eq!(parsed.command_line(), None);
            assert_eq!(parsed.into_value(), doc);
        }
    }

    #[test]
    fn malformed_input_defaults_to_empty_remote() {
        for raw in ["", "{", "not json", "{\"url\": }"] {
            let parsed = parse(raw);
            assert_eq!(parsed, ParsedConfig::default());
            assert_eq!(classify(&parsed), Kind::Remote);
            assert_eq!(parsed.url(), Some(""));
            assert_eq!(describe(&item(None), &parsed), "");
            assert_eq!(parsed.into_value(), json!({"url": "", "headers": {}}));
        }
    }

    #[test]
    fn non_object_is_unknown() {
        let parsed = parse("[1, 2]");
        assert!(matches!(parsed, ParsedConfig::Unknown { .. }));
        assert_eq!(classify(&parsed), Kind::Remote);
        assert_eq!(describe(&item(None), &parsed), "");
    }

    #[test]
    fn describe_precedence() {
        let remote = parse(r#"{"type": "remote", "url": "https://x/mcp"}"#);
        assert_eq!(describe(&item(Some("Weather")), &remote), "Weather");
        assert_eq!(describe(&item(None), &remote), "https://x/mcp");
        assert_eq!(describe(&item(Some("  ")), &remote), "https://x/mcp");

        let line = parse(r#"{"command": "npx", "args": ["-y", "pkg"]}"#);
        assert_eq!(describe(&item(None), &line), "npx -y pkg");

        let argv = parse(r#"{"command": ["uvx", "mcp-server"]}"#);
        assert_eq!(describe(&item(None), &argv), "uvx mcp-server");

        assert_eq!(describe(&item(None), &parse("{}")), "");
    }

    #[test]
    fn unknown_fields_round_trip() {
        let doc = json!({
            "type": "local",
            "command": ["npx", "srv"],
            "environment": {"K": "v"},
            "enabled": false,
            "timeout": 30,
            "x-vendor": {"nested": [1, 2, 3]}
        });
        assert_eq!(parse_value(&doc).into_value(), doc);

        let remote = json!({
            "type": "http",
            "url": "https://x",
            "headers": {"A": "b"},
            "oauth": true
        });
        assert_eq!(parse_value(&remote).into_value(), remote);

        let odd_args = json!({"command": "run", "args": ["a", 1]});
        assert_eq!(parse_value(&odd_args).into_value(), odd_args);
    }

    #[test]
    fn submit_validation_is_strict() {
        assert!(matches!(
            validate_for_submit(" ", "{}"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_for_submit("a", "{oops"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            validate_for_submit("a", "[]"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_for_submit("a", r#"{"command": 3}"#),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            validate_for_submit("a", r#"{"url": false}"#),
            Err(Error::Validation(_))
        ));

        let ok = validate_for_submit("weather", r#"{"type":"remote","url":"https://x/mcp","z":1}"#)
            .unwrap();
        assert_eq!(ok, json!({"type": "remote", "url": "https://x/mcp", "z": 1}));
    }
}
