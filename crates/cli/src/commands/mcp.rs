use super::{write_json_file, Output};
use anyhow::{bail, Context, Result};
use mcpbridge_snapshot::{McpItem, Source};
use mcpbridge_sync::{
    classify, compute_diff, compute_drift, describe, parse_value, AppContext, Error,
};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// One row of `list` output.
#[derive(Debug, Serialize)]
struct ItemRow {
    name: String,
    source: Source,
    kind: String,
    enabled: bool,
    summary: String,
}

impl ItemRow {
    fn from_item(item: &McpItem) -> Self {
        let parsed = parse_value(&item.config);
        Self {
            name: item.name.clone(),
            source: item.source,
            kind: classify(&parsed).to_string(),
            enabled: item.enabled,
            summary: describe(item, &parsed),
        }
    }
}

fn render_rows(rows: &[ItemRow]) -> String {
    if rows.is_empty() {
        return "No MCPs configured.".to_string();
    }
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    rows.iter()
        .map(|r| {
            format!(
                "{:<8} {:<width$}  {:<6} {}{}",
                r.source.as_str(),
                r.name,
                r.kind,
                if r.enabled { "" } else { "(disabled) " },
                r.summary,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads the config argument; `-` means stdin.
fn read_config_arg(config: &str) -> Result<String> {
    if config != "-" {
        return Ok(config.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read config from stdin")?;
    Ok(buf)
}

pub(crate) async fn handle_list(
    ctx: &AppContext,
    out: Output,
    source: Option<Source>,
) -> Result<()> {
    let list = ctx.registry().load_all().await?;
    let sources: Vec<Source> = match source {
        Some(source) => vec![source],
        None => Source::ALL.to_vec(),
    };
    let rows: Vec<ItemRow> = sources
        .iter()
        .flat_map(|s| list.get(*s).iter().map(ItemRow::from_item))
        .collect();
    out.emit(&rows, || render_rows(&rows))
}

pub(crate) async fn handle_show(
    ctx: &AppContext,
    out: Output,
    source: Source,
    name: &str,
) -> Result<()> {
    ctx.registry().load_all().await?;
    let Some(item) = ctx.registry().get(source, name).await else {
        return Err(Error::not_found(source, name).into());
    };
    let row = ItemRow::from_item(&item);
    out.emit(&item, || {
        format!(
            "{} ({}, {})\n{}\n{}",
            item.name,
            source.display_name(),
            row.kind,
            row.summary,
            serde_json::to_string_pretty(&item.config).unwrap_or_default()
        )
    })
}

pub(crate) async fn handle_add(
    ctx: &AppContext,
    out: Output,
    source: Source,
    name: &str,
    config: &str,
    description: Option<String>,
) -> Result<()> {
    let raw = read_config_arg(config)?;
    ctx.registry().add(name, &raw, source, description).await?;
    out.emit(&serde_json::json!({"added": name, "source": source}), || {
        format!("Added '{}' to {}", name, source.display_name())
    })
}

pub(crate) async fn handle_update(
    ctx: &AppContext,
    out: Output,
    source: Source,
    name: &str,
    config: &str,
    description: Option<String>,
) -> Result<()> {
    let raw = read_config_arg(config)?;
    ctx.registry().update(name, &raw, source, description).await?;
    out.emit(&serde_json::json!({"updated": name, "source": source}), || {
        format!("Updated '{}' in {}", name, source.display_name())
    })
}

pub(crate) async fn handle_delete(
    ctx: &AppContext,
    out: Output,
    source: Source,
    name: &str,
) -> Result<()> {
    ctx.registry().delete(name, source).await?;
    out.emit(&serde_json::json!({"deleted": name, "source": source}), || {
        format!("Deleted '{}' from {}", name, source.display_name())
    })
}

pub(crate) async fn handle_diff(ctx: &AppContext, out: Output, drift: bool) -> Result<()> {
    let list = ctx.registry().load_all().await?;
    let opencode = list.get(Source::OpenCode);
    let claude = list.get(Source::Claude);

    let list_names = |label: &str, names: &[String]| -> String {
        if names.is_empty() {
            format!("{label}: none")
        } else {
            format!("{label}:\n  {}", names.join("\n  "))
        }
    };

    if drift {
        let report = compute_drift(opencode, claude);
        return out.emit(&report, || {
            if report.in_sync() {
                return "OpenCode and Claude Code are in sync.".to_string();
            }
            [
                list_names("Only in OpenCode", &report.only_in_a),
                list_names("Only in Claude Code", &report.only_in_b),
                list_names("Different content", &report.diverged),
            ]
            .join("\n")
        });
    }

    let report = compute_diff(opencode, claude);
    out.emit(&report, || {
        if report.in_sync() {
            return "OpenCode and Claude Code have the same MCP names.".to_string();
        }
        [
            list_names("Only in OpenCode", &report.only_in_a),
            list_names("Only in Claude Code", &report.only_in_b),
        ]
        .join("\n")
    })
}

pub(crate) async fn handle_sync(
    ctx: &AppContext,
    out: Output,
    name: &str,
    from: Source,
    to: Source,
) -> Result<()> {
    ctx.registry().load_all().await?;
    let Some(item) = ctx.registry().get(from, name).await else {
        return Err(Error::not_found(from, name).into());
    };
    ctx.orchestrator().sync_item(name, from, to, item.config).await?;
    out.emit(
        &serde_json::json!({"synced": name, "from": from, "to": to}),
        || format!("Synced '{}' from {} to {}", name, from.display_name(), to.display_name()),
    )
}

pub(crate) async fn handle_sync_all(
    ctx: &AppContext,
    out: Output,
    from: Source,
    to: Source,
) -> Result<()> {
    ctx.registry().load_all().await?;
    let report = ctx.orchestrator().sync_missing(from, to).await?;
    out.emit(&report, || report.format_summary())?;
    if let Some(first) = report.first_failure() {
        bail!(
            "{} of {} items failed to sync; first failure: {} ({})",
            report.failures.len(),
            report.attempted,
            first.name,
            first.error
        );
    }
    Ok(())
}

pub(crate) async fn handle_export(ctx: &AppContext, out: Output, path: &Path) -> Result<()> {
    let list = ctx.registry().load_all().await?;
    let doc: Value = serde_json::to_value(&list).context("failed to serialize MCP list")?;
    write_json_file(path, &doc)?;
    out.emit(
        &serde_json::json!({"exported": list.len(), "path": path}),
        || format!("Exported {} MCPs to {}", list.len(), path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_describe_kind_and_summary() {
        let item = McpItem {
            name: "git".into(),
            config: json!({"command": "uvx", "args": ["mcp-git"]}),
            source: Source::Claude,
            enabled: true,
            description: None,
        };
        let row = ItemRow::from_item(&item);
        assert_eq!(row.kind, "local");
        assert_eq!(row.summary, "uvx mcp-git");
        let text = render_rows(&[row]);
        assert!(text.starts_with("claude"));
        assert!(text.contains("uvx mcp-git"));
    }

    #[test]
    fn empty_rows_render_placeholder() {
        assert_eq!(render_rows(&[]), "No MCPs configured.");
    }

    #[test]
    fn inline_config_arg_is_returned_verbatim() {
        assert_eq!(read_config_arg("{\"url\": \"x\"}").unwrap(), "{\"url\": \"x\"}");
    }
}
