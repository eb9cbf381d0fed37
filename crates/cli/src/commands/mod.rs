//! Command handlers. Each returns `anyhow::Result` and prints its own output.

mod backup;
mod mcp;
mod skills;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use mcpbridge_state::{env_json_output, ConfigPaths};
use mcpbridge_sync::AppContext;
use serde::Serialize;
use std::path::Path;

/// Chooses between text and JSON rendering.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    json: bool,
}

impl Output {
    pub(crate) fn new(json: bool) -> Self {
        Self { json }
    }

    /// Prints `value` as JSON, or the text produced by `text`.
    pub(crate) fn emit<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce() -> String,
    ) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            let text = text();
            if !text.is_empty() {
                println!("{}", text.trim_end());
            }
        }
        Ok(())
    }
}

/// Writes `value` as pretty JSON, creating parent directories.
pub(crate) fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("failed to write export: {}", path.display()))
}

/// Resolves file locations: flags, then env vars, then settings, then defaults.
pub(crate) fn resolve_paths(cli: &Cli) -> Result<ConfigPaths> {
    let mut paths = ConfigPaths::resolve().context("failed to resolve config paths")?;
    if let Some(path) = &cli.opencode_config {
        paths.opencode = path.clone();
    }
    if let Some(path) = &cli.claude_config {
        paths.claude = path.clone();
    }
    if let Some(path) = &cli.skills_config {
        paths.skills = path.clone();
    }
    if let Some(dir) = &cli.backup_dir {
        paths.backup_dir = dir.clone();
    }
    if let Some(dir) = &cli.archive_dir {
        paths.archive_dir = dir.clone();
    }
    Ok(paths)
}

pub(crate) async fn dispatch(cli: Cli) -> Result<()> {
    let paths = resolve_paths(&cli)?;
    tracing::debug!(?paths, "Resolved config paths");
    let out = Output::new(cli.json || env_json_output());
    let ctx = AppContext::from_paths(&paths);

    match cli.command {
        Commands::List { source } => mcp::handle_list(&ctx, out, source).await,
        Commands::Show { source, name } => mcp::handle_show(&ctx, out, source, &name).await,
        Commands::Add {
            source,
            name,
            config,
            description,
        } => mcp::handle_add(&ctx, out, source, &name, &config, description).await,
        Commands::Update {
            source,
            name,
            config,
            description,
        } => mcp::handle_update(&ctx, out, source, &name, &config, description).await,
        Commands::Delete { source, name } => mcp::handle_delete(&ctx, out, source, &name).await,
        Commands::Diff { drift } => mcp::handle_diff(&ctx, out, drift).await,
        Commands::Sync { name, from, to } => mcp::handle_sync(&ctx, out, &name, from, to).await,
        Commands::SyncAll { from, to } => mcp::handle_sync_all(&ctx, out, from, to).await,
        Commands::Export { path } => mcp::handle_export(&ctx, out, &path).await,
        Commands::Backup { source } => backup::handle_backup(&ctx, out, source).await,
        Commands::BackupInfo { source } => backup::handle_backup_info(&ctx, out, source).await,
        Commands::BackupShow { source } => backup::handle_backup_show(&ctx, out, source).await,
        Commands::Restore { source, name } => {
            backup::handle_restore(&ctx, out, source, name.as_deref()).await
        }
        Commands::Archive(command) => backup::handle_archive(&ctx, out, command).await,
        Commands::Skills(command) => skills::handle_skills(&ctx, out, command).await,
        Commands::Paths => out.emit(&paths, || {
            [
                ("opencode", &paths.opencode),
                ("claude", &paths.claude),
                ("skills", &paths.skills),
                ("backup dir", &paths.backup_dir),
                ("archive dir", &paths.archive_dir),
            ]
            .iter()
            .map(|(label, path)| format!("{:<12} {}", format!("{label}:"), path.display()))
            .collect::<Vec<_>>()
            .join("\n")
        }),
    }
}
