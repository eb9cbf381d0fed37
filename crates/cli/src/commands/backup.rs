use super::Output;
use crate::cli::ArchiveCommand;
use anyhow::Result;
use mcpbridge_snapshot::{ArchiveInfo, SnapshotMetadata, Source};
use mcpbridge_sync::{AppContext, BackupState};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct BackupInfo {
    source: Source,
    state: BackupState,
    #[serde(skip_serializing_if = "Option::is_none")]
    latest: Option<SnapshotMetadata>,
}

fn describe_metadata(meta: &SnapshotMetadata) -> String {
    format!(
        "{} backup: {} MCPs, created {} ({})",
        meta.source.display_name(),
        meta.item_count,
        meta.created_at,
        meta.filename
    )
}

pub(crate) async fn handle_backup(ctx: &AppContext, out: Output, source: Source) -> Result<()> {
    let meta = ctx.backups().backup(source).await?;
    out.emit(&meta, || describe_metadata(&meta))
}

pub(crate) async fn handle_backup_info(
    ctx: &AppContext,
    out: Output,
    source: Source,
) -> Result<()> {
    let latest = ctx.backups().latest_backup(source).await?;
    let info = BackupInfo {
        source,
        state: if latest.is_some() {
            BackupState::BackupAvailable
        } else {
            BackupState::NoBackup
        },
        latest,
    };
    out.emit(&info, || match &info.latest {
        Some(meta) => describe_metadata(meta),
        None => format!("No backup for {}", source.display_name()),
    })
}

pub(crate) async fn handle_backup_show(
    ctx: &AppContext,
    out: Output,
    source: Source,
) -> Result<()> {
    let content = ctx.backups().read_backup_content(source).await?;
    out.emit(&content, || {
        if content.is_empty() {
            return format!("{} backup is empty", source.display_name());
        }
        content
            .iter()
            .map(|(name, config)| format!("{name}: {config}"))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub(crate) async fn handle_restore(
    ctx: &AppContext,
    out: Output,
    source: Source,
    name: Option<&str>,
) -> Result<()> {
    let report = match name {
        Some(name) => ctx.backups().restore_one(source, name).await?,
        None => ctx.backups().restore_all(source).await?,
    };
    out.emit(&report, || report.message.clone())
}

fn describe_archive(info: &ArchiveInfo) -> String {
    let parts: Vec<&str> = [
        (info.opencode, "opencode"),
        (info.claude, "claude"),
        (info.skills, "skills"),
    ]
    .into_iter()
    .filter_map(|(present, label)| present.then_some(label))
    .collect();
    format!("{} ({}) [{}]", info.id, info.created_at, parts.join(", "))
}

pub(crate) async fn handle_archive(
    ctx: &AppContext,
    out: Output,
    command: ArchiveCommand,
) -> Result<()> {
    match command {
        ArchiveCommand::Create => {
            let info = ctx.backups().archive().await?;
            out.emit(&info, || format!("Created archive {}", describe_archive(&info)))
        }
        ArchiveCommand::List => {
            let archives = ctx.backups().list_archives().await?;
            out.emit(&archives, || {
                if archives.is_empty() {
                    return "No archives.".to_string();
                }
                archives
                    .iter()
                    .map(describe_archive)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ArchiveCommand::Restore { id } => {
            let info = ctx.backups().restore_archive(&id).await?;
            ctx.skills().load().await?;
            out.emit(&info, || format!("Restored archive {}", describe_archive(&info)))
        }
    }
}
