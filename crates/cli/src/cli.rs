use clap::{ArgAction, Parser, Subcommand};
use mcpbridge_snapshot::{SkillPartition, Source};
use std::path::PathBuf;

/// Command-line interface for the `mcpbridge` application.
#[derive(Debug, Parser)]
#[command(
    name = "mcpbridge",
    version,
    about = "Keeps OpenCode and Claude Code MCP configurations reconciled and backed up"
)]
pub struct Cli {
    /// Prints machine-readable JSON instead of text (also `MCPBRIDGE_JSON=1`).
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    /// OpenCode config file (overrides `MCPBRIDGE_OPENCODE_CONFIG`).
    #[arg(long, global = true, value_name = "FILE")]
    pub opencode_config: Option<PathBuf>,
    /// Claude Code config file (overrides `MCPBRIDGE_CLAUDE_CONFIG`).
    #[arg(long, global = true, value_name = "FILE")]
    pub claude_config: Option<PathBuf>,
    /// Skills file (overrides `MCPBRIDGE_SKILLS_CONFIG`).
    #[arg(long, global = true, value_name = "FILE")]
    pub skills_config: Option<PathBuf>,
    /// Backup directory (overrides `MCPBRIDGE_BACKUP_DIR`).
    #[arg(long, global = true, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,
    /// Full-config archive directory (overrides `MCPBRIDGE_ARCHIVE_DIR`).
    #[arg(long, global = true, value_name = "DIR")]
    pub archive_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `mcpbridge` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lists MCP items of one or both sources.
    List {
        /// Restrict to one source: opencode or claude.
        #[arg(long)]
        source: Option<Source>,
    },
    /// Shows one item's config, kind and summary.
    Show { source: Source, name: String },
    /// Adds an item. CONFIG is a JSON object, or `-` to read stdin.
    Add {
        source: Source,
        name: String,
        config: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Replaces an existing item's config.
    Update {
        source: Source,
        name: String,
        config: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Permanently deletes an item.
    Delete { source: Source, name: String },
    /// Shows names present in only one source.
    Diff {
        /// Also report shared names whose content differs.
        #[arg(long, default_value_t = false)]
        drift: bool,
    },
    /// Copies one item into the other source, overwriting it there.
    Sync {
        name: String,
        #[arg(long)]
        from: Source,
        #[arg(long)]
        to: Source,
    },
    /// Copies every item missing from the target. Not transactional.
    SyncAll {
        #[arg(long)]
        from: Source,
        #[arg(long)]
        to: Source,
    },
    /// Snapshots a source, replacing its previous backup.
    Backup { source: Source },
    /// Shows metadata of a source's backup.
    BackupInfo { source: Source },
    /// Prints the items stored in a source's backup.
    BackupShow { source: Source },
    /// Restores from backup. Additive: live items are never deleted.
    Restore {
        source: Source,
        /// Restore only this item.
        #[arg(long)]
        name: Option<String>,
    },
    /// Archives all three config files together.
    #[command(subcommand)]
    Archive(ArchiveCommand),
    /// Manages skills.
    #[command(subcommand)]
    Skills(SkillsCommand),
    /// Prints the resolved config file locations.
    Paths,
    /// Writes both item lists to a JSON file.
    Export { path: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum ArchiveCommand {
    /// Writes a timestamped archive of the OpenCode, Claude and skills files.
    Create,
    /// Lists archives, newest first.
    List,
    /// Overwrites the config files with an archive's contents.
    Restore {
        /// Archive id as shown by `archive list`, e.g. `backup_20250101_120000.json`.
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SkillsCommand {
    /// Lists skills.
    List {
        /// global or project
        #[arg(long)]
        partition: Option<SkillPartition>,
    },
    /// Registers a skill.
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "global")]
        partition: SkillPartition,
    },
    /// Changes a skill's description and/or enabled flag.
    Update {
        name: String,
        #[arg(long, default_value = "global")]
        partition: SkillPartition,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Enables or disables a skill.
    Toggle {
        name: String,
        #[arg(long, default_value = "global")]
        partition: SkillPartition,
        #[arg(long, action = ArgAction::Set, required = true)]
        enabled: bool,
    },
    /// Removes a skill.
    Remove {
        name: String,
        #[arg(long, default_value = "global")]
        partition: SkillPartition,
    },
    /// Writes the skill list to a JSON file.
    Export { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sources_case_insensitively() {
        let cli = Cli::parse_from([
            "mcpbridge", "sync", "fs", "--from", "OpenCode", "--to", "claude",
        ]);
        match cli.command {
            Commands::Sync { name, from, to } => {
                assert_eq!(name, "fs");
                assert_eq!(from, Source::OpenCode);
                assert_eq!(to, Source::Claude);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_source() {
        assert!(Cli::try_parse_from(["mcpbridge", "backup", "codex"]).is_err());
    }

    #[test]
    fn skills_toggle_requires_state() {
        assert!(Cli::try_parse_from(["mcpbridge", "skills", "toggle", "review"]).is_err());
        let cli = Cli::try_parse_from([
            "mcpbridge",
            "skills",
            "toggle",
            "review",
            "--enabled",
            "false",
            "--partition",
            "project",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Skills(SkillsCommand::Toggle {
                enabled: false,
                partition: SkillPartition::Project,
                ..
            })
        ));
    }

    #[test]
    fn archive_restore_takes_an_id() {
        assert!(Cli::try_parse_from(["mcpbridge", "archive", "restore"]).is_err());
        let cli = Cli::parse_from([
            "mcpbridge",
            "archive",
            "restore",
            "backup_20250101_120000.json",
            "--archive-dir",
            "/tmp/archives",
        ]);
        assert_eq!(cli.archive_dir, Some(PathBuf::from("/tmp/archives")));
        match cli.command {
            Commands::Archive(ArchiveCommand::Restore { id }) => {
                assert_eq!(id, "backup_20250101_120000.json");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn skills_export_takes_a_path() {
        let cli = Cli::parse_from(["mcpbridge", "skills", "export", "out/skills.json"]);
        match cli.command {
            Commands::Skills(SkillsCommand::Export { path }) => {
                assert_eq!(path, PathBuf::from("out/skills.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_json_flag_after_subcommand() {
        let cli = Cli::parse_from(["mcpbridge", "list", "--json"]);
        assert!(cli.json);
    }
}
