use super::{write_json_file, Output};
use crate::cli::SkillsCommand;
use anyhow::Result;
use mcpbridge_snapshot::SkillConfig;
use mcpbridge_sync::AppContext;

fn render_skills(skills: &[SkillConfig]) -> String {
    if skills.is_empty() {
        return "No skills configured.".to_string();
    }
    skills
        .iter()
        .map(|s| {
            format!(
                "[{}] {} ({}){}",
                if s.enabled { "x" } else { " " },
                s.name,
                s.partition,
                s.description
                    .as_deref()
                    .map(|d| format!(" - {d}"))
                    .unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) async fn handle_skills(
    ctx: &AppContext,
    out: Output,
    command: SkillsCommand,
) -> Result<()> {
    let skills = ctx.skills();
    skills.load().await?;
    match command {
        SkillsCommand::List { partition } => {
            let list = skills.list(partition).await;
            out.emit(&list, || render_skills(&list))
        }
        SkillsCommand::Add {
            name,
            description,
            partition,
        } => {
            skills.add(&name, description, partition).await?;
            out.emit(&serde_json::json!({"added": name, "partition": partition}), || {
                format!("Added skill '{name}' ({partition})")
            })
        }
        SkillsCommand::Update {
            name,
            partition,
            description,
            enabled,
        } => {
            skills.update(&name, partition, description, enabled).await?;
            out.emit(&serde_json::json!({"updated": name, "partition": partition}), || {
                format!("Updated skill '{name}' ({partition})")
            })
        }
        SkillsCommand::Toggle {
            name,
            partition,
            enabled,
        } => {
            skills.toggle(&name, partition, enabled).await?;
            out.emit(
                &serde_json::json!({"name": name, "partition": partition, "enabled": enabled}),
                || {
                    format!(
                        "{} skill '{name}' ({partition})",
                        if enabled { "Enabled" } else { "Disabled" }
                    )
                },
            )
        }
        SkillsCommand::Remove { name, partition } => {
            skills.remove(&name, partition).await?;
            out.emit(&serde_json::json!({"removed": name, "partition": partition}), || {
                format!("Removed skill '{name}' ({partition})")
            })
        }
        SkillsCommand::Export { path } => {
            let list = skills.list(None).await;
            write_json_file(&path, &serde_json::json!({ "skills": list }))?;
            out.emit(
                &serde_json::json!({"exported": list.len(), "path": path}),
                || format!("Exported {} skills to {}", list.len(), path.display()),
            )
        }
    }
}
