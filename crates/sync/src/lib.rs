//! MCP configuration reconciliation for OpenCode and Claude Code.
//!
//! Keeps the MCP tables of both ecosystems in an in-memory registry,
//! reports drift between them, copies items across with format conversion,
//! and takes per-source backups that can be restored additively.
//!
//! # Examples
//!
//! ```
//! use mcpbridge_sync::{classify, parse, AppContext, Kind, Source};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let ctx = AppContext::in_memory();
//! let raw = r#"{"type": "remote", "url": "https://x/mcp"}"#;
//! ctx.registry().add("weather", raw, Source::OpenCode, None).await.unwrap();
//!
//! assert_eq!(classify(&parse(raw)), Kind::Remote);
//! assert_eq!(ctx.registry().names(Source::OpenCode).await, vec!["weather"]);
//!
//! let meta = ctx.backups().backup(Source::OpenCode).await.unwrap();
//! assert_eq!(meta.item_count, 1);
//! # });
//! ```

#![deny(unsafe_code)]

pub mod adapters;
pub mod backend;
pub mod backup;
pub mod context;
pub mod convert;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod single_flight;
pub mod skills;

pub use adapters::{ClaudeAdapter, OpenCodeAdapter, SourceAdapter};
pub use backend::{Backend, DiskBackend, MemBackend};
pub use backup::{BackupManager, BackupState};
pub use context::AppContext;
pub use convert::convert_for_target;
pub use diff::{compute_diff, compute_drift, content_hash, DiffReport, DriftReport};
pub use error::{Error, Result};
pub use normalize::{
    classify, describe, parse, parse_value, validate_for_submit, CommandSpec, Kind, ParsedConfig,
};
pub use orchestrator::SyncOrchestrator;
pub use registry::SourceRegistry;
pub use report::{BatchFailure, BatchReport, WriteReport};
pub use single_flight::{FlightGuard, Operation, SingleFlight};
pub use skills::SkillRegistry;

pub use mcpbridge_snapshot::{
    ArchiveInfo, BackupSnapshot, McpItem, McpList, RestoreReport, SkillConfig, SkillPartition,
    SnapshotMetadata, Source,
};
