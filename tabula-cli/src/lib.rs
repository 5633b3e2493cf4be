//! Operator commands for a Tabula database.
//!
//! The scheduled purge lives outside the platform; `tabula purge` is what a
//! cron entry runs.

use anyhow::{Context, Result};
use clap::Subcommand;
use tabula_core::{EntityKind, Platform, TrashScope};
use tabula_types::{BaseId, UserId};
use tracing::info;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create the database and apply the schema
    Init,

    /// Hard-delete trash older than the retention period
    Purge {
        /// Minimum age in days (defaults to `trash.retention-days`)
        #[arg(long)]
        days: Option<u32>,

        /// Only purge this kind (workspace, base, table, field, option, record, comment)
        #[arg(long)]
        kind: Option<EntityKind>,
    },

    /// Hard-delete everything a user has in the trash
    EmptyTrash {
        /// User whose trash is emptied
        #[arg(long)]
        owner: UserId,

        /// Only empty this kind
        #[arg(long)]
        kind: Option<EntityKind>,
    },

    /// Print the audit log of a base, newest first
    Audit {
        #[arg(long)]
        base: BaseId,

        /// Read the log as this user (base owner or SYSADMIN)
        #[arg(long = "as-user")]
        as_user: UserId,

        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
}

/// Runs one command and returns the lines to print.
pub fn execute(platform: &Platform, command: &Command) -> Result<Vec<String>> {
    match command {
        Command::Init => {
            let path = &platform.config().database.path;
            info!("Database ready at {:?}", path);
            Ok(vec![format!("database ready at {}", path.display())])
        }
        Command::Purge { days, kind } => {
            let days = days.unwrap_or(platform.config().trash.retention_days);
            let removed = match kind {
                Some(kind) => vec![(*kind, platform.purge_older_than(*kind, days)?)],
                None => platform.purge_all_older_than(days)?.removed,
            };
            Ok(summarize(&removed, &format!("older than {days} days")))
        }
        Command::EmptyTrash { owner, kind } => {
            let actor = platform
                .load_actor(*owner)
                .with_context(|| format!("no user {owner}"))?;
            let kinds = match kind {
                Some(kind) => vec![*kind],
                None => EntityKind::PURGE_ORDER.to_vec(),
            };
            let mut removed = Vec::with_capacity(kinds.len());
            for kind in kinds {
                let n = platform.empty_trash(Some(&actor), kind, TrashScope::Owner(*owner))?;
                removed.push((kind, n));
            }
            Ok(summarize(&removed, &format!("owned by user {owner}")))
        }
        Command::Audit { base, as_user, limit } => {
            let actor = platform
                .load_actor(*as_user)
                .with_context(|| format!("no user {as_user}"))?;
            let events = platform.list_audit_events(Some(&actor), *base, *limit, 0)?;
            Ok(events
                .iter()
                .map(|e| {
                    let who = e.user_id.map_or_else(|| "-".to_string(), |u| u.to_string());
                    format!(
                        "{}  {:<22} user={:<6} {}",
                        e.created_at.format("%Y-%m-%d %H:%M:%S"),
                        e.action.as_str(),
                        who,
                        e.summary
                    )
                })
                .collect())
        }
    }
}

fn summarize(removed: &[(EntityKind, usize)], what: &str) -> Vec<String> {
    let total: usize = removed.iter().map(|(_, n)| n).sum();
    let mut lines: Vec<String> = removed
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(kind, n)| format!("{:<10} {n}", kind.as_str()))
        .collect();
    lines.push(format!("removed {total} trashed rows {what}"));
    lines
}
