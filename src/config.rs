//! Environment-driven configuration
//!
//! | variable | default | |
//! |---|---|---|
//! | `HOARD_AUTHOR` | none | author id recorded in commits and integrity events |
//! | `HOARD_PROJECT` | `default` | project commands operate on |
//! | `HOARD_BRANCH` | `main` | branch commands operate on |
//! | `HOARD_HISTORY_DEPTH` | `100` | commits searched for a last-known-good version |
//! | `HOARD_DATE` | now | RFC 2822 or `%Y-%m-%d %H:%M:%S %z` commit time |
//! | `HOARD_LOG` | `warn` | `tracing` filter directive (read by the binary) |

use crate::artifacts::branch::branch_name::{BranchName, ProjectId};
use crate::artifacts::objects::commit::Author;
use anyhow::Context;
use chrono::{DateTime, Utc};

pub const DEFAULT_HISTORY_DEPTH: usize = 100;
pub const LOG_ENV: &str = "HOARD_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct HoardConfig {
    pub author: Option<Author>,
    pub project: ProjectId,
    pub branch: BranchName,
    pub history_depth: usize,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for HoardConfig {
    fn default() -> Self {
        HoardConfig {
            author: None,
            project: ProjectId::default(),
            branch: BranchName::default(),
            history_depth: DEFAULT_HISTORY_DEPTH,
            timestamp: None,
        }
    }
}

impl HoardConfig {
    pub fn load_from_env() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable lookup.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let author = lookup("HOARD_AUTHOR").map(Author::try_parse).transpose()?;
        let project = match lookup("HOARD_PROJECT") {
            Some(project) => ProjectId::try_parse(project).context("invalid HOARD_PROJECT")?,
            None => ProjectId::default(),
        };
        let branch = match lookup("HOARD_BRANCH") {
            Some(branch) => BranchName::try_parse(branch).context("invalid HOARD_BRANCH")?,
            None => BranchName::default(),
        };
        let history_depth = match lookup("HOARD_HISTORY_DEPTH") {
            Some(depth) => depth
                .parse::<usize>()
                .with_context(|| format!("invalid HOARD_HISTORY_DEPTH {depth:?}"))?,
            None => DEFAULT_HISTORY_DEPTH,
        };
        let timestamp = lookup("HOARD_DATE").and_then(|date_str| {
            DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
                .map(|date| date.with_timezone(&Utc))
        });

        Ok(HoardConfig {
            author,
            project,
            branch,
            history_depth,
            timestamp,
        })
    }

    pub fn require_author(&self) -> anyhow::Result<&Author> {
        self.author.as_ref().context("HOARD_AUTHOR not set")
    }

    /// Actor name for integrity events; falls back to `anonymous`.
    pub fn actor(&self) -> &str {
        self.author.as_ref().map_or("anonymous", |author| author.as_ref())
    }
}
