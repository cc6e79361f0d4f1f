//! Client Configuration
//!
//! Loaded from a JSON file, then overridden by `KANBAN_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// What a failed promotion puts back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PromotionRollback {
    /// Only the flag is reverted, the bucket keeps its new order
    #[default]
    FlagOnly,
    /// The flag and the bucket's previous order and positions are restored
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub api_url: String,
    pub token: Option<String>,
    /// Only items of this project are mirrored
    pub project_id: Option<u32>,
    pub drag_threshold_px: i32,
    pub promotion_rollback: PromotionRollback,
    /// Directory for rolling log files, logging to file is off when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            project_id: None,
            drag_threshold_px: board_dragdrop::DRAG_THRESHOLD_PX,
            promotion_rollback: PromotionRollback::FlagOnly,
            log_dir: None,
        }
    }
}

impl BoardConfig {
    pub fn from_json_str(json: &str) -> BoardResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BoardError::InvalidInput(format!("config: {}", e)))
    }

    pub fn load(path: &Path) -> BoardResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BoardError::Internal(format!("read {}: {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Apply `KANBAN_API_URL`, `KANBAN_TOKEN` and `KANBAN_PROJECT_ID`
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("KANBAN_API_URL").filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup("KANBAN_TOKEN").filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        if let Some(project) = lookup("KANBAN_PROJECT_ID") {
            match project.parse::<u32>() {
                Ok(id) => self.project_id = Some(id),
                Err(_) => log::warn!("[CONFIG] ignoring KANBAN_PROJECT_ID={:?}", project),
            }
        }
        self
    }
}
