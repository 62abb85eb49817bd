// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::AuditResult;
use crate::model::{
    IdError, SchemaError, SessionSnapshot, Step, StepContent, WalkthroughDefinition,
    WalkthroughId, WalkthroughInfo,
};

const SESSION_SNAPSHOT_SUFFIX: &str = "_session.json";
const AUDIT_RESULT_SUFFIX: &str = "_audit.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path:?}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },
    #[error("invalid walkthrough id {value:?}: {source}")]
    InvalidId {
        value: String,
        #[source]
        source: IdError,
    },
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
}

impl StoreError {
    /// True when the error is a missing input file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Temp file plus atomic rename; no fsync.
    #[default]
    BestEffort,

    /// Additionally syncs the written file and its directory where the platform allows it.
    Durable,
}

/// Output folder holding `<id>_session.json` snapshots and `<id>_audit.json` results.
#[derive(Debug)]
pub struct AuditFolder {
    root: PathBuf,
    durability: WriteDurability,
    // Highest snapshot rev written per walkthrough. Held across the write itself, so snapshot
    // writes are serialized and never go backwards.
    snapshot_revs: Mutex<BTreeMap<String, u64>>,
}

impl AuditFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
            snapshot_revs: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_snapshot_path(&self, walkthrough_id: &str) -> PathBuf {
        self.root.join(format!(
            "{}{SESSION_SNAPSHOT_SUFFIX}",
            encode_persisted_id_segment(walkthrough_id)
        ))
    }

    pub fn audit_result_path(&self, walkthrough_id: &str) -> PathBuf {
        self.root.join(format!(
            "{}{AUDIT_RESULT_SUFFIX}",
            encode_persisted_id_segment(walkthrough_id)
        ))
    }

    /// Writes `snapshot` unless a snapshot with the same or a newer rev was already written.
    ///
    /// Returns whether the file was written.
    pub fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<bool, StoreError> {
        let mut revs = self.snapshot_revs.lock().unwrap_or_else(PoisonError::into_inner);
        if revs
            .get(&snapshot.walkthrough_id)
            .is_some_and(|&written| written >= snapshot.rev)
        {
            tracing::debug!(
                walkthrough_id = %snapshot.walkthrough_id,
                rev = snapshot.rev,
                "skipping stale session snapshot"
            );
            return Ok(false);
        }

        let path = self.session_snapshot_path(&snapshot.walkthrough_id);
        write_json_atomic(&self.root, &path, snapshot, self.durability)?;
        revs.insert(snapshot.walkthrough_id.clone(), snapshot.rev);
        tracing::debug!(path = %path.display(), rev = snapshot.rev, "session snapshot written");
        Ok(true)
    }

    pub fn save_audit_result(&self, result: &AuditResult) -> Result<PathBuf, StoreError> {
        let path = self.audit_result_path(&result.walkthrough_id);
        write_json_atomic(&self.root, &path, result, self.durability)?;
        tracing::info!(
            path = %path.display(),
            success = result.success,
            gaps = result.gap_count,
            "audit result written"
        );
        Ok(path)
    }

    pub fn load_snapshot(path: &Path) -> Result<SessionSnapshot, StoreError> {
        let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_audit_result(&self, walkthrough_id: &str) -> Result<AuditResult, StoreError> {
        let path = self.audit_result_path(walkthrough_id);
        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Json { path, source })
    }
}

/// Loads and validates a walkthrough export document.
///
/// The id defaults to the file stem of `path`.
pub fn load_walkthrough_definition(
    path: &Path,
    walkthrough_id: Option<WalkthroughId>,
) -> Result<WalkthroughDefinition, StoreError> {
    let walkthrough_id = match walkthrough_id {
        Some(walkthrough_id) => walkthrough_id,
        None => {
            let stem = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            WalkthroughId::new(stem.clone())
                .map_err(|source| StoreError::InvalidId { value: stem, source })?
        }
    };

    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_walkthrough_export(walkthrough_id, &raw).map_err(|source| StoreError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses an export document from text. Malformed JSON is reported as a schema violation.
pub fn parse_walkthrough_export(
    walkthrough_id: WalkthroughId,
    raw: &str,
) -> Result<WalkthroughDefinition, SchemaError> {
    let export: WalkthroughExport =
        serde_json::from_str(raw).map_err(|err| SchemaError::malformed(err.to_string()))?;
    definition_from_export(walkthrough_id, export)
}

/// The export document produced by the walkthrough generator.
///
/// Unknown fields (`version`, `exportedAt`, `createdAt`, ...) are accepted and ignored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalkthroughExport {
    pub walkthrough: WalkthroughInfoExport,
    #[serde(default)]
    pub steps: Vec<StepExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalkthroughInfoExport {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub estimated_duration_minutes: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepExport {
    pub title: String,
    pub display_order: i64,
    #[serde(default)]
    pub content_fields: StepContentExport,
    #[serde(default)]
    pub next_step_reference: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepContentExport {
    #[serde(default)]
    pub content_for_user: String,
    #[serde(default)]
    pub context_for_agent: String,
    #[serde(default)]
    pub operations_for_agent: String,
    #[serde(default)]
    pub introduction_for_agent: String,
}

pub fn definition_from_export(
    walkthrough_id: WalkthroughId,
    export: WalkthroughExport,
) -> Result<WalkthroughDefinition, SchemaError> {
    let defaults = WalkthroughInfo::default();
    let info = WalkthroughInfo {
        title: export.walkthrough.title,
        description: export.walkthrough.description,
        kind: export.walkthrough.kind.unwrap_or(defaults.kind),
        status: export.walkthrough.status.unwrap_or(defaults.status),
        estimated_duration_minutes: export.walkthrough.estimated_duration_minutes,
        tags: export.walkthrough.tags.into_iter().collect(),
    };

    let steps = export
        .steps
        .into_iter()
        .map(|step| {
            let content = StepContent {
                content_for_user: step.content_fields.content_for_user,
                context_for_agent: step.content_fields.context_for_agent,
                operations_for_agent: step.content_fields.operations_for_agent,
                introduction_for_agent: step.content_fields.introduction_for_agent,
            };
            Step::new(step.title, step.display_order, content)
                .with_next_step_reference(step.next_step_reference)
        })
        .collect();

    WalkthroughDefinition::new(walkthrough_id, info, steps)
}

include!("audit_folder/helpers.rs");
