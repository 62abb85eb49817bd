// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::gap::GapReport;
use super::ids::WalkthroughId;
use super::walkthrough::{Step, WalkthroughDefinition};

/// Lifecycle of a started session. `NotStarted` is modelled by the absence of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    InProgress,
    Complete,
    Aborted,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The library a walkthrough is audited against. Audits of one walkthrough against different
/// library versions are told apart by this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuditTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_version: Option<String>,
}

impl AuditTarget {
    pub fn new(library_name: Option<String>, library_version: Option<String>) -> Self {
        Self { library_name, library_version }
    }
}

/// Mutable state of one walkthrough execution.
///
/// Fields only change through the guarded operations in [`crate::ops`]; the raw mutators here
/// are crate-private and assume the guards already passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkthroughSession {
    definition: Arc<WalkthroughDefinition>,
    target: AuditTarget,
    cursor: usize,
    gaps: Vec<GapReport>,
    abort_reason: Option<String>,
    rev: u64,
    started_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl WalkthroughSession {
    pub fn new(definition: Arc<WalkthroughDefinition>, now: DateTime<Utc>) -> Self {
        Self {
            definition,
            target: AuditTarget::default(),
            cursor: 0,
            gaps: Vec::new(),
            abort_reason: None,
            rev: 0,
            started_at: now,
            last_updated: now,
        }
    }

    pub fn with_target(mut self, target: AuditTarget) -> Self {
        self.target = target;
        self
    }

    pub fn walkthrough_id(&self) -> &WalkthroughId {
        self.definition.walkthrough_id()
    }

    pub fn target(&self) -> &AuditTarget {
        &self.target
    }

    pub fn definition(&self) -> &Arc<WalkthroughDefinition> {
        &self.definition
    }

    /// Index of the next step to deliver; equals the number of steps delivered so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_steps(&self) -> usize {
        self.definition.total_steps()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.total_steps()
    }

    pub fn state(&self) -> SessionState {
        if self.abort_reason.is_some() {
            SessionState::Aborted
        } else if self.is_complete() {
            SessionState::Complete
        } else {
            SessionState::InProgress
        }
    }

    pub fn gaps(&self) -> &[GapReport] {
        &self.gaps
    }

    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn progress_percentage(&self) -> f64 {
        progress_percentage(self.cursor, self.total_steps())
    }

    /// The most recently delivered step, if any.
    pub fn last_delivered(&self) -> Option<&Step> {
        self.cursor.checked_sub(1).and_then(|idx| self.definition.steps().get(idx))
    }

    pub(crate) fn advance(&mut self, now: DateTime<Utc>) -> Option<(usize, &Step)> {
        let position = self.cursor;
        let step = self.definition.steps().get(position)?;
        self.cursor += 1;
        self.rev = self.rev.saturating_add(1);
        self.last_updated = now;
        Some((position, step))
    }

    pub(crate) fn push_gap(&mut self, gap: GapReport) -> usize {
        self.last_updated = gap.timestamp;
        self.gaps.push(gap);
        self.rev = self.rev.saturating_add(1);
        self.gaps.len() - 1
    }

    pub(crate) fn mark_aborted(&mut self, reason: String, now: DateTime<Utc>) {
        self.abort_reason = Some(reason);
        self.rev = self.rev.saturating_add(1);
        self.last_updated = now;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            walkthrough_id: self.walkthrough_id().to_string(),
            title: self.definition.title().to_owned(),
            library_name: self.target.library_name.clone(),
            library_version: self.target.library_version.clone(),
            state: self.state(),
            abort_reason: self.abort_reason.clone(),
            cursor: self.cursor,
            total_steps: self.total_steps(),
            is_complete: self.is_complete(),
            rev: self.rev,
            gaps: self.gaps.clone(),
            started_at: self.started_at,
            last_updated: self.last_updated,
        }
    }
}

pub(crate) fn progress_percentage(cursor: usize, total_steps: usize) -> f64 {
    if total_steps == 0 {
        return 0.0;
    }
    let raw = cursor as f64 / total_steps as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// Serializable point-in-time copy of a session; what the audit store persists after each
/// mutation and what `walkaudit render` reads back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionSnapshot {
    pub walkthrough_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_version: Option<String>,
    pub state: SessionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub cursor: usize,
    pub total_steps: usize,
    pub is_complete: bool,
    pub rev: u64,
    pub gaps: Vec<GapReport>,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}
