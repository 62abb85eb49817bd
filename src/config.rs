// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;

use crate::audit::AuditPolicy;
use crate::model::AuditTarget;
use crate::store::{AuditFolder, WriteDurability};

/// Runtime settings of an MCP server, resolved from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Persist snapshots and results here; `None` keeps everything in memory.
    pub output_dir: Option<PathBuf>,
    pub durability: WriteDurability,
    pub policy: AuditPolicy,
    /// Rewrite `<id>_session.json` after every mutation. The final result is written regardless.
    pub persist_snapshots: bool,
    /// Echoed into every audit result.
    pub target: AuditTarget,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            durability: WriteDurability::BestEffort,
            policy: AuditPolicy::default(),
            persist_snapshots: true,
            target: AuditTarget::default(),
        }
    }
}

impl ServeConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn persistent(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: Some(output_dir.into()), ..Self::default() }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn with_policy(mut self, policy: AuditPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_snapshots(mut self, persist_snapshots: bool) -> Self {
        self.persist_snapshots = persist_snapshots;
        self
    }

    pub fn with_target(mut self, target: AuditTarget) -> Self {
        self.target = target;
        self
    }

    pub fn audit_folder(&self) -> Option<AuditFolder> {
        self.output_dir
            .as_ref()
            .map(|dir| AuditFolder::new(dir).with_durability(self.durability))
    }
}
