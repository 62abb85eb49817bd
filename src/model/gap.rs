// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a reported gap.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    Clarity,
    Prerequisite,
    LogicalFlow,
    #[serde(alias = "execution_error")]
    Execution,
    Completeness,
    CrossReference,
}

impl GapType {
    pub const ALL: [Self; 6] = [
        Self::Clarity,
        Self::Prerequisite,
        Self::LogicalFlow,
        Self::Execution,
        Self::Completeness,
        Self::CrossReference,
    ];

    pub const NAMES: &'static [&'static str] = &[
        "clarity",
        "prerequisite",
        "logical_flow",
        "execution",
        "completeness",
        "cross_reference",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clarity => "clarity",
            Self::Prerequisite => "prerequisite",
            Self::LogicalFlow => "logical_flow",
            Self::Execution => "execution",
            Self::Completeness => "completeness",
            Self::CrossReference => "cross_reference",
        }
    }
}

impl fmt::Display for GapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid gap type {0:?}")]
pub struct ParseGapTypeError(pub String);

impl FromStr for GapType {
    type Err = ParseGapTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clarity" => Ok(Self::Clarity),
            "prerequisite" => Ok(Self::Prerequisite),
            "logical_flow" => Ok(Self::LogicalFlow),
            // Older producers and agent prompts still use the long name.
            "execution" | "execution_error" => Ok(Self::Execution),
            "completeness" => Ok(Self::Completeness),
            "cross_reference" => Ok(Self::CrossReference),
            _ => Err(ParseGapTypeError(s.to_owned())),
        }
    }
}

/// How badly a gap blocks a first-time reader.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub const ALL: [Self; 3] = [Self::Critical, Self::Warning, Self::Info];

    pub const NAMES: &'static [&'static str] = &["critical", "warning", "info"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid severity {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Self::Critical),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(ParseSeverityError(s.to_owned())),
        }
    }
}

/// A defect found while executing a step. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GapReport {
    /// 1-based number of the step the gap belongs to.
    pub step_number: usize,
    pub step_title: String,
    pub gap_type: GapType,
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Tally of gaps by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SeverityCounts {
    pub critical: u64,
    pub warning: u64,
    pub info: u64,
}

impl SeverityCounts {
    pub fn tally<'a>(gaps: impl IntoIterator<Item = &'a GapReport>) -> Self {
        let mut counts = Self::default();
        for gap in gaps {
            let slot = match gap.severity {
                Severity::Critical => &mut counts.critical,
                Severity::Warning => &mut counts.warning,
                Severity::Info => &mut counts.info,
            };
            *slot += 1;
        }
        counts
    }

    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

/// Tally of gaps by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryCounts {
    pub clarity: u64,
    pub prerequisite: u64,
    pub logical_flow: u64,
    pub execution: u64,
    pub completeness: u64,
    pub cross_reference: u64,
}

impl CategoryCounts {
    pub fn tally<'a>(gaps: impl IntoIterator<Item = &'a GapReport>) -> Self {
        let mut counts = Self::default();
        for gap in gaps {
            let slot = match gap.gap_type {
                GapType::Clarity => &mut counts.clarity,
                GapType::Prerequisite => &mut counts.prerequisite,
                GapType::LogicalFlow => &mut counts.logical_flow,
                GapType::Execution => &mut counts.execution,
                GapType::Completeness => &mut counts.completeness,
                GapType::CrossReference => &mut counts.cross_reference,
            };
            *slot += 1;
        }
        counts
    }

    pub fn get(&self, gap_type: GapType) -> u64 {
        match gap_type {
            GapType::Clarity => self.clarity,
            GapType::Prerequisite => self.prerequisite,
            GapType::LogicalFlow => self.logical_flow,
            GapType::Execution => self.execution,
            GapType::Completeness => self.completeness,
            GapType::CrossReference => self.cross_reference,
        }
    }

    pub fn total(&self) -> u64 {
        GapType::ALL.iter().map(|gap_type| self.get(*gap_type)).sum()
    }
}
