// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::audit::AuditResult;
use crate::model::{GapType, Severity, SeverityCounts};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct WalkthroughStartParams {
    /// Path to a walkthrough export JSON file. Mutually exclusive with `walkthrough`.
    #[serde(default)]
    pub walkthrough_path: Option<String>,
    /// Inline walkthrough export document (`{ "walkthrough": {...}, "steps": [...] }`).
    #[serde(default)]
    pub walkthrough: Option<serde_json::Value>,
    /// Id used for persisted files. Defaults to the file stem of `walkthrough_path`; required
    /// with an inline document.
    #[serde(default)]
    pub walkthrough_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WalkthroughStartResponse {
    pub walkthrough_id: String,
    pub title: String,
    pub description: String,
    pub total_steps: u64,
    pub estimated_duration_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpStepContent {
    pub content_for_user: String,
    pub context_for_agent: String,
    pub operations_for_agent: String,
    pub introduction_for_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NextStepResponse {
    /// 1-based number to use in `walkthrough.report_gap`.
    pub step_number: u64,
    /// 0-based; the cursor before this delivery.
    pub position: u64,
    pub total_steps: u64,
    pub display_order: i64,
    pub title: String,
    pub content: McpStepContent,
    pub next_step_reference: Option<i64>,
    pub is_last: bool,
    pub progress_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
    /// `not_started`, `in_progress`, `complete` or `aborted`.
    pub state: String,
    pub walkthrough_id: Option<String>,
    pub title: Option<String>,
    pub cursor: u64,
    pub total_steps: u64,
    pub is_complete: bool,
    pub gap_count: u64,
    pub progress_percentage: f64,
    pub gaps_by_severity: SeverityCounts,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ReportGapParams {
    /// 1-based step number; defaults to the most recently delivered step.
    #[serde(default)]
    pub step_number: Option<u64>,
    /// One of clarity, prerequisite, logical_flow, execution, completeness, cross_reference.
    pub gap_type: String,
    /// One of critical, warning, info.
    pub severity: String,
    pub description: String,
    #[serde(default)]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportGapResponse {
    pub gap_index: u64,
    pub step_number: u64,
    pub step_title: String,
    pub gap_type: GapType,
    pub severity: Severity,
    pub total_gaps: u64,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AbortParams {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AbortResponse {
    pub walkthrough_id: String,
    pub reason: String,
    pub cursor: u64,
    pub total_steps: u64,
    pub gap_count: u64,
    /// Where the partial audit result was written, when persistence is enabled.
    pub audit_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AuditResultParams {
    /// Overrides the server's policy for this rendering.
    #[serde(default)]
    pub fail_on_critical: Option<bool>,
    /// Also write `<walkthrough_id>_audit.json` to the output folder.
    #[serde(default)]
    pub write: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuditResultResponse {
    pub result: AuditResult,
    pub written_path: Option<String>,
}
