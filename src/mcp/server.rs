// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};

use crate::audit::AuditPolicy;
use crate::config::ServeConfig;
use crate::model::{SchemaError, SessionState, WalkthroughDefinition, WalkthroughId};
use crate::ops::{
    DeliveredStep, GapDraft, ProtocolError, SessionStatus, StartSummary, StepDeliveryServer,
};
use crate::store::{
    definition_from_export, load_walkthrough_definition, AuditFolder, StoreError,
    WalkthroughExport,
};

use super::types::*;

/// MCP front end of one audit run.
///
/// Clones share the same session, so every transport session (stdio or HTTP) sees one audit.
#[derive(Clone)]
pub struct WalkauditMcp {
    server: Arc<StepDeliveryServer>,
    folder: Option<Arc<AuditFolder>>,
    policy: AuditPolicy,
    persist_snapshots: bool,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WalkauditMcp {
    pub fn new(config: &ServeConfig) -> Self {
        Self {
            server: Arc::new(StepDeliveryServer::new().with_target(config.target.clone())),
            folder: config.audit_folder().map(Arc::new),
            policy: config.policy,
            persist_snapshots: config.persist_snapshots,
            tool_router: Self::tool_router(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(&ServeConfig::in_memory())
    }

    pub fn delivery(&self) -> &StepDeliveryServer {
        &self.server
    }

    pub fn audit_folder(&self) -> Option<&AuditFolder> {
        self.folder.as_deref()
    }

    /// Starts the session before any client connects (`serve --walkthrough`).
    pub fn start_definition(
        &self,
        definition: WalkthroughDefinition,
    ) -> Result<StartSummary, ProtocolError> {
        let summary = self.server.start(Arc::new(definition))?;
        self.persist_snapshot();
        Ok(summary)
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Writes the final snapshot and audit result, if a session was started.
    ///
    /// Called when the transport closes; an in-progress session is persisted as-is.
    pub fn finalize(&self) -> Option<PathBuf> {
        if !self.server.has_session() {
            return None;
        }
        self.persist_snapshot();
        self.persist_audit()
    }

    fn persist_snapshot(&self) {
        let Some(folder) = self.folder.as_deref() else {
            return;
        };
        if !self.persist_snapshots {
            return;
        }
        let Some(snapshot) = self.server.snapshot() else {
            return;
        };
        if let Err(err) = folder.save_snapshot(&snapshot) {
            tracing::warn!(error = %err, "failed to persist session snapshot");
        }
    }

    fn persist_audit(&self) -> Option<PathBuf> {
        let folder = self.folder.as_deref()?;
        let result = self.server.render_result(self.policy).ok()?;
        match folder.save_audit_result(&result) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist audit result");
                None
            }
        }
    }

    /// Load a walkthrough (export file path or inline document) and start the audit session.
    /// Only one session per server; steps are then pulled one at a time with
    /// `walkthrough.next_step`.
    #[tool(name = "walkthrough.start")]
    async fn walkthrough_start(
        &self,
        params: Parameters<WalkthroughStartParams>,
    ) -> Result<Json<WalkthroughStartResponse>, ErrorData> {
        let WalkthroughStartParams { walkthrough_path, walkthrough, walkthrough_id } = params.0;
        let walkthrough_id = walkthrough_id.as_deref().map(parse_walkthrough_id).transpose()?;

        let definition = match (walkthrough_path, walkthrough) {
            (Some(path), None) => load_walkthrough_definition(Path::new(&path), walkthrough_id)
                .map_err(store_error_to_mcp)?,
            (None, Some(document)) => {
                let Some(walkthrough_id) = walkthrough_id else {
                    return Err(ErrorData::invalid_params(
                        "walkthrough_id is required with an inline walkthrough",
                        Some(serde_json::json!({ "code": "validation_error", "field": "walkthrough_id" })),
                    ));
                };
                let export: WalkthroughExport = serde_json::from_value(document).map_err(|err| {
                    protocol_error_to_mcp(SchemaError::malformed(err.to_string()).into())
                })?;
                definition_from_export(walkthrough_id, export)
                    .map_err(|err| protocol_error_to_mcp(err.into()))?
            }
            _ => {
                return Err(ErrorData::invalid_params(
                    "exactly one of walkthrough_path or walkthrough is required",
                    None,
                ));
            }
        };

        let summary = self.start_definition(definition).map_err(protocol_error_to_mcp)?;
        Ok(Json(WalkthroughStartResponse {
            walkthrough_id: summary.walkthrough_id.to_string(),
            title: summary.title,
            description: summary.description,
            total_steps: summary.total_steps as u64,
            estimated_duration_minutes: summary.estimated_duration_minutes,
        }))
    }

    /// Deliver the next step and advance. Steps are strictly sequential: there is no way to
    /// peek ahead or skip. Fails with `already_complete` once every step was delivered.
    #[tool(name = "walkthrough.next_step")]
    async fn walkthrough_next_step(&self) -> Result<Json<NextStepResponse>, ErrorData> {
        let step = self.server.fetch_next().map_err(protocol_error_to_mcp)?;
        self.persist_snapshot();
        if step.is_last {
            self.persist_audit();
        }
        Ok(Json(next_step_response(step)))
    }

    /// Read-only progress: cursor, completion and gap counts by severity.
    #[tool(name = "walkthrough.status")]
    async fn walkthrough_status(&self) -> Result<Json<StatusResponse>, ErrorData> {
        Ok(Json(status_response(self.server.status())))
    }

    /// Record a documentation gap against an already delivered step. Gaps are append-only.
    #[tool(name = "walkthrough.report_gap")]
    async fn walkthrough_report_gap(
        &self,
        params: Parameters<ReportGapParams>,
    ) -> Result<Json<ReportGapResponse>, ErrorData> {
        let ReportGapParams { step_number, gap_type, severity, description, suggested_fix, context } =
            params.0;
        let draft = GapDraft {
            step_number: step_number.map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
            gap_type,
            severity,
            description,
            suggested_fix,
            context,
        };

        let receipt = self.server.report_gap(draft).map_err(protocol_error_to_mcp)?;
        self.persist_snapshot();
        // The audit file was already written when the last step went out.
        if self.server.status().state == Some(SessionState::Complete) {
            self.persist_audit();
        }
        Ok(Json(ReportGapResponse {
            gap_index: receipt.gap_index as u64,
            step_number: receipt.step_number as u64,
            step_title: receipt.step_title,
            gap_type: receipt.gap_type,
            severity: receipt.severity,
            total_gaps: receipt.total_gaps as u64,
        }))
    }

    /// Abort an in-progress walkthrough. The session is frozen; `audit.result` still renders
    /// the partial audit.
    #[tool(name = "walkthrough.abort")]
    async fn walkthrough_abort(
        &self,
        params: Parameters<AbortParams>,
    ) -> Result<Json<AbortResponse>, ErrorData> {
        let snapshot = self.server.abort(params.0.reason).map_err(protocol_error_to_mcp)?;
        self.persist_snapshot();
        let audit_path = self.persist_audit();

        Ok(Json(AbortResponse {
            walkthrough_id: snapshot.walkthrough_id,
            reason: snapshot.abort_reason.unwrap_or_default(),
            cursor: snapshot.cursor as u64,
            total_steps: snapshot.total_steps as u64,
            gap_count: snapshot.gaps.len() as u64,
            audit_path: audit_path.map(|path| path.display().to_string()),
        }))
    }

    /// Render the audit result (counts per severity and category, verdict, all gaps). Pure:
    /// repeated calls on the same state return the same result.
    #[tool(name = "audit.result")]
    async fn audit_result(
        &self,
        params: Parameters<AuditResultParams>,
    ) -> Result<Json<AuditResultResponse>, ErrorData> {
        let AuditResultParams { fail_on_critical, write } = params.0;
        let policy = AuditPolicy {
            fail_on_critical: fail_on_critical.unwrap_or(self.policy.fail_on_critical),
        };
        let result = self.server.render_result(policy).map_err(protocol_error_to_mcp)?;

        let written_path = if write.unwrap_or(false) {
            let Some(folder) = self.folder.as_deref() else {
                return Err(ErrorData::invalid_request(
                    "no output folder configured (start the server with --output-dir)",
                    Some(serde_json::json!({ "code": "no_output_dir" })),
                ));
            };
            let path = folder.save_audit_result(&result).map_err(store_error_to_mcp)?;
            Some(path.display().to_string())
        } else {
            None
        };

        Ok(Json(AuditResultResponse { result, written_path }))
    }
}

#[tool_handler]
impl ServerHandler for WalkauditMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Walkaudit step-gated walkthrough auditor (tools: walkthrough.start, walkthrough.next_step, walkthrough.status, walkthrough.report_gap, walkthrough.abort, audit.result). Execute each delivered step, report gaps only for steps already delivered, then read audit.result."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Error mapping and response conversion for the tool handlers.
include!("server/helpers.rs");

#[cfg(test)]
mod e2e;
