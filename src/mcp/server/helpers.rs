// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

fn parse_walkthrough_id(raw: &str) -> Result<WalkthroughId, ErrorData> {
    WalkthroughId::new(raw.to_owned()).map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid walkthrough_id: {err}"),
            Some(serde_json::json!({
                "code": "validation_error",
                "field": "walkthrough_id",
                "value": raw,
            })),
        )
    })
}

fn protocol_error_data(err: &ProtocolError) -> serde_json::Value {
    let code = err.code();
    match err {
        ProtocolError::SchemaInvalid(schema) => serde_json::json!({
            "code": code,
            "violations": schema.violations().iter().map(ToString::to_string).collect::<Vec<_>>(),
        }),
        ProtocolError::NotStarted => serde_json::json!({ "code": code }),
        ProtocolError::SessionActive { walkthrough_id, cursor, total_steps } => serde_json::json!({
            "code": code,
            "walkthrough_id": walkthrough_id,
            "cursor": cursor,
            "total_steps": total_steps,
        }),
        ProtocolError::AlreadyComplete { total_steps } => serde_json::json!({
            "code": code,
            "cursor": total_steps,
            "total_steps": total_steps,
        }),
        ProtocolError::UnseenStep { step_number, delivered, total_steps } => serde_json::json!({
            "code": code,
            "step_number": step_number,
            "delivered": delivered,
            "total_steps": total_steps,
        }),
        ProtocolError::Validation { field, value, reason } => serde_json::json!({
            "code": code,
            "field": field,
            "value": value,
            "reason": reason,
        }),
        ProtocolError::Aborted { reason } => serde_json::json!({
            "code": code,
            "reason": reason,
        }),
    }
}

/// Input problems are invalid params; calls out of protocol order are invalid requests.
fn protocol_error_to_mcp(err: ProtocolError) -> ErrorData {
    tracing::warn!(code = err.code(), error = %err, "walkthrough operation rejected");
    let data = Some(protocol_error_data(&err));
    match err {
        ProtocolError::SchemaInvalid(_) | ProtocolError::Validation { .. } => {
            ErrorData::invalid_params(err.to_string(), data)
        }
        ProtocolError::NotStarted
        | ProtocolError::SessionActive { .. }
        | ProtocolError::AlreadyComplete { .. }
        | ProtocolError::UnseenStep { .. }
        | ProtocolError::Aborted { .. } => ErrorData::invalid_request(err.to_string(), data),
    }
}

fn store_error_to_mcp(err: StoreError) -> ErrorData {
    tracing::warn!(error = %err, "audit store operation failed");
    match &err {
        StoreError::Io { path, .. } if err.is_not_found() => ErrorData::resource_not_found(
            err.to_string(),
            Some(serde_json::json!({ "code": "not_found", "path": path })),
        ),
        StoreError::Schema { path, source } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({
                "code": "schema_invalid",
                "path": path,
                "violations": source.violations().iter().map(ToString::to_string).collect::<Vec<_>>(),
            })),
        ),
        StoreError::Json { path, .. } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({ "code": "schema_invalid", "path": path })),
        ),
        StoreError::InvalidId { value, .. } => ErrorData::invalid_params(
            err.to_string(),
            Some(serde_json::json!({
                "code": "validation_error",
                "field": "walkthrough_id",
                "value": value,
            })),
        ),
        StoreError::Io { .. } | StoreError::SymlinkRefused { .. } => ErrorData::internal_error(
            err.to_string(),
            Some(serde_json::json!({ "code": "store_error" })),
        ),
    }
}

fn next_step_response(step: DeliveredStep) -> NextStepResponse {
    NextStepResponse {
        progress_percentage: crate::model::session::progress_percentage(
            step.step_number,
            step.total_steps,
        ),
        step_number: step.step_number as u64,
        position: step.position as u64,
        total_steps: step.total_steps as u64,
        display_order: step.display_order,
        title: step.title,
        content: McpStepContent {
            content_for_user: step.content.content_for_user,
            context_for_agent: step.content.context_for_agent,
            operations_for_agent: step.content.operations_for_agent,
            introduction_for_agent: step.content.introduction_for_agent,
        },
        next_step_reference: step.next_step_reference,
        is_last: step.is_last,
    }
}

fn status_response(status: SessionStatus) -> StatusResponse {
    StatusResponse {
        state: status.state.map(SessionState::as_str).unwrap_or("not_started").to_owned(),
        walkthrough_id: status.walkthrough_id.map(WalkthroughId::into_string),
        title: status.title,
        cursor: status.cursor as u64,
        total_steps: status.total_steps as u64,
        is_complete: status.is_complete,
        gap_count: status.gap_count as u64,
        progress_percentage: status.progress_percentage,
        gaps_by_severity: status.gaps_by_severity,
    }
}
