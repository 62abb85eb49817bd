// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Guarded protocol operations on a walkthrough session.
//!
//! Every operation checks its preconditions before touching state, so a rejected call leaves
//! the session exactly as it was. [`StepDeliveryServer`] serializes the operations behind one
//! lock.

mod delivery;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    GapReport, GapType, SchemaError, SessionState, Severity, SeverityCounts, StepContent,
    WalkthroughId, WalkthroughSession,
};

pub use delivery::StepDeliveryServer;

const DEFAULT_ABORT_REASON: &str = "aborted by orchestrator";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    SchemaInvalid(#[from] SchemaError),
    #[error("no walkthrough session has been started")]
    NotStarted,
    #[error(
        "walkthrough session {walkthrough_id} is already active ({cursor}/{total_steps} steps delivered)"
    )]
    SessionActive { walkthrough_id: String, cursor: usize, total_steps: usize },
    #[error("walkthrough complete: all {total_steps} steps have been delivered")]
    AlreadyComplete { total_steps: usize },
    #[error("step {step_number} has not been delivered yet ({delivered} of {total_steps} delivered)")]
    UnseenStep { step_number: usize, delivered: usize, total_steps: usize },
    #[error("invalid {field} {value:?}: {reason}")]
    Validation { field: &'static str, value: String, reason: String },
    #[error("walkthrough session was aborted: {reason}")]
    Aborted { reason: String },
}

impl ProtocolError {
    /// Stable machine-readable code, surfaced to MCP clients in the error `data`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaInvalid(_) => "schema_invalid",
            Self::NotStarted => "not_started",
            Self::SessionActive { .. } => "session_active",
            Self::AlreadyComplete { .. } => "already_complete",
            Self::UnseenStep { .. } => "unseen_step",
            Self::Validation { .. } => "validation_error",
            Self::Aborted { .. } => "aborted",
        }
    }

    fn validation(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field, value: value.into(), reason: reason.into() }
    }
}

/// Summary returned by a successful `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSummary {
    pub walkthrough_id: WalkthroughId,
    pub title: String,
    pub description: String,
    pub total_steps: usize,
    pub estimated_duration_minutes: u32,
}

/// One step as delivered to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredStep {
    /// 1-based; the number gap reports refer to.
    pub step_number: usize,
    /// 0-based; equals the session cursor at the time of the call.
    pub position: usize,
    pub total_steps: usize,
    pub display_order: i64,
    pub title: String,
    pub content: StepContent,
    pub next_step_reference: Option<i64>,
    pub is_last: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    /// `None` before `start`.
    pub state: Option<SessionState>,
    pub walkthrough_id: Option<WalkthroughId>,
    pub title: Option<String>,
    pub cursor: usize,
    pub total_steps: usize,
    pub is_complete: bool,
    pub gap_count: usize,
    pub progress_percentage: f64,
    pub gaps_by_severity: SeverityCounts,
}

/// Unvalidated gap report as received from the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapDraft {
    /// Defaults to the most recently delivered step when omitted.
    pub step_number: Option<usize>,
    pub gap_type: String,
    pub severity: String,
    pub description: String,
    pub suggested_fix: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapReceipt {
    pub gap_index: usize,
    pub step_number: usize,
    pub step_title: String,
    pub gap_type: GapType,
    pub severity: Severity,
    pub total_gaps: usize,
}

pub fn status(session: Option<&WalkthroughSession>) -> SessionStatus {
    let Some(session) = session else {
        return SessionStatus {
            state: None,
            walkthrough_id: None,
            title: None,
            cursor: 0,
            total_steps: 0,
            is_complete: false,
            gap_count: 0,
            progress_percentage: 0.0,
            gaps_by_severity: SeverityCounts::default(),
        };
    };

    SessionStatus {
        state: Some(session.state()),
        walkthrough_id: Some(session.walkthrough_id().clone()),
        title: Some(session.definition().title().to_owned()),
        cursor: session.cursor(),
        total_steps: session.total_steps(),
        is_complete: session.is_complete(),
        gap_count: session.gaps().len(),
        progress_percentage: session.progress_percentage(),
        gaps_by_severity: SeverityCounts::tally(session.gaps()),
    }
}

fn ensure_not_aborted(session: &WalkthroughSession) -> Result<(), ProtocolError> {
    match session.abort_reason() {
        Some(reason) => Err(ProtocolError::Aborted { reason: reason.to_owned() }),
        None => Ok(()),
    }
}

/// Delivers the step under the cursor and advances past it.
pub fn fetch_next(
    session: &mut WalkthroughSession,
    now: DateTime<Utc>,
) -> Result<DeliveredStep, ProtocolError> {
    ensure_not_aborted(session)?;

    let total_steps = session.total_steps();
    let Some((position, step)) = session.advance(now) else {
        return Err(ProtocolError::AlreadyComplete { total_steps });
    };

    Ok(DeliveredStep {
        step_number: position + 1,
        position,
        total_steps,
        display_order: step.display_order(),
        title: step.title().to_owned(),
        content: step.content().clone(),
        next_step_reference: step.next_step_reference(),
        is_last: position + 1 == total_steps,
    })
}

/// Validates `draft` against the session and appends it.
///
/// The step number is checked before the enums so that a look-ahead report is always
/// `UnseenStep`, whatever else is wrong with it.
pub fn report_gap(
    session: &mut WalkthroughSession,
    draft: GapDraft,
    now: DateTime<Utc>,
) -> Result<GapReceipt, ProtocolError> {
    ensure_not_aborted(session)?;

    let delivered = session.cursor();
    let total_steps = session.total_steps();
    let step_number = match draft.step_number {
        Some(0) => {
            return Err(ProtocolError::validation("step_number", "0", "step numbers start at 1"));
        }
        Some(step_number) => step_number,
        None => delivered.max(1),
    };
    if step_number > delivered {
        return Err(ProtocolError::UnseenStep { step_number, delivered, total_steps });
    }

    let gap_type = draft.gap_type.parse::<GapType>().map_err(|_| {
        ProtocolError::validation(
            "gap_type",
            draft.gap_type.clone(),
            format!("expected one of: {}", GapType::NAMES.join(", ")),
        )
    })?;
    let severity = draft.severity.parse::<Severity>().map_err(|_| {
        ProtocolError::validation(
            "severity",
            draft.severity.clone(),
            format!("expected one of: {}", Severity::NAMES.join(", ")),
        )
    })?;
    if draft.description.trim().is_empty() {
        return Err(ProtocolError::validation(
            "description",
            draft.description,
            "description must not be blank",
        ));
    }

    let step_title = session
        .definition()
        .steps()
        .get(step_number - 1)
        .map(|step| step.title().to_owned())
        .unwrap_or_default();

    let gap_index = session.push_gap(GapReport {
        step_number,
        step_title: step_title.clone(),
        gap_type,
        severity,
        description: draft.description,
        suggested_fix: non_blank(draft.suggested_fix),
        context: non_blank(draft.context),
        timestamp: now,
    });

    Ok(GapReceipt {
        gap_index,
        step_number,
        step_title,
        gap_type,
        severity,
        total_gaps: session.gaps().len(),
    })
}

/// Abandons an in-progress session. Gaps collected so far stay renderable.
pub fn abort(
    session: &mut WalkthroughSession,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), ProtocolError> {
    ensure_not_aborted(session)?;
    if session.is_complete() {
        return Err(ProtocolError::AlreadyComplete { total_steps: session.total_steps() });
    }

    let reason = non_blank(reason).unwrap_or_else(|| DEFAULT_ABORT_REASON.to_owned());
    session.mark_aborted(reason, now);
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
