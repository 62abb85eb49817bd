// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::audit::{render_result, AuditPolicy, AuditResult};
use crate::model::{
    AuditTarget, SessionSnapshot, Step, WalkthroughDefinition, WalkthroughId, WalkthroughInfo,
    WalkthroughSession,
};

use super::{
    DeliveredStep, GapDraft, GapReceipt, ProtocolError, SessionStatus, StartSummary,
};

/// Owns the single session of an audit run and serializes every protocol operation on it.
///
/// Lock hold time is bounded: no operation performs I/O while holding the lock, logging
/// included.
#[derive(Debug, Default)]
pub struct StepDeliveryServer {
    session: Mutex<Option<WalkthroughSession>>,
    target: AuditTarget,
}

impl StepDeliveryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library the session started by this server is audited against.
    pub fn with_target(mut self, target: AuditTarget) -> Self {
        self.target = target;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Option<WalkthroughSession>> {
        // Operations never leave a half-applied session behind, so a poisoned lock still guards
        // consistent state.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<T>(
        &self,
        op: impl FnOnce(&mut WalkthroughSession) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        let mut guard = self.lock();
        let session = guard.as_mut().ok_or(ProtocolError::NotStarted)?;
        op(session)
    }

    /// Validates raw definition parts and starts a session from them.
    pub fn start_from_parts(
        &self,
        walkthrough_id: WalkthroughId,
        info: WalkthroughInfo,
        steps: Vec<Step>,
    ) -> Result<StartSummary, ProtocolError> {
        let definition = WalkthroughDefinition::new(walkthrough_id, info, steps)?;
        self.start(Arc::new(definition))
    }

    pub fn start(
        &self,
        definition: Arc<WalkthroughDefinition>,
    ) -> Result<StartSummary, ProtocolError> {
        let mut guard = self.lock();
        if let Some(active) = guard.as_ref() {
            return Err(ProtocolError::SessionActive {
                walkthrough_id: active.walkthrough_id().to_string(),
                cursor: active.cursor(),
                total_steps: active.total_steps(),
            });
        }

        let info = definition.info();
        let summary = StartSummary {
            walkthrough_id: definition.walkthrough_id().clone(),
            title: info.title.clone(),
            description: info.description.clone(),
            total_steps: definition.total_steps(),
            estimated_duration_minutes: info.estimated_duration_minutes,
        };
        *guard = Some(
            WalkthroughSession::new(definition, Utc::now()).with_target(self.target.clone()),
        );
        drop(guard);

        tracing::info!(
            walkthrough_id = %summary.walkthrough_id,
            total_steps = summary.total_steps,
            "walkthrough session started"
        );
        Ok(summary)
    }

    pub fn fetch_next(&self) -> Result<DeliveredStep, ProtocolError> {
        let (walkthrough_id, step) = self.with_session(|session| {
            let step = super::fetch_next(session, Utc::now())?;
            Ok((session.walkthrough_id().clone(), step))
        })?;

        tracing::info!(
            walkthrough_id = %walkthrough_id,
            step = step.step_number,
            total_steps = step.total_steps,
            title = %step.title,
            "delivered step"
        );
        if step.is_last {
            tracing::info!(walkthrough_id = %walkthrough_id, "walkthrough complete");
        }
        Ok(step)
    }

    pub fn status(&self) -> SessionStatus {
        super::status(self.lock().as_ref())
    }

    pub fn report_gap(&self, draft: GapDraft) -> Result<GapReceipt, ProtocolError> {
        let (walkthrough_id, receipt) = self.with_session(|session| {
            let receipt = super::report_gap(session, draft, Utc::now())?;
            Ok((session.walkthrough_id().clone(), receipt))
        })?;

        tracing::info!(
            walkthrough_id = %walkthrough_id,
            step = receipt.step_number,
            gap_type = %receipt.gap_type,
            severity = %receipt.severity,
            "gap reported"
        );
        Ok(receipt)
    }

    /// Aborts the session and returns its frozen state.
    pub fn abort(&self, reason: Option<String>) -> Result<SessionSnapshot, ProtocolError> {
        let snapshot = self.with_session(|session| {
            super::abort(session, reason, Utc::now())?;
            Ok(session.snapshot())
        })?;

        tracing::warn!(
            walkthrough_id = %snapshot.walkthrough_id,
            cursor = snapshot.cursor,
            reason = snapshot.abort_reason.as_deref().unwrap_or_default(),
            "walkthrough session aborted"
        );
        Ok(snapshot)
    }

    /// Renders the audit result for the current session state. Never mutates.
    pub fn render_result(&self, policy: AuditPolicy) -> Result<AuditResult, ProtocolError> {
        self.with_session(|session| Ok(render_result(session, policy)))
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.lock().as_ref().map(WalkthroughSession::snapshot)
    }

    pub fn has_session(&self) -> bool {
        self.lock().is_some()
    }
}
