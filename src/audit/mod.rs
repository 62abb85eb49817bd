// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Audit aggregation.
//!
//! An [`AuditResult`] is a pure projection of session state: rendering the same state twice
//! yields equal results, mid-session or after completion.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{
    AuditTarget, CategoryCounts, GapReport, SessionSnapshot, SessionState, SeverityCounts,
    WalkthroughSession,
};

/// Verdict policy applied when rendering a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuditPolicy {
    /// Treat any critical gap as a failed audit, even when every step was delivered.
    #[serde(default)]
    pub fail_on_critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AuditResult {
    pub walkthrough_id: String,
    pub walkthrough_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_version: Option<String>,
    pub state: SessionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub total_steps: usize,
    pub completed_steps: usize,
    pub progress_percentage: f64,
    /// All steps delivered (and, under `fail_on_critical`, no critical gaps).
    pub success: bool,
    pub has_critical_gaps: bool,
    pub policy: AuditPolicy,
    pub gap_count: usize,
    pub severity_counts: SeverityCounts,
    pub category_counts: CategoryCounts,
    pub gaps: Vec<GapReport>,
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Time of the last recorded event once the run is complete or aborted.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// `completed_at - started_at`, rounded to two decimals.
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl AuditResult {
    pub fn critical_count(&self) -> u64 {
        self.severity_counts.critical
    }
}

struct ResultParts<'a> {
    walkthrough_id: String,
    walkthrough_title: String,
    target: AuditTarget,
    state: SessionState,
    abort_reason: Option<String>,
    total_steps: usize,
    completed_steps: usize,
    gaps: &'a [GapReport],
    started_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

fn assemble(parts: ResultParts<'_>, policy: AuditPolicy) -> AuditResult {
    let severity_counts = SeverityCounts::tally(parts.gaps);
    let category_counts = CategoryCounts::tally(parts.gaps);
    let has_critical_gaps = severity_counts.critical > 0;
    let delivered_all = parts.completed_steps == parts.total_steps;
    let settled = matches!(parts.state, SessionState::Complete | SessionState::Aborted);
    let completed_at = settled.then_some(parts.last_updated);
    let duration_seconds = completed_at.map(|end| {
        let millis = (end - parts.started_at).num_milliseconds().max(0);
        (millis as f64 / 10.0).round() / 100.0
    });

    AuditResult {
        progress_percentage: crate::model::session::progress_percentage(
            parts.completed_steps,
            parts.total_steps,
        ),
        success: delivered_all && !(policy.fail_on_critical && has_critical_gaps),
        has_critical_gaps,
        policy,
        gap_count: parts.gaps.len(),
        severity_counts,
        category_counts,
        gaps: parts.gaps.to_vec(),
        walkthrough_id: parts.walkthrough_id,
        walkthrough_title: parts.walkthrough_title,
        library_name: parts.target.library_name,
        library_version: parts.target.library_version,
        state: parts.state,
        abort_reason: parts.abort_reason,
        total_steps: parts.total_steps,
        completed_steps: parts.completed_steps,
        started_at: parts.started_at,
        last_updated: parts.last_updated,
        completed_at,
        duration_seconds,
    }
}

/// Renders the audit result of a live session.
pub fn render_result(session: &WalkthroughSession, policy: AuditPolicy) -> AuditResult {
    assemble(
        ResultParts {
            walkthrough_id: session.walkthrough_id().to_string(),
            walkthrough_title: session.definition().title().to_owned(),
            target: session.target().clone(),
            state: session.state(),
            abort_reason: session.abort_reason().map(ToOwned::to_owned),
            total_steps: session.total_steps(),
            completed_steps: session.cursor(),
            gaps: session.gaps(),
            started_at: session.started_at(),
            last_updated: session.last_updated(),
        },
        policy,
    )
}

/// Renders the audit result of a persisted snapshot (e.g. after the server process exited).
pub fn render_snapshot(snapshot: &SessionSnapshot, policy: AuditPolicy) -> AuditResult {
    assemble(
        ResultParts {
            walkthrough_id: snapshot.walkthrough_id.clone(),
            walkthrough_title: snapshot.title.clone(),
            target: AuditTarget::new(
                snapshot.library_name.clone(),
                snapshot.library_version.clone(),
            ),
            state: snapshot.state,
            abort_reason: snapshot.abort_reason.clone(),
            total_steps: snapshot.total_steps,
            completed_steps: snapshot.cursor.min(snapshot.total_steps),
            gaps: &snapshot.gaps,
            started_at: snapshot.started_at,
            last_updated: snapshot.last_updated,
        },
        policy,
    )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use chrono::Duration;

    use super::{render_result, render_snapshot, AuditPolicy};
    use crate::model::{
        fixtures, AuditTarget, GapType, Severity, SessionState, WalkthroughSession,
    };
    use crate::ops::{abort, fetch_next, report_gap, GapDraft};

    fn draft(step_number: usize, gap_type: &str, severity: &str) -> GapDraft {
        GapDraft {
            step_number: Some(step_number),
            gap_type: gap_type.to_owned(),
            severity: severity.to_owned(),
            description: "something is off".to_owned(),
            ..GapDraft::default()
        }
    }

    fn walked_session(steps: usize) -> WalkthroughSession {
        let mut session = WalkthroughSession::new(fixtures::install_connect_query(), fixtures::t0());
        for _ in 0..steps {
            fetch_next(&mut session, fixtures::t0()).expect("fetch");
        }
        session
    }

    #[test]
    fn counts_gaps_by_severity_and_category() {
        let mut session = walked_session(3);
        for (step, gap_type, severity) in [
            (1, "prerequisite", "critical"),
            (2, "logical_flow", "critical"),
            (2, "clarity", "warning"),
            (3, "execution_error", "info"),
        ] {
            report_gap(&mut session, draft(step, gap_type, severity), fixtures::t0())
                .expect("report");
        }

        let result = render_result(&session, AuditPolicy::default());
        assert_eq!(result.gap_count, 4);
        assert_eq!(result.severity_counts.critical, 2);
        assert_eq!(result.severity_counts.warning, 1);
        assert_eq!(result.severity_counts.info, 1);
        assert_eq!(result.category_counts.prerequisite, 1);
        assert_eq!(result.category_counts.logical_flow, 1);
        assert_eq!(result.category_counts.clarity, 1);
        assert_eq!(result.category_counts.execution, 1);
        assert_eq!(result.category_counts.total(), 4);
        assert_eq!(result.gaps[3].gap_type, GapType::Execution);
        assert_eq!(result.gaps[0].severity, Severity::Critical);
    }

    #[rstest]
    #[case::lenient_policy(false, true)]
    #[case::strict_policy(true, false)]
    fn critical_gaps_only_fail_under_strict_policy(
        #[case] fail_on_critical: bool,
        #[case] expected_success: bool,
    ) {
        let mut session = walked_session(3);
        report_gap(&mut session, draft(2, "logical_flow", "critical"), fixtures::t0())
            .expect("report");

        let result = render_result(&session, AuditPolicy { fail_on_critical });
        assert!(result.has_critical_gaps);
        assert_eq!(result.success, expected_success);
        assert_eq!(result.policy.fail_on_critical, fail_on_critical);
    }

    #[test]
    fn in_progress_session_is_not_successful() {
        let session = walked_session(2);
        let result = render_result(&session, AuditPolicy::default());
        assert_eq!(result.state, SessionState::InProgress);
        assert_eq!(result.completed_steps, 2);
        assert_eq!(result.progress_percentage, 66.67);
        assert!(!result.success);
        assert!(!result.has_critical_gaps);
    }

    #[test]
    fn aborted_session_renders_partial_result() {
        let mut session = walked_session(1);
        report_gap(&mut session, draft(1, "prerequisite", "warning"), fixtures::t0())
            .expect("report");
        abort(&mut session, Some("worker stalled".to_owned()), fixtures::t0()).expect("abort");

        let result = render_result(&session, AuditPolicy::default());
        assert_eq!(result.state, SessionState::Aborted);
        assert_eq!(result.abort_reason.as_deref(), Some("worker stalled"));
        assert_eq!(result.completed_steps, 1);
        assert_eq!(result.gap_count, 1);
        assert!(!result.success);
    }

    #[test]
    fn rendering_is_repeatable_and_matches_snapshot_rendering() {
        let mut session = walked_session(3);
        report_gap(&mut session, draft(3, "completeness", "info"), fixtures::t0())
            .expect("report");

        let first = render_result(&session, AuditPolicy::default());
        let second = render_result(&session, AuditPolicy::default());
        assert_eq!(first, second);
        assert_eq!(render_snapshot(&session.snapshot(), AuditPolicy::default()), first);
    }

    #[test]
    fn in_progress_result_has_no_completion_time() {
        let result = render_result(&walked_session(1), AuditPolicy::default());
        assert_eq!(result.completed_at, None);
        assert_eq!(result.duration_seconds, None);
    }

    #[test]
    fn completed_result_derives_duration_from_session_timestamps() {
        let start = fixtures::t0();
        let mut session = WalkthroughSession::new(fixtures::install_connect_query(), start)
            .with_target(AuditTarget::new(Some("lancedb".to_owned()), Some("0.22.0".to_owned())));
        for secs in [30, 60] {
            fetch_next(&mut session, start + Duration::seconds(secs)).expect("fetch");
        }
        fetch_next(&mut session, start + Duration::milliseconds(95_456)).expect("last");

        let result = render_result(&session, AuditPolicy::default());
        assert_eq!(result.completed_at, Some(start + Duration::milliseconds(95_456)));
        assert_eq!(result.duration_seconds, Some(95.46));
        assert_eq!(result.library_name.as_deref(), Some("lancedb"));
        assert_eq!(result.library_version.as_deref(), Some("0.22.0"));
        assert_eq!(render_snapshot(&session.snapshot(), AuditPolicy::default()), result);
    }

    #[test]
    fn aborted_result_is_timed_up_to_the_abort() {
        let start = fixtures::t0();
        let mut session = WalkthroughSession::new(fixtures::install_connect_query(), start);
        fetch_next(&mut session, start + Duration::seconds(5)).expect("fetch");
        abort(&mut session, None, start + Duration::seconds(12)).expect("abort");

        let result = render_result(&session, AuditPolicy::default());
        assert_eq!(result.completed_at, Some(start + Duration::seconds(12)));
        assert_eq!(result.duration_seconds, Some(12.0));
        assert_eq!(result.library_name, None);
    }
}
