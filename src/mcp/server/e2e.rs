// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistent runs: tool calls against a server writing into a real output folder.

use super::*;

use crate::model::{AuditTarget, SessionSnapshot};
use crate::store::WriteDurability;
use tempfile::TempDir;

const EXPORT: &str = r#"{
  "version": "1.0",
  "walkthrough": {
    "title": "Database quickstart",
    "description": "Install, connect, query",
    "estimatedDurationMinutes": 12
  },
  "steps": [
    { "title": "Install", "displayOrder": 1,
      "contentFields": { "contentForUser": "Install the client.", "operationsForAgent": "pkg install db" } },
    { "title": "Connect", "displayOrder": 2,
      "contentFields": { "contentForUser": "Connect.", "operationsForAgent": "db connect" } },
    { "title": "Query", "displayOrder": 3,
      "contentFields": { "contentForUser": "Query.", "operationsForAgent": "db query 'select 1'" } }
  ]
}"#;

struct AuditHarness {
    _tmp: TempDir,
    definition_path: PathBuf,
    out_dir: PathBuf,
}

impl AuditHarness {
    fn new() -> Self {
        let tmp = tempfile::Builder::new().prefix("walkaudit-e2e").tempdir().expect("temp dir");
        let definition_path = tmp.path().join("db_quickstart.json");
        std::fs::write(&definition_path, EXPORT).expect("write definition");
        let out_dir = tmp.path().join("out");
        Self { _tmp: tmp, definition_path, out_dir }
    }

    fn server(&self, config: ServeConfig) -> WalkauditMcp {
        WalkauditMcp::new(&config)
    }

    fn persistent(&self) -> WalkauditMcp {
        self.server(ServeConfig::persistent(&self.out_dir))
    }

    fn start_params(&self) -> Parameters<WalkthroughStartParams> {
        Parameters(WalkthroughStartParams {
            walkthrough_path: Some(self.definition_path.display().to_string()),
            ..WalkthroughStartParams::default()
        })
    }

    fn snapshot(&self) -> SessionSnapshot {
        AuditFolder::load_snapshot(&self.out_dir.join("db_quickstart_session.json"))
            .expect("snapshot on disk")
    }

    fn audit_path(&self) -> PathBuf {
        self.out_dir.join("db_quickstart_audit.json")
    }

    fn audit_json(&self) -> serde_json::Value {
        let raw = std::fs::read_to_string(self.audit_path()).expect("audit on disk");
        serde_json::from_str(&raw).expect("audit json")
    }
}

fn gap(step_number: u64, gap_type: &str, severity: &str) -> Parameters<ReportGapParams> {
    Parameters(ReportGapParams {
        step_number: Some(step_number),
        gap_type: gap_type.to_owned(),
        severity: severity.to_owned(),
        description: "missing detail".to_owned(),
        suggested_fix: Some("add it".to_owned()),
        context: None,
    })
}

#[tokio::test]
async fn full_run_persists_snapshots_and_final_audit() {
    let harness = AuditHarness::new();
    let server = harness.persistent();

    let Json(started) = server.walkthrough_start(harness.start_params()).await.expect("start");
    assert_eq!(started.walkthrough_id, "db_quickstart");
    assert_eq!(harness.snapshot().cursor, 0);
    assert!(!harness.audit_path().exists());

    server.walkthrough_next_step().await.expect("install");
    server.walkthrough_next_step().await.expect("connect");
    server.walkthrough_report_gap(gap(2, "prerequisite", "critical")).await.expect("gap");

    let snapshot = harness.snapshot();
    assert_eq!(snapshot.cursor, 2);
    assert_eq!(snapshot.gaps.len(), 1);
    assert_eq!(snapshot.rev, 3);
    assert!(!harness.audit_path().exists());

    let Json(last) = server.walkthrough_next_step().await.expect("query");
    assert!(last.is_last);
    assert_eq!(last.content.operations_for_agent, "db query 'select 1'");

    let audit = harness.audit_json();
    assert_eq!(audit["walkthrough_id"], "db_quickstart");
    assert_eq!(audit["completed_steps"], 3);
    assert_eq!(audit["total_steps"], 3);
    assert_eq!(audit["success"], true);
    assert_eq!(audit["severity_counts"]["critical"], 1);
    assert_eq!(audit["gaps"][0]["suggested_fix"], "add it");
    assert_eq!(harness.snapshot().state, SessionState::Complete);
}

#[tokio::test]
async fn abort_writes_partial_audit() {
    let harness = AuditHarness::new();
    let server = harness.persistent();

    server.walkthrough_start(harness.start_params()).await.expect("start");
    server.walkthrough_next_step().await.expect("install");

    let Json(aborted) =
        server.walkthrough_abort(Parameters(AbortParams::default())).await.expect("abort");
    assert_eq!(aborted.reason, "aborted by orchestrator");
    assert_eq!(aborted.audit_path, Some(harness.audit_path().display().to_string()));

    let audit = harness.audit_json();
    assert_eq!(audit["state"], "aborted");
    assert_eq!(audit["abort_reason"], "aborted by orchestrator");
    assert_eq!(audit["completed_steps"], 1);
    assert_eq!(audit["success"], false);
}

#[tokio::test]
async fn finalize_persists_in_progress_session() {
    let harness = AuditHarness::new();
    let server = harness.persistent();

    assert_eq!(server.finalize(), None);

    server.walkthrough_start(harness.start_params()).await.expect("start");
    server.walkthrough_next_step().await.expect("install");

    let path = server.finalize().expect("audit written");
    assert_eq!(path, harness.audit_path());
    let audit = harness.audit_json();
    assert_eq!(audit["state"], "in_progress");
    assert_eq!(audit["completed_steps"], 1);
    assert_eq!(audit["progress_percentage"], 33.33);
}

#[tokio::test]
async fn snapshots_can_be_disabled_and_policy_comes_from_config() {
    let harness = AuditHarness::new();
    let server = harness.server(
        ServeConfig::persistent(&harness.out_dir)
            .with_snapshots(false)
            .with_durability(WriteDurability::Durable)
            .with_policy(AuditPolicy { fail_on_critical: true }),
    );

    server.walkthrough_start(harness.start_params()).await.expect("start");
    for _ in 0..2 {
        server.walkthrough_next_step().await.expect("step");
    }
    server.walkthrough_report_gap(gap(1, "clarity", "critical")).await.expect("gap");
    server.walkthrough_next_step().await.expect("last");

    assert!(!harness.out_dir.join("db_quickstart_session.json").exists());
    let audit = harness.audit_json();
    assert_eq!(audit["success"], false);
    assert_eq!(audit["policy"]["fail_on_critical"], true);
}

#[tokio::test]
async fn audit_result_write_returns_path() {
    let harness = AuditHarness::new();
    let server = harness.persistent();

    server.walkthrough_start(harness.start_params()).await.expect("start");
    let Json(response) = server
        .audit_result(Parameters(AuditResultParams { fail_on_critical: None, write: Some(true) }))
        .await
        .expect("result");

    assert_eq!(response.written_path, Some(harness.audit_path().display().to_string()));
    assert_eq!(harness.audit_json()["completed_steps"], 0);
}

#[tokio::test]
async fn id_override_names_persisted_files() {
    let harness = AuditHarness::new();
    let server = harness.persistent();

    server
        .walkthrough_start(Parameters(WalkthroughStartParams {
            walkthrough_path: Some(harness.definition_path.display().to_string()),
            walkthrough: None,
            walkthrough_id: Some("run:42".to_owned()),
        }))
        .await
        .expect("start");

    let folder = server.audit_folder().expect("folder");
    let snapshot_path = folder.session_snapshot_path("run:42");
    assert_eq!(snapshot_path, harness.out_dir.join("~72756e3a3432_session.json"));
    let snapshot = AuditFolder::load_snapshot(&snapshot_path).expect("snapshot");
    assert_eq!(snapshot.walkthrough_id, "run:42");
}

#[tokio::test]
async fn gap_on_final_step_refreshes_written_audit() {
    let harness = AuditHarness::new();
    let server = harness.persistent();

    server.walkthrough_start(harness.start_params()).await.expect("start");
    for _ in 0..3 {
        server.walkthrough_next_step().await.expect("step");
    }
    assert_eq!(harness.audit_json()["gap_count"], 0);

    server.walkthrough_report_gap(gap(3, "execution", "critical")).await.expect("gap");

    let snapshot = harness.snapshot();
    let audit = harness.audit_json();
    assert_eq!(snapshot.gaps.len(), 1);
    assert_eq!(audit["gap_count"], 1);
    assert_eq!(audit["severity_counts"]["critical"], 1);
    assert_eq!(audit["gaps"][0]["step_title"], "Query");
    assert_eq!(audit["last_updated"], serde_json::to_value(snapshot.last_updated).expect("ts"));
}

#[tokio::test]
async fn gap_mid_run_leaves_audit_unwritten() {
    let harness = AuditHarness::new();
    let server = harness.persistent();

    server.walkthrough_start(harness.start_params()).await.expect("start");
    server.walkthrough_next_step().await.expect("install");
    server.walkthrough_report_gap(gap(1, "clarity", "info")).await.expect("gap");

    assert_eq!(harness.snapshot().gaps.len(), 1);
    assert!(!harness.audit_path().exists());
}

#[tokio::test]
async fn audit_records_library_target_and_duration() {
    let harness = AuditHarness::new();
    let server = harness.server(ServeConfig::persistent(&harness.out_dir).with_target(
        AuditTarget::new(Some("lancedb".to_owned()), Some("0.22.0".to_owned())),
    ));

    server.walkthrough_start(harness.start_params()).await.expect("start");
    for _ in 0..3 {
        server.walkthrough_next_step().await.expect("step");
    }

    let audit = harness.audit_json();
    assert_eq!(audit["library_name"], "lancedb");
    assert_eq!(audit["library_version"], "0.22.0");
    assert_eq!(audit["completed_at"], audit["last_updated"]);
    assert!(audit["duration_seconds"].as_f64().is_some_and(|secs| secs >= 0.0));
    assert_eq!(harness.snapshot().library_version.as_deref(), Some("0.22.0"));
}
