// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::ids::WalkthroughId;
use super::walkthrough::{Step, StepContent, WalkthroughDefinition, WalkthroughInfo};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).single().expect("fixed timestamp")
}

pub(crate) fn content(slug: &str) -> StepContent {
    StepContent {
        content_for_user: format!("## {slug}\n\nFollow along."),
        context_for_agent: format!("{slug}: background"),
        operations_for_agent: format!("run {slug}"),
        introduction_for_agent: format!("why {slug} matters"),
    }
}

/// Three-step quickstart: `Install`, `Connect`, `Query` (display orders 0..=2).
pub(crate) fn install_connect_query() -> Arc<WalkthroughDefinition> {
    let info = WalkthroughInfo {
        title: "Database quickstart".to_owned(),
        description: "Install the client, connect, run a first query".to_owned(),
        estimated_duration_minutes: 10,
        tags: ["database".to_owned(), "quickstart".to_owned()].into_iter().collect(),
        ..WalkthroughInfo::default()
    };
    let steps = ["Install", "Connect", "Query"]
        .iter()
        .enumerate()
        .map(|(idx, title)| {
            let next = (idx < 2).then_some(idx as i64 + 1);
            Step::new(*title, idx as i64, content(&title.to_lowercase()))
                .with_next_step_reference(next)
        })
        .collect();

    Arc::new(
        WalkthroughDefinition::new(
            WalkthroughId::new("wt_quickstart").expect("walkthrough id"),
            info,
            steps,
        )
        .expect("valid fixture definition"),
    )
}
