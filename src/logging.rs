// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagnostic tracing.
//!
//! Output always goes to stderr: stdout carries the MCP stdio transport. Audit artifacts are
//! written by [`crate::store`] and are unaffected by the filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "WALKAUDIT_LOG";

const DEFAULT_DIRECTIVES: &str = "warn";

/// Builds the filter from `WALKAUDIT_LOG`, then `RUST_LOG`, then `warn`.
///
/// Invalid directives fall back to the default instead of failing startup.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Installs the global subscriber. Calling it twice is a no-op.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
