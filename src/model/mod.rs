// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A walkthrough definition is immutable once validated; a session layers a delivery cursor
//! and an append-only gap log on top of it.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod gap;
pub mod ids;
pub mod session;
pub mod walkthrough;

pub use gap::{
    CategoryCounts, GapReport, GapType, ParseGapTypeError, ParseSeverityError, Severity,
    SeverityCounts,
};
pub use ids::{Id, IdError, WalkthroughId};
pub use session::{AuditTarget, SessionSnapshot, SessionState, WalkthroughSession};
pub use walkthrough::{
    SchemaError, SchemaViolation, Step, StepContent, WalkthroughDefinition, WalkthroughInfo,
};
