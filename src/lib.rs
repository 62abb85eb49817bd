// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Walkaudit: step-gated walkthrough delivery and documentation gap auditing over MCP.
//!
//! An executing agent pulls a walkthrough one step at a time, reports gaps against steps it has
//! already seen, and the run ends in an [`audit::AuditResult`].

pub mod audit;
pub mod config;
pub mod logging;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod store;
