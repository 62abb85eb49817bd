// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence on disk.
//!
//! Reads walkthrough export documents and writes the audit folder: one session snapshot and one
//! audit result per walkthrough, side by side.

pub mod audit_folder;

pub use audit_folder::{
    definition_from_export, load_walkthrough_definition, parse_walkthrough_export, AuditFolder,
    StoreError, WalkthroughExport, WriteDurability,
};
