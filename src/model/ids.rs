// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use thiserror::Error;

/// A stable identifier used across the model, the MCP surface and the audit store.
///
/// Ids are free-form but must be a non-empty *path segment* (no `/`), because they name the
/// persisted `<id>_session.json` / `<id>_audit.json` files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id_segment(&value)?;
        Ok(Self { value, _marker: PhantomData })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<T> TryFrom<String> for Id<T> {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("id must not be empty")]
    Empty,
    #[error("id must not contain '/'")]
    ContainsSlash,
    #[error("id must not contain control characters")]
    ContainsControl,
}

fn validate_id_segment(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value.contains('/') {
        return Err(IdError::ContainsSlash);
    }
    if value.chars().any(char::is_control) {
        return Err(IdError::ContainsControl);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WalkthroughIdTag {}
pub type WalkthroughId = Id<WalkthroughIdTag>;

#[cfg(test)]
mod tests {
    use super::{IdError, WalkthroughId};

    #[test]
    fn id_rejects_empty() {
        assert_eq!(WalkthroughId::new(""), Err(IdError::Empty));
    }

    #[test]
    fn id_rejects_slash() {
        assert_eq!(WalkthroughId::new("runs/wt_1"), Err(IdError::ContainsSlash));
    }

    #[test]
    fn id_rejects_control_characters() {
        assert_eq!(WalkthroughId::new("wt\n1"), Err(IdError::ContainsControl));
    }

    #[test]
    fn id_parses_and_displays() {
        let id: WalkthroughId = "wt_3f9a".parse().expect("walkthrough id");
        assert_eq!(id.as_str(), "wt_3f9a");
        assert_eq!(id.to_string(), "wt_3f9a");
    }
}
