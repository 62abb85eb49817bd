// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Walkaudit-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Walkaudit and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use thiserror::Error;

use super::ids::WalkthroughId;

/// A tutorial decomposed into ordered steps, as handed over by the walkthrough producer.
///
/// Definitions are validated once in [`WalkthroughDefinition::new`] and never mutate afterwards;
/// sessions share them read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkthroughDefinition {
    walkthrough_id: WalkthroughId,
    info: WalkthroughInfo,
    steps: Vec<Step>,
}

/// Descriptive metadata of a walkthrough (everything except the steps).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkthroughInfo {
    pub title: String,
    pub description: String,
    pub kind: String,
    pub status: String,
    pub estimated_duration_minutes: u32,
    pub tags: BTreeSet<String>,
}

impl Default for WalkthroughInfo {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            kind: "quickstart".to_owned(),
            status: "published".to_owned(),
            estimated_duration_minutes: 0,
            tags: BTreeSet::new(),
        }
    }
}

impl WalkthroughDefinition {
    /// Validates and freezes a definition.
    ///
    /// Steps are ordered by `display_order`. The orders must form a contiguous run starting at
    /// 0 or 1; every gap or duplicate is reported, not just the first one.
    pub fn new(
        walkthrough_id: WalkthroughId,
        info: WalkthroughInfo,
        mut steps: Vec<Step>,
    ) -> Result<Self, SchemaError> {
        steps.sort_by_key(Step::display_order);
        let violations = check_step_order(&steps);
        if !violations.is_empty() {
            return Err(SchemaError::new(violations));
        }

        Ok(Self { walkthrough_id, info, steps })
    }

    pub fn walkthrough_id(&self) -> &WalkthroughId {
        &self.walkthrough_id
    }

    pub fn info(&self) -> &WalkthroughInfo {
        &self.info
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// `display_order` of the first step (0 or 1).
    pub fn display_base(&self) -> i64 {
        self.steps.first().map(Step::display_order).unwrap_or_default()
    }
}

fn check_step_order(steps: &[Step]) -> Vec<SchemaViolation> {
    let Some(first) = steps.first() else {
        return vec![SchemaViolation::NoSteps];
    };

    let mut violations = Vec::new();
    if !matches!(first.display_order(), 0 | 1) {
        violations.push(SchemaViolation::InvalidBase { found: first.display_order() });
    }

    for pair in steps.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.display_order() == prev.display_order() {
            violations.push(SchemaViolation::DuplicateDisplayOrder {
                display_order: next.display_order(),
                first_title: prev.title().to_owned(),
                second_title: next.title().to_owned(),
            });
        } else if next.display_order() != prev.display_order() + 1 {
            violations.push(SchemaViolation::DisplayOrderGap {
                after: prev.display_order(),
                next: next.display_order(),
            });
        }
    }

    violations
}

/// One unit of a walkthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    title: String,
    display_order: i64,
    content: StepContent,
    next_step_reference: Option<i64>,
}

impl Step {
    pub fn new(title: impl Into<String>, display_order: i64, content: StepContent) -> Self {
        Self { title: title.into(), display_order, content, next_step_reference: None }
    }

    pub fn with_next_step_reference(mut self, next_step_reference: Option<i64>) -> Self {
        self.next_step_reference = next_step_reference;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn display_order(&self) -> i64 {
        self.display_order
    }

    pub fn content(&self) -> &StepContent {
        &self.content
    }

    pub fn next_step_reference(&self) -> Option<i64> {
        self.next_step_reference
    }
}

/// The four audience-specific text blobs of a step. Delivered verbatim, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContent {
    /// Human-readable instructions (markdown).
    pub content_for_user: String,
    /// Background knowledge for the executing agent.
    pub context_for_agent: String,
    /// Literal operations/commands to perform.
    pub operations_for_agent: String,
    /// Purpose and goals of the step.
    pub introduction_for_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("walkthrough has no steps")]
    NoSteps,
    #[error("displayOrder must start at 0 or 1, found {found}")]
    InvalidBase { found: i64 },
    #[error("displayOrder {display_order} is used by both {first_title:?} and {second_title:?}")]
    DuplicateDisplayOrder { display_order: i64, first_title: String, second_title: String },
    #[error("displayOrder jumps from {after} to {next}")]
    DisplayOrderGap { after: i64, next: i64 },
    #[error("{message}")]
    Malformed { message: String },
}

/// A definition rejected before any session could be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid walkthrough definition: {}", join_violations(.violations))]
pub struct SchemaError {
    violations: Vec<SchemaViolation>,
}

impl SchemaError {
    pub fn new(violations: Vec<SchemaViolation>) -> Self {
        Self { violations }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(vec![SchemaViolation::Malformed { message: message.into() }])
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
