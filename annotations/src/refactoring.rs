// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::service::{GroupService, TagService};
use log::info;
use std::sync::Arc;

/// What a refactoring callback changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefactoringOutcome {
    pub tags_updated: bool,
    pub groups_updated: bool,
}

impl RefactoringOutcome {
    pub fn changed(&self) -> bool {
        self.tags_updated || self.groups_updated
    }
}

/// Keeps tag assignments and group memberships attached to objects that the
/// host renames or deletes. Persistence problems are logged by the services
/// and never surface here.
#[derive(Clone)]
pub struct RefactoringParticipant {
    tags: Arc<TagService>,
    groups: Arc<GroupService>,
}

impl RefactoringParticipant {
    pub fn new(tags: Arc<TagService>, groups: Arc<GroupService>) -> Self {
        Self { tags, groups }
    }

    pub fn object_renamed(&self, project: &str, old_fqn: &str, new_fqn: &str) -> RefactoringOutcome {
        let outcome = RefactoringOutcome {
            tags_updated: self.tags.rename_object(project, old_fqn, new_fqn),
            groups_updated: self.groups.rename_object(project, old_fqn, new_fqn),
        };
        if outcome.changed() {
            info!(
                "Annotations of '{}' moved to '{}' in project '{}'",
                old_fqn, new_fqn, project
            );
        }
        outcome
    }

    /// Rename where the host only reports the object's new short name.
    pub fn object_renamed_to(
        &self,
        project: &str,
        old_fqn: &str,
        new_name: &str,
    ) -> RefactoringOutcome {
        self.object_renamed(project, old_fqn, &renamed_fqn(old_fqn, new_name))
    }

    pub fn object_deleted(&self, project: &str, fqn: &str) -> RefactoringOutcome {
        let outcome = RefactoringOutcome {
            tags_updated: self.tags.remove_object(project, fqn),
            groups_updated: self.groups.remove_object(project, fqn),
        };
        if outcome.changed() {
            info!(
                "Annotations of deleted '{}' removed in project '{}'",
                fqn, project
            );
        }
        outcome
    }
}

/// Replace the last dot-separated segment of `old_fqn` with `new_name`.
pub fn renamed_fqn(old_fqn: &str, new_name: &str) -> String {
    match old_fqn.rfind('.') {
        Some(index) => format!("{}.{}", &old_fqn[..index], new_name),
        None => new_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renamed_fqn() {
        assert_eq!(renamed_fqn("Catalog.Products", "Goods"), "Catalog.Goods");
        assert_eq!(
            renamed_fqn("Catalog.Products.Attribute.Price", "Cost"),
            "Catalog.Products.Attribute.Cost"
        );
        assert_eq!(renamed_fqn("Products", "Goods"), "Goods");
    }

    #[test]
    fn test_outcome_changed() {
        assert!(!RefactoringOutcome::default().changed());
        let outcome = RefactoringOutcome {
            tags_updated: false,
            groups_updated: true,
        };
        assert!(outcome.changed());
    }
}
