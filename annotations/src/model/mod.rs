// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod group;
pub mod tag;

pub use group::{
    Group, GroupHierarchy, is_valid_group_name, is_within, join_path, normalize_group_path,
};
pub use tag::{
    DEFAULT_TAG_COLOR, Tag, TagCatalog, TagUpdate, canonical_tag_color, is_valid_tag_name,
};

/// Storage whose effective mutations bump a revision counter.
pub trait Revisioned {
    fn revision(&self) -> u64;
}

impl Revisioned for TagCatalog {
    fn revision(&self) -> u64 {
        TagCatalog::revision(self)
    }
}

impl Revisioned for GroupHierarchy {
    fn revision(&self) -> u64 {
        GroupHierarchy::revision(self)
    }
}
