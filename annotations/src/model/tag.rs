// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Tag catalog and tag assignment index
//!
//! The catalog keeps tags in a user-defined order (the first ten positions
//! carry keyboard hotkeys) and an index from object FQN to the names of the
//! tags attached to it. Every mutation keeps these invariants:
//!
//! * tag names are unique and non-blank;
//! * every assigned name refers to a tag in the catalog;
//! * no object maps to an empty tag set.

use crate::util::color::normalize_hex_color;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

pub const DEFAULT_TAG_COLOR: &str = "#808080";

/// Number of tag positions that carry a hotkey (digits 1-9, then 0).
pub const HOTKEY_SLOTS: usize = 10;

/// A named, colored label. Equality and hashing use the name only.
#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
    pub color: String,
    pub description: String,
}

/// Upper-case `#RRGGBB` form of a tag color. Blank or unparsable input
/// becomes [`DEFAULT_TAG_COLOR`], the same as when a file is loaded.
pub fn canonical_tag_color(color: Option<&str>) -> String {
    color
        .and_then(normalize_hex_color)
        .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string())
}

impl Tag {
    pub fn new(name: &str, color: Option<&str>, description: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            color: canonical_tag_color(color),
            description: description.unwrap_or_default().to_string(),
        }
    }

    /// Field-by-field comparison, unlike `==` which looks at the name only.
    pub fn same_content(&self, other: &Tag) -> bool {
        self.name == other.name
            && self.color == other.color
            && self.description == other.description
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

pub fn is_valid_tag_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.chars().any(|c| c.is_control())
}

/// Partial update of a tag; `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

/// Map a catalog position to its hotkey digit.
pub fn hotkey_for_position(position: usize) -> Option<u8> {
    match position {
        0..=8 => Some(position as u8 + 1),
        9 => Some(0),
        _ => None,
    }
}

/// Map a hotkey digit back to its catalog position.
pub fn position_for_hotkey(digit: u8) -> Option<usize> {
    match digit {
        1..=9 => Some(digit as usize - 1),
        0 => Some(9),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: Vec<Tag>,
    assignments: BTreeMap<String, BTreeSet<String>>,
    revision: u64,
}

impl PartialEq for TagCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.tags.len() == other.tags.len()
            && self
                .tags
                .iter()
                .zip(&other.tags)
                .all(|(left, right)| left.same_content(right))
            && self.assignments == other.assignments
    }
}

impl TagCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from parts that already satisfy the invariants.
    pub(crate) fn from_parts(
        tags: Vec<Tag>,
        assignments: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        Self {
            tags,
            assignments,
            revision: 0,
        }
    }

    /// Counter bumped by every effective mutation; not persisted.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn assignments(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.assignments.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|tag| tag.name == name)
    }

    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    pub fn add_tag(&mut self, mut tag: Tag) -> bool {
        if !is_valid_tag_name(&tag.name) || self.position(&tag.name).is_some() {
            return false;
        }
        tag.color = canonical_tag_color(Some(&tag.color));
        self.tags.push(tag);
        self.touch();
        true
    }

    pub fn update_tag(&mut self, old_name: &str, update: TagUpdate) -> bool {
        let Some(index) = self.position(old_name) else {
            return false;
        };
        let rename_to = update.name.filter(|name| name != old_name);
        if let Some(new_name) = &rename_to
            && (!is_valid_tag_name(new_name) || self.position(new_name).is_some())
        {
            return false;
        }

        let mut changed = false;
        if let Some(new_name) = rename_to {
            for names in self.assignments.values_mut() {
                if names.remove(old_name) {
                    names.insert(new_name.clone());
                }
            }
            self.tags[index].name = new_name;
            changed = true;
        }
        if let Some(color) = update.color.map(|color| canonical_tag_color(Some(&color)))
            && self.tags[index].color != color
        {
            self.tags[index].color = color;
            changed = true;
        }
        if let Some(description) = update.description
            && self.tags[index].description != description
        {
            self.tags[index].description = description;
            changed = true;
        }
        if changed {
            self.touch();
        }
        true
    }

    pub fn remove_tag(&mut self, name: &str) -> bool {
        let Some(index) = self.position(name) else {
            return false;
        };
        self.tags.remove(index);
        self.assignments.retain(|_, names| {
            names.remove(name);
            !names.is_empty()
        });
        self.touch();
        true
    }

    pub fn assign_tag(&mut self, fqn: &str, tag_name: &str) -> bool {
        if fqn.trim().is_empty() || self.position(tag_name).is_none() {
            return false;
        }
        let inserted = self
            .assignments
            .entry(fqn.to_string())
            .or_default()
            .insert(tag_name.to_string());
        if inserted {
            self.touch();
        }
        inserted
    }

    pub fn unassign_tag(&mut self, fqn: &str, tag_name: &str) -> bool {
        let Some(names) = self.assignments.get_mut(fqn) else {
            return false;
        };
        if !names.remove(tag_name) {
            return false;
        }
        if names.is_empty() {
            self.assignments.remove(fqn);
        }
        self.touch();
        true
    }

    pub fn is_assigned(&self, fqn: &str, tag_name: &str) -> bool {
        self.assignments
            .get(fqn)
            .is_some_and(|names| names.contains(tag_name))
    }

    /// Tags of an object in catalog order.
    pub fn object_tags(&self, fqn: &str) -> Vec<&Tag> {
        let Some(names) = self.assignments.get(fqn) else {
            return Vec::new();
        };
        self.tags
            .iter()
            .filter(|tag| names.contains(&tag.name))
            .collect()
    }

    pub fn objects_by_tag(&self, tag_name: &str) -> BTreeSet<String> {
        self.assignments
            .iter()
            .filter(|(_, names)| names.contains(tag_name))
            .map(|(fqn, _)| fqn.clone())
            .collect()
    }

    pub fn object_count(&self, tag_name: &str) -> usize {
        self.assignments
            .values()
            .filter(|names| names.contains(tag_name))
            .count()
    }

    /// Objects carrying at least one of `tag_names`, each with its matching tags.
    pub fn find_objects_by_tags(&self, tag_names: &[String]) -> BTreeMap<String, Vec<&Tag>> {
        let wanted: BTreeSet<&str> = tag_names.iter().map(String::as_str).collect();
        let mut found = BTreeMap::new();
        for (fqn, names) in &self.assignments {
            let matching: Vec<&Tag> = self
                .tags
                .iter()
                .filter(|tag| wanted.contains(tag.name.as_str()) && names.contains(&tag.name))
                .collect();
            if !matching.is_empty() {
                found.insert(fqn.clone(), matching);
            }
        }
        found
    }

    pub fn move_tag_up(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) if index > 0 => {
                self.tags.swap(index, index - 1);
                self.touch();
                true
            }
            _ => false,
        }
    }

    pub fn move_tag_down(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) if index + 1 < self.tags.len() => {
                self.tags.swap(index, index + 1);
                self.touch();
                true
            }
            _ => false,
        }
    }

    pub fn hotkey_index(&self, name: &str) -> Option<u8> {
        self.position(name).and_then(hotkey_for_position)
    }

    pub fn tag_at_hotkey(&self, digit: u8) -> Option<&Tag> {
        position_for_hotkey(digit).and_then(|position| self.tags.get(position))
    }

    /// Move the tag set of `old_fqn` to `new_fqn`, merging with any tags the
    /// new FQN already carries.
    pub fn rename_object(&mut self, old_fqn: &str, new_fqn: &str) -> bool {
        if old_fqn == new_fqn || new_fqn.trim().is_empty() {
            return false;
        }
        let Some(names) = self.assignments.remove(old_fqn) else {
            return false;
        };
        self.assignments
            .entry(new_fqn.to_string())
            .or_default()
            .extend(names);
        self.touch();
        true
    }

    pub fn remove_object(&mut self, fqn: &str) -> bool {
        if self.assignments.remove(fqn).is_none() {
            return false;
        }
        self.touch();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(names: &[&str]) -> TagCatalog {
        let mut catalog = TagCatalog::new();
        for name in names {
            assert!(catalog.add_tag(Tag::new(name, None, None)));
        }
        catalog
    }

    fn assert_consistent(catalog: &TagCatalog) {
        for (fqn, names) in catalog.assignments() {
            assert!(!names.is_empty(), "empty entry for {}", fqn);
            for name in names {
                assert!(catalog.tag(name).is_some(), "dangling tag {}", name);
                assert!(catalog.objects_by_tag(name).contains(fqn));
            }
        }
    }

    #[test]
    fn test_new_tag_defaults() {
        let tag = Tag::new("bug", None, None);
        assert_eq!(tag.color, DEFAULT_TAG_COLOR);
        assert_eq!(tag.description, "");
        let tag = Tag::new("bug", Some("  "), Some("Defects"));
        assert_eq!(tag.color, DEFAULT_TAG_COLOR);
        assert_eq!(tag.description, "Defects");
    }

    #[test]
    fn test_tag_colors_are_canonical() {
        assert_eq!(Tag::new("bug", Some("#ff00aa"), None).color, "#FF00AA");
        assert_eq!(Tag::new("bug", Some("red"), None).color, DEFAULT_TAG_COLOR);
        assert_eq!(canonical_tag_color(Some(" #0a0b0c ")), "#0A0B0C");

        let mut catalog = TagCatalog::new();
        let raw = Tag {
            name: "raw".to_string(),
            color: "#abcdef".to_string(),
            description: String::new(),
        };
        assert!(catalog.add_tag(raw));
        assert_eq!(catalog.tag("raw").expect("raw").color, "#ABCDEF");

        let revision = catalog.revision();
        let same = TagUpdate {
            color: Some("#abcdef".to_string()),
            ..TagUpdate::default()
        };
        assert!(catalog.update_tag("raw", same));
        assert_eq!(catalog.revision(), revision);

        let invalid = TagUpdate {
            color: Some("blue".to_string()),
            ..TagUpdate::default()
        };
        assert!(catalog.update_tag("raw", invalid));
        assert_eq!(catalog.tag("raw").expect("raw").color, DEFAULT_TAG_COLOR);
    }

    #[test]
    fn test_tag_equality_uses_name_only() {
        let left = Tag::new("bug", Some("#FF0000"), None);
        let right = Tag::new("bug", Some("#00FF00"), Some("other"));
        assert_eq!(left, right);
        assert!(!left.same_content(&right));
    }

    #[test]
    fn test_add_tag_rejects_duplicates_and_blank_names() {
        let mut catalog = catalog_with(&["bug"]);
        assert!(!catalog.add_tag(Tag::new("bug", Some("#FF0000"), None)));
        assert!(!catalog.add_tag(Tag::new("  ", None, None)));
        assert_eq!(catalog.tags().len(), 1);
    }

    #[test]
    fn test_remove_tag_prunes_emptied_entries() {
        let mut catalog = catalog_with(&["bug"]);
        assert!(catalog.assign_tag("Catalog.A", "bug"));
        assert!(catalog.remove_tag("bug"));
        assert!(catalog.object_tags("Catalog.A").is_empty());
        assert!(!catalog.assignments().contains_key("Catalog.A"));
        assert!(!catalog.remove_tag("bug"));
    }

    #[test]
    fn test_remove_tag_keeps_other_assignments() {
        let mut catalog = catalog_with(&["bug", "todo"]);
        assert!(catalog.assign_tag("Catalog.A", "bug"));
        assert!(catalog.assign_tag("Catalog.A", "todo"));
        assert!(catalog.assign_tag("Catalog.B", "bug"));
        assert!(catalog.remove_tag("bug"));

        let names: Vec<&str> = catalog
            .object_tags("Catalog.A")
            .iter()
            .map(|tag| tag.name.as_str())
            .collect();
        assert_eq!(names, vec!["todo"]);
        assert!(!catalog.assignments().contains_key("Catalog.B"));
        assert_consistent(&catalog);
    }

    #[test]
    fn test_assign_requires_existing_tag_and_rejects_repeat() {
        let mut catalog = catalog_with(&["bug"]);
        assert!(!catalog.assign_tag("Catalog.A", "missing"));
        assert!(catalog.assign_tag("Catalog.A", "bug"));
        assert!(!catalog.assign_tag("Catalog.A", "bug"));
        assert!(!catalog.assign_tag("  ", "bug"));
        assert_consistent(&catalog);
    }

    #[test]
    fn test_unassign_prunes_entry() {
        let mut catalog = catalog_with(&["bug"]);
        assert!(!catalog.unassign_tag("Catalog.A", "bug"));
        assert!(catalog.assign_tag("Catalog.A", "bug"));
        assert!(catalog.unassign_tag("Catalog.A", "bug"));
        assert!(catalog.assignments().is_empty());
        assert!(!catalog.unassign_tag("Catalog.A", "bug"));
    }

    #[test]
    fn test_update_tag_rename_rewrites_assignments() {
        let mut catalog = catalog_with(&["bug", "todo"]);
        assert!(catalog.assign_tag("Catalog.A", "bug"));
        let update = TagUpdate {
            name: Some("defect".to_string()),
            color: Some("#FF0000".to_string()),
            description: None,
        };
        assert!(catalog.update_tag("bug", update));

        let tag = catalog.tag("defect").expect("renamed tag");
        assert_eq!(tag.color, "#FF0000");
        assert!(catalog.tag("bug").is_none());
        assert!(catalog.is_assigned("Catalog.A", "defect"));
        assert_eq!(catalog.position("defect"), Some(0));
        assert_consistent(&catalog);
    }

    #[test]
    fn test_update_tag_rejects_collision_and_missing() {
        let mut catalog = catalog_with(&["bug", "todo"]);
        let update = TagUpdate {
            name: Some("todo".to_string()),
            ..TagUpdate::default()
        };
        assert!(!catalog.update_tag("bug", update));
        assert!(!catalog.update_tag("missing", TagUpdate::default()));

        let same_name = TagUpdate {
            name: Some("bug".to_string()),
            description: Some("Defects".to_string()),
            ..TagUpdate::default()
        };
        assert!(catalog.update_tag("bug", same_name));
        assert_eq!(catalog.tag("bug").expect("tag").description, "Defects");
    }

    #[test]
    fn test_update_without_changes_keeps_revision() {
        let mut catalog = catalog_with(&["bug"]);
        let revision = catalog.revision();
        assert!(catalog.update_tag("bug", TagUpdate::default()));
        assert_eq!(catalog.revision(), revision);
    }

    #[test]
    fn test_move_tag_boundaries() {
        let mut catalog = catalog_with(&["a", "b", "c"]);
        assert!(!catalog.move_tag_up("a"));
        assert!(!catalog.move_tag_down("c"));
        assert!(!catalog.move_tag_up("missing"));
        assert!(catalog.move_tag_down("a"));
        let order: Vec<&str> = catalog.tags().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert!(catalog.move_tag_up("c"));
        let order: Vec<&str> = catalog.tags().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_hotkeys_follow_position() {
        let names: Vec<String> = (0..12).map(|i| format!("t{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut catalog = catalog_with(&refs);

        assert_eq!(catalog.hotkey_index("t0"), Some(1));
        assert_eq!(catalog.hotkey_index("t8"), Some(9));
        assert_eq!(catalog.hotkey_index("t9"), Some(0));
        assert_eq!(catalog.hotkey_index("t10"), None);
        assert_eq!(catalog.hotkey_index("missing"), None);

        assert_eq!(catalog.tag_at_hotkey(0).map(|t| t.name.as_str()), Some("t9"));
        assert_eq!(catalog.tag_at_hotkey(1).map(|t| t.name.as_str()), Some("t0"));
        assert!(catalog.tag_at_hotkey(10).is_none());

        assert!(catalog.move_tag_up("t10"));
        assert_eq!(catalog.hotkey_index("t10"), Some(0));
        assert_eq!(catalog.hotkey_index("t9"), None);
    }

    #[test]
    fn test_tag_at_hotkey_with_short_catalog() {
        let catalog = catalog_with(&["only"]);
        assert!(catalog.tag_at_hotkey(0).is_none());
        assert!(catalog.tag_at_hotkey(2).is_none());
        assert_eq!(catalog.tag_at_hotkey(1).map(|t| t.name.as_str()), Some("only"));
    }

    #[test]
    fn test_object_tags_follow_catalog_order() {
        let mut catalog = catalog_with(&["zeta", "alpha", "mid"]);
        assert!(catalog.assign_tag("Catalog.A", "mid"));
        assert!(catalog.assign_tag("Catalog.A", "zeta"));
        let names: Vec<&str> = catalog
            .object_tags("Catalog.A")
            .iter()
            .map(|tag| tag.name.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "mid"]);
    }

    #[test]
    fn test_find_objects_by_tags() {
        let mut catalog = catalog_with(&["bug", "todo", "perf"]);
        assert!(catalog.assign_tag("Catalog.A", "bug"));
        assert!(catalog.assign_tag("Catalog.A", "perf"));
        assert!(catalog.assign_tag("Catalog.B", "todo"));
        assert!(catalog.assign_tag("Catalog.C", "perf"));

        let found = catalog.find_objects_by_tags(&["bug".to_string(), "todo".to_string()]);
        assert_eq!(found.len(), 2);
        assert_eq!(found["Catalog.A"].len(), 1);
        assert_eq!(found["Catalog.A"][0].name, "bug");
        assert_eq!(found["Catalog.B"][0].name, "todo");
        assert!(catalog.find_objects_by_tags(&[]).is_empty());
    }

    #[test]
    fn test_rename_object_merges_existing_tags() {
        let mut catalog = catalog_with(&["bug", "todo"]);
        assert!(catalog.assign_tag("Catalog.Old", "bug"));
        assert!(catalog.assign_tag("Catalog.New", "todo"));
        assert!(catalog.rename_object("Catalog.Old", "Catalog.New"));

        assert!(!catalog.assignments().contains_key("Catalog.Old"));
        assert!(catalog.is_assigned("Catalog.New", "bug"));
        assert!(catalog.is_assigned("Catalog.New", "todo"));
        assert!(!catalog.rename_object("Catalog.Old", "Catalog.Other"));
        assert_consistent(&catalog);
    }

    #[test]
    fn test_remove_object() {
        let mut catalog = catalog_with(&["bug"]);
        assert!(catalog.assign_tag("Catalog.A", "bug"));
        assert!(catalog.remove_object("Catalog.A"));
        assert!(!catalog.remove_object("Catalog.A"));
        assert!(catalog.objects_by_tag("bug").is_empty());
    }

    #[test]
    fn test_failed_operations_do_not_touch_revision() {
        let mut catalog = catalog_with(&["bug"]);
        let revision = catalog.revision();
        assert!(!catalog.add_tag(Tag::new("bug", None, None)));
        assert!(!catalog.assign_tag("Catalog.A", "missing"));
        assert!(!catalog.move_tag_up("bug"));
        assert!(!catalog.rename_object("Catalog.A", "Catalog.B"));
        assert_eq!(catalog.revision(), revision);
    }

    #[test]
    fn test_equality_ignores_revision() {
        let mut left = catalog_with(&["bug"]);
        let right = catalog_with(&["bug"]);
        assert!(left.assign_tag("Catalog.A", "bug"));
        assert!(left.unassign_tag("Catalog.A", "bug"));
        assert_ne!(left.revision(), right.revision());
        assert_eq!(left, right);
    }
}
