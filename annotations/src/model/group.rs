// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Virtual folder hierarchy
//!
//! Groups form a tree by their `path` strings. The hierarchy is stored as a
//! flat list; the full path (`path/name`) of a group is its key. An object
//! FQN belongs to at most one group at a time.

use std::collections::BTreeSet;

pub const PATH_SEPARATOR: char = '/';

/// Join a parent path and a name into a full path.
pub fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", path, PATH_SEPARATOR, name)
    }
}

/// True when `path` equals `prefix` or lies below it on a `/` boundary.
pub fn is_within(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(PATH_SEPARATOR),
        None => false,
    }
}

pub fn is_valid_group_name(name: &str) -> bool {
    !name.trim().is_empty()
        && !name.contains(PATH_SEPARATOR)
        && !name.chars().any(|c| c.is_control())
}

/// Canonical form of a group location: no leading or trailing `/`, every
/// segment a valid group name. `None` when a segment is blank or invalid.
pub fn normalize_group_path(path: &str) -> Option<String> {
    let trimmed = path.trim_matches(PATH_SEPARATOR);
    if trimmed.is_empty() {
        return Some(String::new());
    }
    trimmed
        .split(PATH_SEPARATOR)
        .all(is_valid_group_name)
        .then(|| trimmed.to_string())
}

/// Blank descriptions are the same as none.
fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .filter(|description| !description.trim().is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub path: String,
    pub description: Option<String>,
    pub order: i32,
    children: Vec<String>,
}

impl Group {
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            description: None,
            order: 0,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.description = clean_description(description);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Appends children, skipping blanks and duplicates.
    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for child in children {
            self.push_child(child.into());
        }
        self
    }

    pub fn full_path(&self) -> String {
        join_path(&self.path, &self.name)
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.children.iter().any(|child| child == fqn)
    }

    pub(crate) fn push_child(&mut self, fqn: String) -> bool {
        if fqn.trim().is_empty() || self.contains(&fqn) {
            return false;
        }
        self.children.push(fqn);
        true
    }

    pub(crate) fn remove_child(&mut self, fqn: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|child| child != fqn);
        self.children.len() != before
    }

    fn replace_child(&mut self, old_fqn: &str, new_fqn: &str) -> bool {
        match self.children.iter_mut().find(|child| *child == old_fqn) {
            Some(child) => {
                *child = new_fqn.to_string();
                true
            }
            None => false,
        }
    }
}

/// Sort key used for display and for the persisted file: order, then name
/// without regard to case.
pub fn sibling_order(left: &Group, right: &Group) -> std::cmp::Ordering {
    left.order
        .cmp(&right.order)
        .then_with(|| left.name.to_lowercase().cmp(&right.name.to_lowercase()))
}

#[derive(Debug, Clone, Default)]
pub struct GroupHierarchy {
    groups: Vec<Group>,
    revision: u64,
}

impl PartialEq for GroupHierarchy {
    fn eq(&self, other: &Self) -> bool {
        self.groups.len() == other.groups.len()
            && self
                .groups
                .iter()
                .all(|group| other.group_by_full_path(&group.full_path()) == Some(group))
    }
}

impl GroupHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hierarchy from groups that already satisfy the invariants.
    pub(crate) fn from_groups(groups: Vec<Group>) -> Self {
        Self {
            groups,
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

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn index_of(&self, full_path: &str) -> Option<usize> {
        self.groups
            .iter()
            .position(|group| group.full_path() == full_path)
    }

    pub fn group_by_full_path(&self, full_path: &str) -> Option<&Group> {
        self.index_of(full_path).map(|index| &self.groups[index])
    }

    /// Direct children of `path` (empty for the root), in display order.
    pub fn groups_at_path(&self, path: &str) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self
            .groups
            .iter()
            .filter(|group| group.path == path)
            .collect();
        groups.sort_by(|left, right| sibling_order(left, right));
        groups
    }

    pub fn has_groups_at_path(&self, path: &str) -> bool {
        self.groups.iter().any(|group| group.path == path)
    }

    /// Order value that places a new group after its current siblings.
    pub fn next_order_at(&self, path: &str) -> i32 {
        self.groups
            .iter()
            .filter(|group| group.path == path)
            .map(|group| group.order.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    /// Adds a group. Its path is stored in canonical form; children already
    /// placed in another group move into the new one.
    pub fn add_group(&mut self, mut group: Group) -> bool {
        let Some(path) = normalize_group_path(&group.path) else {
            return false;
        };
        group.path = path;
        group.description = clean_description(group.description.as_deref());
        if !is_valid_group_name(&group.name) || self.index_of(&group.full_path()).is_some() {
            return false;
        }
        for child in group.children() {
            for existing in &mut self.groups {
                existing.remove_child(child);
            }
        }
        self.groups.push(group);
        self.touch();
        true
    }

    /// Removes one group. Its children fall back to their natural location
    /// and descendant groups are kept.
    pub fn remove_group(&mut self, full_path: &str) -> bool {
        let Some(index) = self.index_of(full_path) else {
            return false;
        };
        self.groups.remove(index);
        self.touch();
        true
    }

    pub fn rename_group(&mut self, old_full_path: &str, new_name: &str) -> bool {
        let Some(index) = self.index_of(old_full_path) else {
            return false;
        };
        if !is_valid_group_name(new_name) || self.groups[index].name == new_name {
            return false;
        }
        let new_full_path = join_path(&self.groups[index].path, new_name);
        if !self.can_relocate(old_full_path, &new_full_path) {
            return false;
        }
        self.relocate(index, new_name, old_full_path, &new_full_path);
        self.touch();
        true
    }

    /// Renames when `new_name` differs and always replaces the description.
    pub fn update_group(
        &mut self,
        full_path: &str,
        new_name: &str,
        description: Option<&str>,
    ) -> bool {
        let Some(index) = self.index_of(full_path) else {
            return false;
        };
        let renaming = self.groups[index].name != new_name;
        if renaming {
            if !is_valid_group_name(new_name) {
                return false;
            }
            let new_full_path = join_path(&self.groups[index].path, new_name);
            if !self.can_relocate(full_path, &new_full_path) {
                return false;
            }
            self.relocate(index, new_name, full_path, &new_full_path);
        }
        let description = clean_description(description);
        let described = self.groups[index].description != description;
        self.groups[index].description = description;
        if renaming || described {
            self.touch();
        }
        true
    }

    /// The moved subtree must not land on an existing full path, including
    /// groups orphaned under the target name.
    fn can_relocate(&self, old_full_path: &str, new_full_path: &str) -> bool {
        let moved = |group: &Group| {
            group.full_path() == old_full_path || is_within(&group.path, old_full_path)
        };
        let staying: BTreeSet<String> = self
            .groups
            .iter()
            .filter(|group| !moved(*group))
            .map(Group::full_path)
            .collect();
        self.groups.iter().filter(|group| moved(*group)).all(|group| {
            let full_path = group.full_path();
            let target = format!("{}{}", new_full_path, &full_path[old_full_path.len()..]);
            !staying.contains(&target)
        })
    }

    fn relocate(&mut self, index: usize, new_name: &str, old_prefix: &str, new_prefix: &str) {
        self.groups[index].name = new_name.to_string();
        for group in &mut self.groups {
            if is_within(&group.path, old_prefix) {
                group.path = format!("{}{}", new_prefix, &group.path[old_prefix.len()..]);
            }
        }
    }

    pub fn find_group_for_object(&self, fqn: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.contains(fqn))
    }

    /// Takes the object out of its current group, then appends it to
    /// `target`. When the target does not exist the object stays ungrouped.
    pub fn move_object_to_group(&mut self, fqn: &str, target: &str) -> bool {
        if fqn.trim().is_empty() {
            return false;
        }
        let mut modified = self.detach(fqn);
        let moved = match self.index_of(target) {
            Some(index) => {
                self.groups[index].push_child(fqn.to_string());
                modified = true;
                true
            }
            None => false,
        };
        if modified {
            self.touch();
        }
        moved
    }

    pub fn remove_object(&mut self, fqn: &str) -> bool {
        let removed = self.detach(fqn);
        if removed {
            self.touch();
        }
        removed
    }

    fn detach(&mut self, fqn: &str) -> bool {
        let mut removed = false;
        for group in &mut self.groups {
            removed |= group.remove_child(fqn);
        }
        removed
    }

    /// Rewrites `old_fqn` in place. A stale membership of `new_fqn` in any
    /// group is dropped first.
    pub fn rename_object(&mut self, old_fqn: &str, new_fqn: &str) -> bool {
        if old_fqn == new_fqn
            || new_fqn.trim().is_empty()
            || self.find_group_for_object(old_fqn).is_none()
        {
            return false;
        }
        self.detach(new_fqn);
        for group in &mut self.groups {
            if group.replace_child(old_fqn, new_fqn) {
                break;
            }
        }
        self.touch();
        true
    }

    /// Children of the groups located at `path` or anywhere below it. A
    /// group whose own full path is `path` is not located there.
    pub fn grouped_objects_under(&self, path: &str) -> BTreeSet<String> {
        self.groups
            .iter()
            .filter(|group| path.is_empty() || is_within(&group.path, path))
            .flat_map(|group| group.children().iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_single_membership(hierarchy: &GroupHierarchy) {
        let mut seen = BTreeSet::new();
        for group in hierarchy.groups() {
            for child in group.children() {
                assert!(seen.insert(child.clone()), "{} grouped twice", child);
            }
        }
    }

    fn hierarchy_with(groups: &[(&str, &str)]) -> GroupHierarchy {
        let mut hierarchy = GroupHierarchy::new();
        for (path, name) in groups {
            assert!(hierarchy.add_group(Group::new(name, path)));
        }
        hierarchy
    }

    #[test]
    fn test_join_path_and_is_within() {
        assert_eq!(join_path("", "A"), "A");
        assert_eq!(join_path("P", "A"), "P/A");
        assert!(is_within("P/A", "P/A"));
        assert!(is_within("P/A/B", "P/A"));
        assert!(!is_within("P/AB", "P/A"));
        assert!(!is_within("P", "P/A"));
    }

    #[test]
    fn test_add_group_twice_fails() {
        let mut hierarchy = GroupHierarchy::new();
        assert!(hierarchy.add_group(Group::new("Server", "CommonModules")));
        assert!(!hierarchy.add_group(Group::new("Server", "CommonModules")));
        assert_eq!(hierarchy.len(), 1);
        assert!(
            hierarchy
                .group_by_full_path("CommonModules/Server")
                .is_some()
        );
    }

    #[test]
    fn test_add_group_rejects_invalid_names() {
        let mut hierarchy = GroupHierarchy::new();
        assert!(!hierarchy.add_group(Group::new("", "P")));
        assert!(!hierarchy.add_group(Group::new("  ", "P")));
        assert!(!hierarchy.add_group(Group::new("A/B", "P")));
        assert!(hierarchy.is_empty());
    }

    #[test]
    fn test_add_group_takes_children_from_other_groups() {
        let mut hierarchy = hierarchy_with(&[("", "A")]);
        assert!(hierarchy.move_object_to_group("Module.X", "A"));
        let group = Group::new("B", "").with_children(["Module.X", "Module.Y", "Module.Y"]);
        assert!(hierarchy.add_group(group));

        assert_eq!(
            hierarchy.find_group_for_object("Module.X").map(|g| g.name.as_str()),
            Some("B")
        );
        assert_eq!(
            hierarchy.group_by_full_path("B").expect("group").children(),
            ["Module.X".to_string(), "Module.Y".to_string()]
        );
        assert_single_membership(&hierarchy);
    }

    #[test]
    fn test_rename_cascades_to_descendants() {
        let mut hierarchy = hierarchy_with(&[("", "P"), ("P", "A"), ("P/A", "B"), ("P/A/B", "C")]);
        assert!(hierarchy.rename_group("P/A", "A2"));

        assert!(hierarchy.group_by_full_path("P/A2").is_some());
        assert!(hierarchy.group_by_full_path("P/A").is_none());
        assert_eq!(
            hierarchy.group_by_full_path("P/A2/B").expect("B").path,
            "P/A2"
        );
        assert!(hierarchy.group_by_full_path("P/A2/B/C").is_some());
    }

    #[test]
    fn test_rename_is_anchored_on_separator() {
        let mut hierarchy = hierarchy_with(&[("", "A"), ("A", "X"), ("", "AB"), ("AB", "Y")]);
        assert!(hierarchy.rename_group("A", "Z"));

        assert!(hierarchy.group_by_full_path("Z/X").is_some());
        assert!(hierarchy.group_by_full_path("AB").is_some());
        assert_eq!(hierarchy.group_by_full_path("AB/Y").expect("Y").path, "AB");
    }

    #[test]
    fn test_rename_rejections() {
        let mut hierarchy = hierarchy_with(&[("", "A"), ("", "B")]);
        assert!(!hierarchy.rename_group("A", "B"));
        assert!(!hierarchy.rename_group("A", "A"));
        assert!(!hierarchy.rename_group("A", "x/y"));
        assert!(!hierarchy.rename_group("Missing", "C"));
        assert!(hierarchy.group_by_full_path("A").is_some());
    }

    #[test]
    fn test_rename_rejects_collision_with_orphaned_branch() {
        let mut hierarchy = hierarchy_with(&[("", "A"), ("A", "X"), ("", "B"), ("B", "X")]);
        assert!(hierarchy.remove_group("B"));
        let revision = hierarchy.revision();

        assert!(!hierarchy.rename_group("A", "B"));
        assert_eq!(hierarchy.revision(), revision);
        assert!(hierarchy.group_by_full_path("A/X").is_some());
        assert!(hierarchy.group_by_full_path("B/X").is_some());
    }

    #[test]
    fn test_remove_group_keeps_descendants() {
        let mut hierarchy = hierarchy_with(&[("", "A"), ("A", "B")]);
        assert!(hierarchy.move_object_to_group("Module.X", "A"));
        assert!(hierarchy.remove_group("A"));
        assert!(!hierarchy.remove_group("A"));
        assert!(hierarchy.group_by_full_path("A/B").is_some());
        assert!(hierarchy.find_group_for_object("Module.X").is_none());
    }

    #[test]
    fn test_update_group_overwrites_description() {
        let mut hierarchy = GroupHierarchy::new();
        let group = Group::new("Server", "CommonModules").with_description(Some("old"));
        assert!(hierarchy.add_group(group));

        assert!(hierarchy.update_group("CommonModules/Server", "Server", None));
        assert_eq!(
            hierarchy
                .group_by_full_path("CommonModules/Server")
                .expect("group")
                .description,
            None
        );

        assert!(hierarchy.update_group("CommonModules/Server", "Backend", Some("Server code")));
        let group = hierarchy
            .group_by_full_path("CommonModules/Backend")
            .expect("renamed");
        assert_eq!(group.description.as_deref(), Some("Server code"));
    }

    #[test]
    fn test_update_group_collision_changes_nothing() {
        let mut hierarchy = hierarchy_with(&[("", "A"), ("", "B")]);
        assert!(!hierarchy.update_group("A", "B", Some("text")));
        assert_eq!(
            hierarchy.group_by_full_path("A").expect("A").description,
            None
        );
    }

    #[test]
    fn test_move_object_keeps_single_membership() {
        let mut hierarchy = hierarchy_with(&[("", "A"), ("", "B")]);
        assert!(hierarchy.move_object_to_group("Module.X", "A"));
        assert!(hierarchy.move_object_to_group("Module.X", "B"));
        assert!(hierarchy.move_object_to_group("Module.X", "B"));

        let owner = hierarchy.find_group_for_object("Module.X").expect("owner");
        assert_eq!(owner.full_path(), "B");
        assert_eq!(owner.children().len(), 1);
        assert_single_membership(&hierarchy);
    }

    #[test]
    fn test_move_to_missing_group_leaves_object_ungrouped() {
        let mut hierarchy = hierarchy_with(&[("", "A")]);
        assert!(hierarchy.move_object_to_group("Module.X", "A"));
        let revision = hierarchy.revision();

        assert!(!hierarchy.move_object_to_group("Module.X", "Missing"));
        assert!(hierarchy.find_group_for_object("Module.X").is_none());
        assert_ne!(hierarchy.revision(), revision);

        let revision = hierarchy.revision();
        assert!(!hierarchy.move_object_to_group("Module.Y", "Missing"));
        assert_eq!(hierarchy.revision(), revision);
    }

    #[test]
    fn test_groups_at_path_sorted_by_order_then_name() {
        let mut hierarchy = GroupHierarchy::new();
        assert!(hierarchy.add_group(Group::new("beta", "P").with_order(1)));
        assert!(hierarchy.add_group(Group::new("Alpha", "P").with_order(1)));
        assert!(hierarchy.add_group(Group::new("zulu", "P").with_order(0)));
        assert!(hierarchy.add_group(Group::new("Nested", "P/zulu")));
        assert!(hierarchy.add_group(Group::new("Root", "")));

        let names: Vec<&str> = hierarchy
            .groups_at_path("P")
            .iter()
            .map(|group| group.name.as_str())
            .collect();
        assert_eq!(names, vec!["zulu", "Alpha", "beta"]);
        assert_eq!(hierarchy.groups_at_path("").len(), 1);
        assert!(hierarchy.has_groups_at_path("P/zulu"));
        assert!(!hierarchy.has_groups_at_path("Q"));
    }

    #[test]
    fn test_next_order_at() {
        let mut hierarchy = GroupHierarchy::new();
        assert_eq!(hierarchy.next_order_at("P"), 0);
        assert!(hierarchy.add_group(Group::new("A", "P").with_order(4)));
        assert!(hierarchy.add_group(Group::new("B", "P").with_order(2)));
        assert_eq!(hierarchy.next_order_at("P"), 5);
        assert_eq!(hierarchy.next_order_at(""), 0);
    }

    #[test]
    fn test_rename_object_drops_stale_target() {
        let mut hierarchy = hierarchy_with(&[("", "A"), ("", "B")]);
        assert!(hierarchy.move_object_to_group("Module.Old", "A"));
        assert!(hierarchy.move_object_to_group("Module.New", "B"));
        assert!(hierarchy.rename_object("Module.Old", "Module.New"));

        assert_eq!(
            hierarchy.find_group_for_object("Module.New").map(Group::full_path),
            Some("A".to_string())
        );
        assert!(hierarchy.group_by_full_path("B").expect("B").children().is_empty());
        assert!(hierarchy.find_group_for_object("Module.Old").is_none());
        assert!(!hierarchy.rename_object("Module.Old", "Module.Other"));
        assert_single_membership(&hierarchy);
    }

    #[test]
    fn test_rename_object_keeps_position() {
        let mut hierarchy = hierarchy_with(&[("", "A")]);
        for fqn in ["Module.1", "Module.2", "Module.3"] {
            assert!(hierarchy.move_object_to_group(fqn, "A"));
        }
        assert!(hierarchy.rename_object("Module.2", "Module.Two"));
        assert_eq!(
            hierarchy.group_by_full_path("A").expect("A").children(),
            [
                "Module.1".to_string(),
                "Module.Two".to_string(),
                "Module.3".to_string()
            ]
        );
    }

    #[test]
    fn test_remove_object() {
        let mut hierarchy = hierarchy_with(&[("", "A")]);
        assert!(hierarchy.move_object_to_group("Module.X", "A"));
        assert!(hierarchy.remove_object("Module.X"));
        assert!(!hierarchy.remove_object("Module.X"));
    }

    #[test]
    fn test_normalize_group_path() {
        assert_eq!(normalize_group_path(""), Some(String::new()));
        assert_eq!(normalize_group_path("/"), Some(String::new()));
        assert_eq!(normalize_group_path("/A/B/"), Some("A/B".to_string()));
        assert_eq!(normalize_group_path("A//B"), None);
        assert_eq!(normalize_group_path("A/ /B"), None);
    }

    #[test]
    fn test_add_group_stores_canonical_path() {
        let mut hierarchy = GroupHierarchy::new();
        assert!(hierarchy.add_group(Group::new("Server", "CommonModules/")));
        assert!(hierarchy.group_by_full_path("CommonModules/Server").is_some());
        assert!(hierarchy.group_by_full_path("CommonModules//Server").is_none());

        assert!(!hierarchy.add_group(Group::new("Server", "/CommonModules")));
        assert!(!hierarchy.add_group(Group::new("Client", "CommonModules//Shared")));
        assert_eq!(hierarchy.len(), 1);
    }

    #[test]
    fn test_blank_descriptions_are_dropped() {
        let mut hierarchy = GroupHierarchy::new();
        let mut group = Group::new("A", "");
        group.description = Some("   ".to_string());
        assert!(hierarchy.add_group(group));
        assert_eq!(hierarchy.group_by_full_path("A").expect("A").description, None);

        let revision = hierarchy.revision();
        assert!(hierarchy.update_group("A", "A", Some(" ")));
        assert_eq!(hierarchy.revision(), revision);
        assert_eq!(Group::new("B", "").with_description(Some("")).description, None);
    }

    #[test]
    fn test_grouped_objects_under() {
        let mut hierarchy =
            hierarchy_with(&[("", "A"), ("A", "B"), ("A/B", "C"), ("AB", "D"), ("", "AB")]);
        assert!(hierarchy.move_object_to_group("Module.1", "A"));
        assert!(hierarchy.move_object_to_group("Module.2", "A/B"));
        assert!(hierarchy.move_object_to_group("Module.3", "AB"));
        assert!(hierarchy.move_object_to_group("Module.4", "A/B/C"));
        assert!(hierarchy.move_object_to_group("Module.5", "AB/D"));

        let under_a = hierarchy.grouped_objects_under("A");
        assert_eq!(
            under_a.into_iter().collect::<Vec<_>>(),
            vec!["Module.2".to_string(), "Module.4".to_string()]
        );
        assert_eq!(hierarchy.grouped_objects_under("").len(), 5);
        assert!(hierarchy.grouped_objects_under("Missing").is_empty());
    }
}
