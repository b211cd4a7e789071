// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! YAML encoding of the per-project annotation files
//!
//! Both files are plain block YAML without type tags so they can be edited
//! by hand and diffed. Decoding is lenient: a hand-edited file that breaks
//! an invariant is repaired on load and each repair is logged.

use crate::model::tag::DEFAULT_TAG_COLOR;
use crate::model::{
    Group, GroupHierarchy, Tag, TagCatalog, canonical_tag_color, is_valid_group_name,
    is_valid_tag_name, normalize_group_path,
};
use crate::util::color::is_hex_color;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub struct CodecError {
    message: String,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CodecError {}

/// Treats an explicit `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TagDocument {
    #[serde(default, deserialize_with = "nullable")]
    tags: Vec<TagRecord>,
    #[serde(default, deserialize_with = "nullable")]
    assignments: BTreeMap<String, Option<Vec<String>>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TagRecord {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(default, deserialize_with = "nullable")]
    color: String,
    #[serde(default, deserialize_with = "nullable")]
    description: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GroupDocument {
    #[serde(default, deserialize_with = "nullable")]
    groups: Vec<GroupRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GroupRecord {
    #[serde(default, deserialize_with = "nullable")]
    name: String,
    #[serde(
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "String::is_empty"
    )]
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    order: i32,
    #[serde(default, deserialize_with = "nullable")]
    children: Vec<String>,
}

pub fn encode_tags(catalog: &TagCatalog) -> Result<String, CodecError> {
    let document = TagDocument {
        tags: catalog
            .tags()
            .iter()
            .map(|tag| TagRecord {
                name: tag.name.clone(),
                color: tag.color.clone(),
                description: tag.description.clone(),
            })
            .collect(),
        assignments: catalog
            .assignments()
            .iter()
            .map(|(fqn, names)| (fqn.clone(), Some(names.iter().cloned().collect())))
            .collect(),
    };
    serde_yaml::to_string(&document)
        .map_err(|err| CodecError::new(format!("Failed to serialize tags: {}", err)))
}

pub fn decode_tags(content: &str) -> Result<TagCatalog, CodecError> {
    if content.trim().is_empty() {
        return Ok(TagCatalog::new());
    }
    let document: TagDocument = serde_yaml::from_str(content)
        .map_err(|err| CodecError::new(format!("Failed to parse tags: {}", err)))?;
    Ok(catalog_from_document(document))
}

fn catalog_from_document(document: TagDocument) -> TagCatalog {
    let mut tags: Vec<Tag> = Vec::with_capacity(document.tags.len());
    let mut known: HashSet<String> = HashSet::new();
    for record in document.tags {
        if !is_valid_tag_name(&record.name) {
            warn!("Dropping tag with invalid name '{}'", record.name);
            continue;
        }
        if !known.insert(record.name.clone()) {
            warn!("Dropping duplicate tag '{}'", record.name);
            continue;
        }
        if !record.color.trim().is_empty() && !is_hex_color(&record.color) {
            warn!(
                "Tag '{}' has invalid color '{}', using {}",
                record.name, record.color, DEFAULT_TAG_COLOR
            );
        }
        let color = canonical_tag_color(Some(&record.color));
        tags.push(Tag {
            name: record.name,
            color,
            description: record.description,
        });
    }

    let mut assignments: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (fqn, names) in document.assignments {
        if fqn.trim().is_empty() {
            warn!("Dropping tag assignment with blank object name");
            continue;
        }
        let mut kept = BTreeSet::new();
        for name in names.unwrap_or_default() {
            if known.contains(&name) {
                kept.insert(name);
            } else {
                warn!("Dropping unknown tag '{}' assigned to '{}'", name, fqn);
            }
        }
        if kept.is_empty() {
            warn!("Dropping empty tag assignment for '{}'", fqn);
            continue;
        }
        assignments.insert(fqn, kept);
    }

    TagCatalog::from_parts(tags, assignments)
}

/// Groups are written sorted by path, order and name so that edits produce
/// small diffs. Children keep their insertion order.
pub fn encode_groups(hierarchy: &GroupHierarchy) -> Result<String, CodecError> {
    let mut groups: Vec<&Group> = hierarchy.groups().iter().collect();
    groups.sort_by(|left, right| {
        left.path
            .cmp(&right.path)
            .then_with(|| crate::model::group::sibling_order(left, right))
    });
    let document = GroupDocument {
        groups: groups
            .into_iter()
            .map(|group| GroupRecord {
                name: group.name.clone(),
                path: group.path.clone(),
                description: group.description.clone(),
                order: group.order,
                children: group.children().to_vec(),
            })
            .collect(),
    };
    serde_yaml::to_string(&document)
        .map_err(|err| CodecError::new(format!("Failed to serialize groups: {}", err)))
}

pub fn decode_groups(content: &str) -> Result<GroupHierarchy, CodecError> {
    if content.trim().is_empty() {
        return Ok(GroupHierarchy::new());
    }
    let document: GroupDocument = serde_yaml::from_str(content)
        .map_err(|err| CodecError::new(format!("Failed to parse groups: {}", err)))?;
    Ok(hierarchy_from_document(document))
}

fn hierarchy_from_document(document: GroupDocument) -> GroupHierarchy {
    let mut groups: Vec<Group> = Vec::with_capacity(document.groups.len());
    let mut full_paths: HashSet<String> = HashSet::new();
    let mut grouped: HashSet<String> = HashSet::new();

    for record in document.groups {
        if !is_valid_group_name(&record.name) {
            warn!("Dropping group with invalid name '{}'", record.name);
            continue;
        }
        let Some(path) = normalize_group_path(&record.path) else {
            warn!(
                "Dropping group '{}' with invalid path '{}'",
                record.name, record.path
            );
            continue;
        };
        let mut group = Group::new(&record.name, &path)
            .with_description(record.description.as_deref())
            .with_order(record.order);
        let full_path = group.full_path();
        if !full_paths.insert(full_path.clone()) {
            warn!("Dropping duplicate group '{}'", full_path);
            continue;
        }
        for child in record.children {
            if child.trim().is_empty() {
                warn!("Dropping blank child of group '{}'", full_path);
            } else if group.contains(&child) {
                warn!("Dropping duplicate child '{}' of group '{}'", child, full_path);
            } else if grouped.contains(&child) {
                warn!(
                    "Dropping '{}' from group '{}': already grouped elsewhere",
                    child, full_path
                );
            } else {
                grouped.insert(child.clone());
                group.push_child(child);
            }
        }
        groups.push(group);
    }

    GroupHierarchy::from_groups(groups)
}
