// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::cli::parse_utils::{next_value, parse_required_arg, plural, reject_extra};
use crate::cli::{CliCommand, CliError, CommandSpec, DomainSpec};
use crate::model::{Group, normalize_group_path};
use crate::store::AnnotationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    List {
        path: Option<String>,
    },
    Add {
        name: String,
        path: String,
        description: Option<String>,
    },
    Rename {
        full_path: String,
        new_name: String,
    },
    Update {
        full_path: String,
        new_name: Option<String>,
        description: DescriptionChange,
    },
    Delete {
        full_path: String,
    },
    Show {
        full_path: String,
    },
    Move {
        fqn: String,
        target: String,
    },
    Ungroup {
        fqn: String,
    },
    Find {
        fqn: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DescriptionChange {
    #[default]
    Keep,
    Set(String),
    Clear,
}

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "group",
        aliases: &["g"],
        commands: vec![
            CommandSpec {
                name: "list",
                aliases: &["ls"],
                usage: &["group list [<path>]"],
                parser: parse_list,
            },
            CommandSpec {
                name: "add",
                aliases: &[],
                usage: &["group add <name> [--path <parent path>] [--description <text>]"],
                parser: parse_add,
            },
            CommandSpec {
                name: "rename",
                aliases: &[],
                usage: &["group rename <full path> <new name>"],
                parser: parse_rename,
            },
            CommandSpec {
                name: "update",
                aliases: &[],
                usage: &[
                    "group update <full path> [--name <new name>] [--description <text> | --clear-description]",
                ],
                parser: parse_update,
            },
            CommandSpec {
                name: "delete",
                aliases: &["rm"],
                usage: &["group delete <full path>"],
                parser: parse_delete,
            },
            CommandSpec {
                name: "show",
                aliases: &[],
                usage: &["group show <full path>"],
                parser: parse_show,
            },
            CommandSpec {
                name: "move",
                aliases: &["mv"],
                usage: &["group move <fqn> <full path>"],
                parser: parse_move,
            },
            CommandSpec {
                name: "ungroup",
                aliases: &[],
                usage: &["group ungroup <fqn>"],
                parser: parse_ungroup,
            },
            CommandSpec {
                name: "find",
                aliases: &[],
                usage: &["group find <fqn>"],
                parser: parse_find,
            },
        ],
    }
}

fn command(command: GroupCommand) -> CliCommand {
    CliCommand::Groups(command)
}

fn parse_list(args: &[String]) -> Result<CliCommand, CliError> {
    match args {
        [] => Ok(command(GroupCommand::List { path: None })),
        [path] => Ok(command(GroupCommand::List {
            path: Some(path.clone()),
        })),
        _ => Err(CliError::usage("group list takes at most <path>")),
    }
}

fn parse_add(args: &[String]) -> Result<CliCommand, CliError> {
    let (name, rest) = parse_required_arg(args, "group name")?;
    let mut path = String::new();
    let mut description = None;

    let mut idx = 0;
    while idx < rest.len() {
        match rest[idx].as_str() {
            "--path" => {
                idx += 1;
                let value = next_value(rest, &mut idx, "--path")?;
                path = normalize_group_path(&value).ok_or_else(|| {
                    CliError::usage(format!("Invalid group path: {}", value))
                })?;
            }
            "--description" => {
                idx += 1;
                description = Some(next_value(rest, &mut idx, "--description")?);
            }
            flag => {
                return Err(CliError::usage(format!(
                    "Unknown flag for group add: {}",
                    flag
                )));
            }
        }
    }

    Ok(command(GroupCommand::Add {
        name,
        path,
        description,
    }))
}

fn parse_rename(args: &[String]) -> Result<CliCommand, CliError> {
    let (full_path, rest) = parse_required_arg(args, "group path")?;
    let (new_name, rest) = parse_required_arg(rest, "new group name")?;
    reject_extra(rest, "group rename takes only <full path> <new name>")?;
    Ok(command(GroupCommand::Rename {
        full_path,
        new_name,
    }))
}

fn parse_update(args: &[String]) -> Result<CliCommand, CliError> {
    let (full_path, rest) = parse_required_arg(args, "group path")?;
    let mut new_name = None;
    let mut description = DescriptionChange::Keep;

    let mut idx = 0;
    while idx < rest.len() {
        match rest[idx].as_str() {
            "--name" => {
                idx += 1;
                new_name = Some(next_value(rest, &mut idx, "--name")?);
            }
            "--description" => {
                if description == DescriptionChange::Clear {
                    return Err(CliError::usage(
                        "--description cannot be used with --clear-description",
                    ));
                }
                idx += 1;
                description = DescriptionChange::Set(next_value(rest, &mut idx, "--description")?);
            }
            "--clear-description" => {
                if matches!(description, DescriptionChange::Set(_)) {
                    return Err(CliError::usage(
                        "--clear-description cannot be used with --description",
                    ));
                }
                description = DescriptionChange::Clear;
                idx += 1;
            }
            flag => {
                return Err(CliError::usage(format!(
                    "Unknown flag for group update: {}",
                    flag
                )));
            }
        }
    }

    if new_name.is_none() && description == DescriptionChange::Keep {
        return Err(CliError::usage(
            "group update requires --name, --description, or --clear-description",
        ));
    }

    Ok(command(GroupCommand::Update {
        full_path,
        new_name,
        description,
    }))
}

fn parse_delete(args: &[String]) -> Result<CliCommand, CliError> {
    let (full_path, rest) = parse_required_arg(args, "group path")?;
    reject_extra(rest, "group delete takes only <full path>")?;
    Ok(command(GroupCommand::Delete { full_path }))
}

fn parse_show(args: &[String]) -> Result<CliCommand, CliError> {
    let (full_path, rest) = parse_required_arg(args, "group path")?;
    reject_extra(rest, "group show takes only <full path>")?;
    Ok(command(GroupCommand::Show { full_path }))
}

fn parse_move(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, rest) = parse_required_arg(args, "object fqn")?;
    let (target, rest) = parse_required_arg(rest, "group path")?;
    reject_extra(rest, "group move takes only <fqn> <full path>")?;
    Ok(command(GroupCommand::Move { fqn, target }))
}

fn parse_ungroup(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, rest) = parse_required_arg(args, "object fqn")?;
    reject_extra(rest, "group ungroup takes only <fqn>")?;
    Ok(command(GroupCommand::Ungroup { fqn }))
}

fn parse_find(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, rest) = parse_required_arg(args, "object fqn")?;
    reject_extra(rest, "group find takes only <fqn>")?;
    Ok(command(GroupCommand::Find { fqn }))
}

pub(crate) fn execute(
    store: &AnnotationStore,
    project: &str,
    command: GroupCommand,
) -> Result<String, CliError> {
    let groups = store.groups();
    match command {
        GroupCommand::List { path } => {
            let mut listed = match &path {
                Some(path) => groups.groups_at_path(project, path),
                None => groups.all_groups(project),
            };
            if listed.is_empty() {
                return Ok("No groups defined".to_string());
            }
            if path.is_none() {
                listed.sort_by_key(Group::full_path);
            }
            Ok(listed
                .iter()
                .map(format_group)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        GroupCommand::Add {
            name,
            path,
            description,
        } => groups
            .create_group(project, &name, &path, description.as_deref())
            .map(|group| format!("Group '{}' added", group.full_path()))
            .ok_or_else(|| {
                CliError::failed(format!(
                    "Group '{}' was not added: the name is invalid or already taken",
                    crate::model::join_path(&path, &name)
                ))
            }),
        GroupCommand::Rename {
            full_path,
            new_name,
        } => outcome(
            groups.rename_group(project, &full_path, &new_name),
            format!("Group '{}' renamed to '{}'", full_path, new_name),
            format!(
                "Group '{}' was not renamed: it does not exist or '{}' is taken",
                full_path, new_name
            ),
        ),
        GroupCommand::Update {
            full_path,
            new_name,
            description,
        } => {
            let current = groups
                .group(project, &full_path)
                .ok_or_else(|| CliError::failed(format!("Group '{}' does not exist", full_path)))?;
            let name = new_name.unwrap_or_else(|| current.name.clone());
            let description = match description {
                DescriptionChange::Keep => current.description.clone(),
                DescriptionChange::Set(text) => Some(text),
                DescriptionChange::Clear => None,
            };
            outcome(
                groups.update_group(project, &full_path, &name, description.as_deref()),
                format!("Group '{}' updated", full_path),
                format!(
                    "Group '{}' was not updated: the name '{}' is invalid or taken",
                    full_path, name
                ),
            )
        }
        GroupCommand::Delete { full_path } => outcome(
            groups.remove_group(project, &full_path),
            format!("Group '{}' deleted", full_path),
            format!("Group '{}' does not exist", full_path),
        ),
        GroupCommand::Show { full_path } => {
            let group = groups
                .group(project, &full_path)
                .ok_or_else(|| CliError::failed(format!("Group '{}' does not exist", full_path)))?;
            let mut lines = vec![format_group(&group)];
            lines.extend(group.children().iter().map(|child| format!("  {}", child)));
            Ok(lines.join("\n"))
        }
        GroupCommand::Move { fqn, target } => {
            // A missing target would silently ungroup the object.
            if groups.group(project, &target).is_none() {
                return Err(CliError::failed(format!("Group '{}' does not exist", target)));
            }
            outcome(
                groups.move_object_to_group(project, &fqn, &target),
                format!("{} moved to '{}'", fqn, target),
                format!("{} was not moved to '{}'", fqn, target),
            )
        }
        GroupCommand::Ungroup { fqn } => outcome(
            groups.remove_object_from_group(project, &fqn),
            format!("{} is no longer grouped", fqn),
            format!("{} is not in any group", fqn),
        ),
        GroupCommand::Find { fqn } => Ok(match groups.find_group_for_object(project, &fqn) {
            Some(group) => format!("{}: {}", fqn, group.full_path()),
            None => format!("{} is not in any group", fqn),
        }),
    }
}

fn outcome(done: bool, success: String, failure: String) -> Result<String, CliError> {
    if done {
        Ok(success)
    } else {
        Err(CliError::failed(failure))
    }
}

fn format_group(group: &Group) -> String {
    let mut line = format!(
        "{} ({})",
        group.full_path(),
        plural(group.children().len(), "object")
    );
    if let Some(description) = group.description.as_deref()
        && !description.is_empty()
    {
        line.push_str(" - ");
        line.push_str(description);
    }
    line
}
