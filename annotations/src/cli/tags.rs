// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::cli::parse_utils::{next_value, parse_required_arg, plural, reject_extra};
use crate::cli::{CliCommand, CliError, CommandSpec, DomainSpec};
use crate::model::TagUpdate;
use crate::service::{HotkeyToggle, TagSummary};
use crate::store::AnnotationStore;
use crate::util::color::normalize_hex_color;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCommand {
    List,
    Add {
        name: String,
        color: Option<String>,
        description: Option<String>,
    },
    Change {
        name: String,
        update: TagChange,
    },
    Delete {
        name: String,
    },
    Up {
        name: String,
    },
    Down {
        name: String,
    },
    Assign {
        fqn: String,
        tag: String,
    },
    Unassign {
        fqn: String,
        tag: String,
    },
    Toggle {
        fqn: String,
        hotkey: u8,
    },
    Show {
        fqn: String,
    },
    Find {
        tags: Vec<String>,
    },
}

/// Fields given to `tag change`; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagChange {
    pub new_name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
}

impl From<TagChange> for TagUpdate {
    fn from(change: TagChange) -> Self {
        TagUpdate {
            name: change.new_name,
            color: change.color,
            description: change.description,
        }
    }
}

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "tag",
        aliases: &["t"],
        commands: vec![
            CommandSpec {
                name: "list",
                aliases: &["ls"],
                usage: &["tag list"],
                parser: parse_list,
            },
            CommandSpec {
                name: "add",
                aliases: &[],
                usage: &["tag add <name> [--color <#RRGGBB>] [--description <text>]"],
                parser: parse_add,
            },
            CommandSpec {
                name: "change",
                aliases: &[],
                usage: &[
                    "tag change <name> [--name <new name>] [--color <#RRGGBB>] [--description <text>]",
                ],
                parser: parse_change,
            },
            CommandSpec {
                name: "delete",
                aliases: &["rm"],
                usage: &["tag delete <name>"],
                parser: parse_delete,
            },
            CommandSpec {
                name: "up",
                aliases: &[],
                usage: &["tag up <name>"],
                parser: parse_up,
            },
            CommandSpec {
                name: "down",
                aliases: &[],
                usage: &["tag down <name>"],
                parser: parse_down,
            },
            CommandSpec {
                name: "assign",
                aliases: &[],
                usage: &["tag assign <fqn> <tag>"],
                parser: parse_assign,
            },
            CommandSpec {
                name: "unassign",
                aliases: &[],
                usage: &["tag unassign <fqn> <tag>"],
                parser: parse_unassign,
            },
            CommandSpec {
                name: "toggle",
                aliases: &[],
                usage: &["tag toggle <fqn> <hotkey 0-9>"],
                parser: parse_toggle,
            },
            CommandSpec {
                name: "show",
                aliases: &[],
                usage: &["tag show <fqn>"],
                parser: parse_show,
            },
            CommandSpec {
                name: "find",
                aliases: &[],
                usage: &["tag find <tag> [<tag> ...]"],
                parser: parse_find,
            },
        ],
    }
}

fn command(command: TagCommand) -> CliCommand {
    CliCommand::Tags(command)
}

fn parse_list(args: &[String]) -> Result<CliCommand, CliError> {
    if !args.is_empty() {
        return Err(CliError::usage("tag list does not take any arguments"));
    }
    Ok(command(TagCommand::List))
}

fn parse_add(args: &[String]) -> Result<CliCommand, CliError> {
    let (name, rest) = parse_required_arg(args, "tag name")?;
    let mut color = None;
    let mut description = None;

    let mut idx = 0;
    while idx < rest.len() {
        match rest[idx].as_str() {
            "--color" => {
                idx += 1;
                color = Some(parse_color(&next_value(rest, &mut idx, "--color")?)?);
            }
            "--description" => {
                idx += 1;
                description = Some(next_value(rest, &mut idx, "--description")?);
            }
            flag => {
                return Err(CliError::usage(format!(
                    "Unknown flag for tag add: {}",
                    flag
                )));
            }
        }
    }

    Ok(command(TagCommand::Add {
        name,
        color,
        description,
    }))
}

fn parse_change(args: &[String]) -> Result<CliCommand, CliError> {
    let (name, rest) = parse_required_arg(args, "tag name")?;
    let mut update = TagChange::default();

    let mut idx = 0;
    while idx < rest.len() {
        match rest[idx].as_str() {
            "--name" => {
                if update.new_name.is_some() {
                    return Err(CliError::usage("Duplicate --name"));
                }
                idx += 1;
                update.new_name = Some(next_value(rest, &mut idx, "--name")?);
            }
            "--color" => {
                idx += 1;
                update.color = Some(parse_color(&next_value(rest, &mut idx, "--color")?)?);
            }
            "--description" => {
                idx += 1;
                update.description = Some(next_value(rest, &mut idx, "--description")?);
            }
            flag => {
                return Err(CliError::usage(format!(
                    "Unknown flag for tag change: {}",
                    flag
                )));
            }
        }
    }

    if update == TagChange::default() {
        return Err(CliError::usage(
            "tag change requires --name, --color, or --description",
        ));
    }

    Ok(command(TagCommand::Change { name, update }))
}

fn parse_delete(args: &[String]) -> Result<CliCommand, CliError> {
    let (name, rest) = parse_required_arg(args, "tag name")?;
    reject_extra(rest, "tag delete takes only <name>")?;
    Ok(command(TagCommand::Delete { name }))
}

fn parse_up(args: &[String]) -> Result<CliCommand, CliError> {
    let (name, rest) = parse_required_arg(args, "tag name")?;
    reject_extra(rest, "tag up takes only <name>")?;
    Ok(command(TagCommand::Up { name }))
}

fn parse_down(args: &[String]) -> Result<CliCommand, CliError> {
    let (name, rest) = parse_required_arg(args, "tag name")?;
    reject_extra(rest, "tag down takes only <name>")?;
    Ok(command(TagCommand::Down { name }))
}

fn parse_object_and_tag(args: &[String], usage: &str) -> Result<(String, String), CliError> {
    let (fqn, rest) = parse_required_arg(args, "object fqn")?;
    let (tag, rest) = parse_required_arg(rest, "tag name")?;
    reject_extra(rest, usage)?;
    Ok((fqn, tag))
}

fn parse_assign(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, tag) = parse_object_and_tag(args, "tag assign takes only <fqn> <tag>")?;
    Ok(command(TagCommand::Assign { fqn, tag }))
}

fn parse_unassign(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, tag) = parse_object_and_tag(args, "tag unassign takes only <fqn> <tag>")?;
    Ok(command(TagCommand::Unassign { fqn, tag }))
}

fn parse_toggle(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, rest) = parse_required_arg(args, "object fqn")?;
    let (raw, rest) = parse_required_arg(rest, "hotkey")?;
    reject_extra(rest, "tag toggle takes only <fqn> <hotkey>")?;
    let hotkey = match raw.parse::<u8>() {
        Ok(digit) if digit <= 9 => digit,
        _ => return Err(CliError::usage("hotkey must be a digit from 0 to 9")),
    };
    Ok(command(TagCommand::Toggle { fqn, hotkey }))
}

fn parse_show(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, rest) = parse_required_arg(args, "object fqn")?;
    reject_extra(rest, "tag show takes only <fqn>")?;
    Ok(command(TagCommand::Show { fqn }))
}

fn parse_find(args: &[String]) -> Result<CliCommand, CliError> {
    if args.is_empty() {
        return Err(CliError::usage("tag find requires at least one tag name"));
    }
    Ok(command(TagCommand::Find {
        tags: args.to_vec(),
    }))
}

fn parse_color(value: &str) -> Result<String, CliError> {
    normalize_hex_color(value)
        .ok_or_else(|| CliError::usage(format!("--color must be #RRGGBB, got '{}'", value)))
}

pub(crate) fn execute(
    store: &AnnotationStore,
    project: &str,
    command: TagCommand,
) -> Result<String, CliError> {
    let tags = store.tags();
    match command {
        TagCommand::List => {
            let summaries = tags.tag_summaries(project);
            if summaries.is_empty() {
                return Ok("No tags defined".to_string());
            }
            Ok(summaries
                .iter()
                .map(format_summary)
                .collect::<Vec<_>>()
                .join("\n"))
        }
        TagCommand::Add {
            name,
            color,
            description,
        } => tags
            .create_tag(project, &name, color.as_deref(), description.as_deref())
            .map(|tag| format!("Tag '{}' added with color {}", tag.name, tag.color))
            .ok_or_else(|| {
                CliError::failed(format!(
                    "Tag '{}' was not added: the name is blank or already taken",
                    name
                ))
            }),
        TagCommand::Change { name, update } => {
            if tags.update_tag(project, &name, update.into()) {
                Ok(format!("Tag '{}' changed", name))
            } else {
                Err(CliError::failed(format!(
                    "Tag '{}' was not changed: it does not exist or the new name is taken",
                    name
                )))
            }
        }
        TagCommand::Delete { name } => outcome(
            tags.remove_tag(project, &name),
            format!("Tag '{}' deleted", name),
            format!("Tag '{}' does not exist", name),
        ),
        TagCommand::Up { name } => outcome(
            tags.move_tag_up(project, &name),
            format!("Tag '{}' moved up", name),
            format!("Tag '{}' cannot move up", name),
        ),
        TagCommand::Down { name } => outcome(
            tags.move_tag_down(project, &name),
            format!("Tag '{}' moved down", name),
            format!("Tag '{}' cannot move down", name),
        ),
        TagCommand::Assign { fqn, tag } => outcome(
            tags.assign_tag(project, &fqn, &tag),
            format!("Tag '{}' assigned to {}", tag, fqn),
            format!(
                "Tag '{}' was not assigned to {}: unknown tag or already assigned",
                tag, fqn
            ),
        ),
        TagCommand::Unassign { fqn, tag } => outcome(
            tags.unassign_tag(project, &fqn, &tag),
            format!("Tag '{}' removed from {}", tag, fqn),
            format!("{} does not carry tag '{}'", fqn, tag),
        ),
        TagCommand::Toggle { fqn, hotkey } => match tags.toggle_tag_by_hotkey(project, &fqn, hotkey)
        {
            Some(HotkeyToggle::Assigned(tag)) => {
                Ok(format!("Tag '{}' assigned to {}", tag.name, fqn))
            }
            Some(HotkeyToggle::Unassigned(tag)) => {
                Ok(format!("Tag '{}' removed from {}", tag.name, fqn))
            }
            None => Err(CliError::failed(format!("No tag bound to hotkey {}", hotkey))),
        },
        TagCommand::Show { fqn } => {
            let assigned = tags.object_tags(project, &fqn);
            if assigned.is_empty() {
                return Ok(format!("{} has no tags", fqn));
            }
            let names: Vec<&str> = assigned.iter().map(|tag| tag.name.as_str()).collect();
            Ok(format!("{}: {}", fqn, names.join(", ")))
        }
        TagCommand::Find { tags: names } => {
            let found = tags.find_objects_by_tags(project, &names);
            if found.is_empty() {
                return Ok("No objects found".to_string());
            }
            Ok(found
                .iter()
                .map(|(fqn, matching)| {
                    let names: Vec<&str> = matching.iter().map(|tag| tag.name.as_str()).collect();
                    format!("{}: {}", fqn, names.join(", "))
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

fn outcome(done: bool, success: String, failure: String) -> Result<String, CliError> {
    if done {
        Ok(success)
    } else {
        Err(CliError::failed(failure))
    }
}

fn format_summary(summary: &TagSummary) -> String {
    let hotkey = summary
        .hotkey
        .map(|digit| digit.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "[{}] {} {} ({})",
        hotkey,
        summary.tag.name,
        summary.tag.color,
        plural(summary.object_count, "object")
    );
    if !summary.tag.description.is_empty() {
        line.push_str(" - ");
        line.push_str(&summary.tag.description);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn tag_command(parsed: CliCommand) -> TagCommand {
        match parsed {
            CliCommand::Tags(command) => command,
            other => panic!("Expected tag command, got {:?}", other),
        }
    }

    #[test]
    fn parse_add_requires_name() {
        let err = parse_add(&[]).unwrap_err();
        assert!(err.to_string().contains("Missing tag name"));
    }

    #[test]
    fn parse_add_normalizes_color() {
        let parsed = parse_add(&args(&["bug", "--color", "#ff0000", "--description", "Defect"]))
            .expect("parse add");
        assert_eq!(
            tag_command(parsed),
            TagCommand::Add {
                name: "bug".to_string(),
                color: Some("#FF0000".to_string()),
                description: Some("Defect".to_string()),
            }
        );
    }

    #[test]
    fn parse_add_rejects_bad_color() {
        let err = parse_add(&args(&["bug", "--color", "red"])).unwrap_err();
        assert!(err.to_string().contains("#RRGGBB"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn parse_change_requires_flag() {
        let err = parse_change(&args(&["bug"])).unwrap_err();
        assert!(
            err.to_string()
                .contains("requires --name, --color, or --description")
        );
    }

    #[test]
    fn parse_change_accepts_new_name() {
        let parsed = parse_change(&args(&["bug", "--name", "defect"])).expect("parse change");
        match tag_command(parsed) {
            TagCommand::Change { name, update } => {
                assert_eq!(name, "bug");
                assert_eq!(update.new_name.as_deref(), Some("defect"));
                assert_eq!(update.color, None);
            }
            other => panic!("Expected tag change command, got {:?}", other),
        }
    }

    #[test]
    fn parse_change_rejects_duplicate_name() {
        let err = parse_change(&args(&["bug", "--name", "a", "--name", "b"])).unwrap_err();
        assert!(err.to_string().contains("Duplicate --name"));
    }

    #[test]
    fn parse_delete_rejects_extra_args() {
        let err = parse_delete(&args(&["bug", "extra"])).unwrap_err();
        assert!(err.to_string().contains("takes only"));
    }

    #[test]
    fn parse_list_rejects_args() {
        let err = parse_list(&args(&["extra"])).unwrap_err();
        assert!(err.to_string().contains("does not take"));
    }

    #[test]
    fn parse_assign_requires_tag() {
        let err = parse_assign(&args(&["Catalog.Goods"])).unwrap_err();
        assert!(err.to_string().contains("Missing tag name"));
    }

    #[test]
    fn parse_toggle_rejects_two_digit_hotkey() {
        let err = parse_toggle(&args(&["Catalog.Goods", "10"])).unwrap_err();
        assert!(err.to_string().contains("0 to 9"));
        let parsed = parse_toggle(&args(&["Catalog.Goods", "0"])).expect("parse toggle");
        assert_eq!(
            tag_command(parsed),
            TagCommand::Toggle {
                fqn: "Catalog.Goods".to_string(),
                hotkey: 0,
            }
        );
    }

    #[test]
    fn parse_find_requires_tags() {
        let err = parse_find(&[]).unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn summary_line_shows_hotkey_and_count() {
        let summary = TagSummary {
            tag: crate::model::Tag::new("bug", Some("#FF0000"), Some("Defect")),
            hotkey: Some(1),
            object_count: 2,
        };
        assert_eq!(format_summary(&summary), "[1] bug #FF0000 (2 objects) - Defect");
    }
}
