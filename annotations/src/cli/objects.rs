// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Object lifecycle commands. They drive the same refactoring participant a
//! host uses when objects are renamed or deleted.

use crate::cli::parse_utils::{parse_required_arg, reject_extra};
use crate::cli::{CliCommand, CliError, CommandSpec, DomainSpec};
use crate::refactoring::RefactoringOutcome;
use crate::store::AnnotationStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectCommand {
    Rename { old_fqn: String, new_fqn: String },
    Delete { fqn: String },
}

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "object",
        aliases: &["o"],
        commands: vec![
            CommandSpec {
                name: "rename",
                aliases: &["mv"],
                usage: &["object rename <old fqn> <new fqn>"],
                parser: parse_rename,
            },
            CommandSpec {
                name: "delete",
                aliases: &["rm"],
                usage: &["object delete <fqn>"],
                parser: parse_delete,
            },
        ],
    }
}

fn parse_rename(args: &[String]) -> Result<CliCommand, CliError> {
    let (old_fqn, rest) = parse_required_arg(args, "old object fqn")?;
    let (new_fqn, rest) = parse_required_arg(rest, "new object fqn")?;
    reject_extra(rest, "object rename takes only <old fqn> <new fqn>")?;
    Ok(CliCommand::Objects(ObjectCommand::Rename { old_fqn, new_fqn }))
}

fn parse_delete(args: &[String]) -> Result<CliCommand, CliError> {
    let (fqn, rest) = parse_required_arg(args, "object fqn")?;
    reject_extra(rest, "object delete takes only <fqn>")?;
    Ok(CliCommand::Objects(ObjectCommand::Delete { fqn }))
}

pub(crate) fn execute(
    store: &AnnotationStore,
    project: &str,
    command: ObjectCommand,
) -> Result<String, CliError> {
    let participant = store.refactoring_participant();
    match command {
        ObjectCommand::Rename { old_fqn, new_fqn } => {
            let outcome = participant.object_renamed(project, &old_fqn, &new_fqn);
            report(
                outcome,
                &format!("Annotations of {} moved to {}", old_fqn, new_fqn),
                &format!("{} has no annotations to move", old_fqn),
            )
        }
        ObjectCommand::Delete { fqn } => {
            let outcome = participant.object_deleted(project, &fqn);
            report(
                outcome,
                &format!("Annotations of {} removed", fqn),
                &format!("{} has no annotations", fqn),
            )
        }
    }
}

fn report(outcome: RefactoringOutcome, success: &str, failure: &str) -> Result<String, CliError> {
    if !outcome.changed() {
        return Err(CliError::failed(failure));
    }
    let mut touched = Vec::new();
    if outcome.tags_updated {
        touched.push("tags");
    }
    if outcome.groups_updated {
        touched.push("groups");
    }
    Ok(format!("{} ({})", success, touched.join(", ")))
}
