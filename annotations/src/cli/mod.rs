// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Command line surface over an [`AnnotationStore`]
//!
//! Commands are grouped into domains (`tag`, `group`, `object`). Domains and
//! commands resolve case-insensitively and by unambiguous prefix.

pub mod groups;
pub mod objects;
pub(crate) mod parse_utils;
pub mod tags;

use crate::store::AnnotationStore;
use groups::GroupCommand;
use objects::ObjectCommand;
use std::collections::BTreeSet;
use std::fmt;
use tags::TagCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    Usage,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CliError {
    kind: CliErrorKind,
    message: String,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Usage,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Failed,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> CliErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind {
            CliErrorKind::Usage => 2,
            CliErrorKind::Failed => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Tags(TagCommand),
    Groups(GroupCommand),
    Objects(ObjectCommand),
}

/// A domain or command word together with its shorthands.
trait Keyword {
    fn name(&self) -> &'static str;
    fn aliases(&self) -> &'static [&'static str];

    fn spellings(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name()).chain(self.aliases().iter().copied())
    }
}

/// Pick the keyword spelled `token`: an exact name or alias wins, otherwise
/// the only keyword with a spelling that starts with `token`.
fn lookup<'a, K: Keyword>(token: &str, keywords: &'a [K], kind: &str) -> Result<&'a K, CliError> {
    let token = token.to_ascii_lowercase();
    if let Some(exact) = keywords
        .iter()
        .find(|keyword| keyword.spellings().any(|word| word.eq_ignore_ascii_case(&token)))
    {
        return Ok(exact);
    }
    let candidates: Vec<&K> = keywords
        .iter()
        .filter(|keyword| {
            keyword
                .spellings()
                .any(|word| word.to_ascii_lowercase().starts_with(&token))
        })
        .collect();
    match candidates.as_slice() {
        [only] => Ok(*only),
        [] => Err(CliError::usage(format!("Unknown {} '{}'", kind, token))),
        several => {
            let mut names: Vec<&str> = several.iter().map(|keyword| keyword.name()).collect();
            names.sort_unstable();
            Err(CliError::usage(format!(
                "Ambiguous {} prefix '{}': {}",
                kind,
                token,
                names.join(", ")
            )))
        }
    }
}

/// Every spelling must be unique (ignoring case) among `keywords`.
fn ensure_unique<K: Keyword>(keywords: &[K], scope: &str) -> Result<(), CliError> {
    let mut taken = BTreeSet::new();
    for keyword in keywords {
        for word in keyword.spellings() {
            if !taken.insert(word.to_ascii_lowercase()) {
                return Err(CliError::usage(format!(
                    "'{}' is used twice among {}",
                    word, scope
                )));
            }
        }
    }
    Ok(())
}

#[derive(Debug)]
pub struct DomainSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub commands: Vec<CommandSpec>,
}

impl Keyword for DomainSpec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }
}

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static [&'static str],
    pub parser: fn(&[String]) -> Result<CliCommand, CliError>,
}

impl Keyword for CommandSpec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }
}

/// The `domain command [args]` grammar of the binary.
#[derive(Debug)]
pub struct CliRegistry {
    domains: Vec<DomainSpec>,
}

impl CliRegistry {
    /// Fails when a name or alias is spelled twice, among domains or among
    /// the commands of one domain.
    pub fn new(domains: Vec<DomainSpec>) -> Result<Self, CliError> {
        ensure_unique(&domains, "domains")?;
        for domain in &domains {
            ensure_unique(&domain.commands, &format!("'{}' commands", domain.name))?;
        }
        Ok(Self { domains })
    }

    pub fn resolve_command(&self, tokens: &[String]) -> Result<CliCommand, CliError> {
        let Some((domain_token, rest)) = tokens.split_first() else {
            return Err(CliError::usage("Missing command domain"));
        };
        let domain = lookup(domain_token, &self.domains, "domain")?;
        let Some((command_token, args)) = rest.split_first() else {
            return Err(CliError::usage(format!(
                "Missing command for domain '{}'",
                domain.name
            )));
        };
        let command = lookup(command_token, &domain.commands, "command")?;
        (command.parser)(args)
    }

    fn describe(&self, out: &mut String) {
        for domain in &self.domains {
            push_line(out, &format!("  {}{}", domain.name, format_aliases(domain.aliases)));
            for command in &domain.commands {
                push_line(
                    out,
                    &format!("    {}{}", command.name, format_aliases(command.aliases)),
                );
                for usage in command.usage {
                    push_line(out, &format!("      {}", usage));
                }
            }
        }
    }
}

pub fn build_registry() -> Result<CliRegistry, CliError> {
    CliRegistry::new(vec![tags::domain(), groups::domain(), objects::domain()])
}

pub fn help_text() -> String {
    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(err) => {
            return format!("Failed to build CLI registry: {}", err);
        }
    };

    let mut out = String::new();
    push_line(&mut out, "Usage:");
    push_line(
        &mut out,
        "  annotations [-C <workspace>] -P <project> <domain> <command> [args]",
    );
    push_line(&mut out, "  annotations help");
    push_line(&mut out, "");
    push_line(&mut out, "Options:");
    push_line(&mut out, "  -C <workspace>  Set the workspace root (default: .).");
    push_line(&mut out, "  -P <project>    Project whose annotations are edited.");
    push_line(&mut out, "  -h, --help      Show this help.");
    push_line(&mut out, "");
    push_line(&mut out, "Domains and commands:");
    registry.describe(&mut out);
    push_line(&mut out, "");
    push_line(&mut out, "Notes:");
    push_line(
        &mut out,
        "  Domains and commands are case-insensitive and accept unambiguous prefixes.",
    );
    push_line(
        &mut out,
        "  Exit code is 0 on success, 1 when the store refuses a change, 2 on usage errors.",
    );
    out
}

/// Run one command against `project` and return the text to print.
pub fn execute(
    store: &AnnotationStore,
    project: &str,
    command: CliCommand,
) -> Result<String, CliError> {
    if store.workspace().project_dir(project).is_none() {
        return Err(CliError::failed(format!("Unknown project '{}'", project)));
    }
    match command {
        CliCommand::Tags(command) => tags::execute(store, project, command),
        CliCommand::Groups(command) => groups::execute(store, project, command),
        CliCommand::Objects(command) => objects::execute(store, project, command),
    }
}

pub fn run_cli(store: &AnnotationStore, project: &str, tokens: &[String]) -> i32 {
    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{}", err);
            return err.exit_code();
        }
    };

    let command = match registry.resolve_command(tokens) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{}", err);
            return err.exit_code();
        }
    };

    match execute(store, project, command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn format_aliases(aliases: &[&str]) -> String {
    if aliases.is_empty() {
        String::new()
    } else {
        format!(" (aliases: {})", aliases.join(", "))
    }
}
