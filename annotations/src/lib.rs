// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Tags and virtual-folder groups for the objects of a workspace's projects,
//! persisted as YAML beside each project and shared through an in-memory
//! cache with change notifications.

pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod events;
pub mod model;
pub mod refactoring;
pub mod repository;
pub mod service;
pub mod store;
pub mod util;
pub mod watcher;
pub mod workspace;

pub use config::AnnotationsConfig;
pub use events::{AnnotationEvent, AnnotationListener, ChangeBus, ListenerId};
pub use model::{Group, GroupHierarchy, Tag, TagCatalog, TagUpdate};
pub use refactoring::{RefactoringOutcome, RefactoringParticipant};
pub use service::{GroupService, HotkeyToggle, TagService, TagSummary};
pub use store::AnnotationStore;
pub use workspace::{FsWorkspace, Workspace};
