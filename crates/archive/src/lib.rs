// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-archive - the append-only text archive tree
//!
//! Everything that touches the archive directory lives here: canonical path
//! layout, path-scoped advisory locks, the atomic writer, the transparent
//! reader, period compression bundles, and the text renderer/parser pair.

mod bundle;
mod error;
mod layout;
mod lock;
mod parse;
mod reader;
mod render;
mod writer;

pub use bundle::CompressionManager;
pub use error::{BundleError, ParseError, ReadError, WriteError};
pub use layout::{Layout, Location};
pub use lock::PathLock;
pub use parse::{
    parse_request_file, parse_rollup_file, Activity, DateSection, RequestFile, RollupEntry,
    RollupFile,
};
pub use reader::{ArchiveReader, Resolved};
pub use render::{
    activity_line, date_header, interaction_line, render_request_file, rollup_interaction_line,
    rollup_registration_line, rollup_status_line, status_line, testimony_line,
};
pub use writer::ArchiveWriter;
