// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-db - the SQLite query cache
//!
//! The database is never the source of truth; every row a write path creates
//! carries the archive path it came from, and the whole store is rebuildable
//! from the archive tree alone.

mod error;
mod schema;
mod store;

pub use error::DbError;
pub use store::{
    ActivityRow, InteractionRow, RequestRow, StatusRow, Store, TestimonyRow, Upsert, UserRow,
};
