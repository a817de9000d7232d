// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-core - domain records, natural keys, periods, clock, configuration

mod cancel;
mod clock;
mod config;
mod period;
mod record;

pub use cancel::CancelToken;
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use period::{ArchiveKind, Period};
pub use record::{
    minute, Creation, Interaction, NaturalKey, Record, RecordKind, Registration, RequestId,
    StatusChange, Testimony, STATUS_REMOVED, TIMESTAMP_FORMAT,
};
