// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention: retiring old periods into verified zip bundles
//!
//! A period is eligible once its last calendar day is older than the cutoff.
//! The current period is never eligible, so active files are never pulled out
//! from under a writer. Bundling is per period and failures are isolated; one
//! bad month never blocks the rest.

use chrono::Days;
use serde::Serialize;
use tracing::info;
use vigil_archive::{CompressionManager, Layout};
use vigil_core::{ArchiveKind, CancelToken, Clock, EngineConfig};

use crate::error::EngineError;
use crate::report::FailureEntry;

/// Outcome of one retention run
#[derive(Clone, Debug, Default, Serialize)]
pub struct CompressionReport {
    /// Periods retired (or, in a dry run, eligible), as `<dir>/<label>`
    pub compressed: Vec<String>,
    pub failures: Vec<FailureEntry>,
    pub dry_run: bool,
}

impl std::fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.dry_run { "eligible" } else { "compressed" };
        writeln!(
            f,
            "{} periods {}, {} failed",
            self.compressed.len(),
            verb,
            self.failures.len()
        )?;
        for period in &self.compressed {
            writeln!(f, "  {}", period)?;
        }
        for failure in &self.failures {
            writeln!(f, "  failed {}: {}", failure.path, failure.error)?;
        }
        Ok(())
    }
}

/// Retires archive periods past the retention window
pub struct Retention<C: Clock> {
    layout: Layout,
    bundles: CompressionManager,
    clock: C,
    dry_run: bool,
    token: CancelToken,
}

impl<C: Clock> Retention<C> {
    pub fn new(config: &EngineConfig, clock: C) -> Self {
        let layout = Layout::new(&config.archive_root);
        Self {
            bundles: CompressionManager::new(layout.clone(), config.lock_timeout),
            layout,
            clock,
            dry_run: false,
            token: CancelToken::new(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = token;
        self
    }

    /// Bundle every active period whose last day is more than
    /// `older_than_days` days in the past
    pub fn compress(&self, older_than_days: u32) -> Result<CompressionReport, EngineError> {
        let mut report = CompressionReport {
            dry_run: self.dry_run,
            ..CompressionReport::default()
        };
        let cutoff = self
            .clock
            .now()
            .date()
            .checked_sub_days(Days::new(u64::from(older_than_days)))
            .unwrap_or(chrono::NaiveDate::MIN);

        for kind in ArchiveKind::ALL {
            for period in self.layout.active_periods(kind)? {
                if self.token.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                if period.last_day() >= cutoff {
                    continue;
                }
                let label = format!("{}/{}", kind.dir_name(), period.label());
                if self.dry_run {
                    report.compressed.push(label);
                    continue;
                }
                match self.bundles.compress_period(kind, period) {
                    Ok(bundle) => {
                        info!(bundle = %bundle.display(), "period retired");
                        report.compressed.push(label);
                    }
                    Err(e) => report.failures.push(FailureEntry::new(label, e)),
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "compress_tests.rs"]
mod tests;
