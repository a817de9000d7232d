// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Period compression bundles
//!
//! A retired period's files are rolled into one zip bundle. The bundle is
//! always built in a temporary file and verified (exact member set, CRC32 of
//! every extracted member) before it replaces anything; originals are deleted
//! only after verification passes. Appending to a retired period rebuilds the
//! bundle with the member extended, so the operation is atomic from the
//! caller's perspective: any failure leaves the previous bundle intact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;
use vigil_core::{ArchiveKind, Period};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::BundleError;
use crate::layout::{Layout, Location};
use crate::lock::PathLock;
use crate::writer::rollup_chunk;

/// Manages the `active -> retired` transition and all access to retired
/// periods.
#[derive(Clone, Debug)]
pub struct CompressionManager {
    layout: Layout,
    lock_timeout: Duration,
}

impl CompressionManager {
    pub fn new(layout: Layout, lock_timeout: Duration) -> Self {
        Self {
            layout,
            lock_timeout,
        }
    }

    /// Roll all plain files of a period into one verified bundle, then delete
    /// the originals. Verification failure discards the temp bundle and
    /// leaves every original untouched.
    pub fn compress_period(&self, kind: ArchiveKind, period: Period) -> Result<PathBuf, BundleError> {
        let (sources, bundle_path) = self.period_sources(kind, period)?;
        if sources.is_empty() {
            return Err(BundleError::VerifyFailed {
                bundle: bundle_path,
                reason: format!("no plain files for period {}", period),
            });
        }

        let _lock = self.lock(&bundle_path)?;
        let mut expected = BTreeMap::new();
        for (name, path) in &sources {
            let bytes = fs::read(path)?;
            expected.insert(name.clone(), bytes);
        }

        let tmp = temp_sibling(&bundle_path);
        let result = self
            .build_and_verify(&tmp, &expected)
            .and_then(|()| fs::rename(&tmp, &bundle_path).map_err(BundleError::Io));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        for (_, path) in &sources {
            fs::remove_file(path)?;
        }
        if kind == ArchiveKind::Request {
            // The emptied month directory goes too
            let _ = fs::remove_dir(self.layout.month_dir(period));
        }
        info!(kind = %kind, period = %period, bundle = %bundle_path.display(),
              members = expected.len(), "period retired");
        Ok(bundle_path)
    }

    /// Read one member of a bundle
    pub fn read_member(&self, bundle: &Path, member: &str) -> Result<String, BundleError> {
        let file = File::open(bundle)?;
        let mut archive = ZipArchive::new(file).map_err(|_| corrupt(bundle))?;
        let mut entry = match archive.by_name(member) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(BundleError::MemberMissing {
                    bundle: bundle.to_path_buf(),
                    member: member.to_string(),
                })
            }
            Err(_) => return Err(corrupt(bundle)),
        };
        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|_| corrupt(bundle))?;
        Ok(content)
    }

    /// List member names of a bundle
    pub fn list_members(&self, bundle: &Path) -> Result<Vec<String>, BundleError> {
        let file = File::open(bundle)?;
        let archive = ZipArchive::new(file).map_err(|_| corrupt(bundle))?;
        Ok(archive.file_names().map(String::from).collect())
    }

    /// Append raw text to an existing member of a retired bundle
    pub fn append_to_member(&self, bundle: &Path, member: &str, text: &str) -> Result<(), BundleError> {
        self.rewrite_member(bundle, member, |current| {
            let current = current.ok_or_else(|| BundleError::MemberMissing {
                bundle: bundle.to_path_buf(),
                member: member.to_string(),
            })?;
            Ok(format!("{}{}", current, text))
        })
    }

    /// Append one rollup entry to a retired rollup bundle, inserting the date
    /// header iff missing, same as the plain-file writer.
    pub fn append_rollup_to_member(
        &self,
        bundle: &Path,
        member: &str,
        date: NaiveDate,
        line: &str,
    ) -> Result<(), BundleError> {
        self.rewrite_member(bundle, member, |current| {
            let current = current.unwrap_or_default();
            Ok(format!("{}{}", current, rollup_chunk(&current, date, line)))
        })
    }

    /// Add a new member to a retired bundle (healing a file into an already
    /// retired period). The member must not exist yet.
    pub fn add_member(&self, bundle: &Path, member: &str, text: &str) -> Result<(), BundleError> {
        self.rewrite_member(bundle, member, |current| {
            if current.is_some() {
                return Err(BundleError::VerifyFailed {
                    bundle: bundle.to_path_buf(),
                    reason: format!("member {} already exists", member),
                });
            }
            Ok(text.to_string())
        })
    }

    /// Move a corrupt bundle aside so the next run does not trip over it.
    /// Never deletes.
    pub fn quarantine(&self, bundle: &Path) -> Result<PathBuf, BundleError> {
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let name = bundle
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle.zip".to_string());
        let aside = bundle.with_file_name(format!("{}.corrupt-{}", name, stamp));
        fs::rename(bundle, &aside)?;
        warn!(bundle = %bundle.display(), aside = %aside.display(), "corrupt bundle quarantined");
        Ok(aside)
    }

    /// Rebuild `bundle` with `member` replaced (or added) by the content the
    /// closure produces from the current content. Verified before rename; a
    /// bundle that cannot even be opened is quarantined.
    fn rewrite_member<F>(&self, bundle: &Path, member: &str, update: F) -> Result<(), BundleError>
    where
        F: FnOnce(Option<String>) -> Result<String, BundleError>,
    {
        let _lock = self.lock(bundle)?;

        let file = File::open(bundle)?;
        let mut archive = match ZipArchive::new(file) {
            Ok(archive) => archive,
            Err(_) => {
                self.quarantine(bundle)?;
                return Err(corrupt(bundle));
            }
        };

        let mut expected: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|_| corrupt(bundle))?;
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).map_err(|_| corrupt(bundle))?;
            expected.insert(entry.name().to_string(), bytes);
        }

        let current = expected.get(member).map(|b| String::from_utf8_lossy(b).into_owned());
        let updated = update(current)?;
        expected.insert(member.to_string(), updated.into_bytes());

        let tmp = temp_sibling(bundle);
        let result = self
            .build_and_verify(&tmp, &expected)
            .and_then(|()| fs::rename(&tmp, bundle).map_err(BundleError::Io));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    /// Write all members to a temp bundle, then verify it by re-opening:
    /// the member list must match exactly and every extracted member's CRC32
    /// must match the bytes we meant to store.
    fn build_and_verify(&self, tmp: &Path, members: &BTreeMap<String, Vec<u8>>) -> Result<(), BundleError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(File::create(tmp)?);
        for (name, bytes) in members {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(bytes)?;
        }
        writer.finish()?;
        verify_bundle(tmp, members)
    }

    /// Plain files belonging to a period, as (member name, path), plus the
    /// bundle path they retire into.
    fn period_sources(
        &self,
        kind: ArchiveKind,
        period: Period,
    ) -> Result<(Vec<(String, PathBuf)>, PathBuf), BundleError> {
        if kind.is_rollup() {
            let location = Location::rollup(kind, period);
            let plain = self.layout.plain_path(&location);
            let sources = if plain.is_file() {
                vec![(location.member_name(), plain)]
            } else {
                Vec::new()
            };
            Ok((sources, self.layout.bundle_path(&location)))
        } else {
            let mut sources = Vec::new();
            let mut bundle = None;
            for location in self.layout.plain_request_files()? {
                if location.period() == period {
                    bundle.get_or_insert_with(|| self.layout.bundle_path(&location));
                    sources.push((location.member_name(), self.layout.plain_path(&location)));
                }
            }
            let bundle = bundle.unwrap_or_else(|| {
                self.layout.bundle_path(&Location::Request {
                    period,
                    file_name: String::new(),
                })
            });
            Ok((sources, bundle))
        }
    }

    fn lock(&self, bundle: &Path) -> Result<PathLock, BundleError> {
        PathLock::acquire(&self.layout, bundle, self.lock_timeout).map_err(|e| match e {
            crate::error::WriteError::Io(io) => BundleError::Io(io),
            crate::error::WriteError::LockTimeout { path, waited } => {
                BundleError::LockTimeout { path, waited }
            }
            crate::error::WriteError::Bundle(inner) => inner,
        })
    }
}

/// Re-open a freshly written bundle and confirm it holds exactly the expected
/// members with matching content.
fn verify_bundle(path: &Path, expected: &BTreeMap<String, Vec<u8>>) -> Result<(), BundleError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| BundleError::VerifyFailed {
        bundle: path.to_path_buf(),
        reason: format!("re-open failed: {}", e),
    })?;

    let names: Vec<String> = archive.file_names().map(String::from).collect();
    if names.len() != expected.len() || names.iter().any(|n| !expected.contains_key(n)) {
        return Err(BundleError::VerifyFailed {
            bundle: path.to_path_buf(),
            reason: format!(
                "member list mismatch: got {:?}, expected {:?}",
                names,
                expected.keys().collect::<Vec<_>>()
            ),
        });
    }

    for (name, bytes) in expected {
        let mut entry = archive.by_name(name).map_err(|e| BundleError::VerifyFailed {
            bundle: path.to_path_buf(),
            reason: format!("member {}: {}", name, e),
        })?;
        let mut extracted = Vec::new();
        entry
            .read_to_end(&mut extracted)
            .map_err(|e| BundleError::VerifyFailed {
                bundle: path.to_path_buf(),
                reason: format!("member {} unreadable: {}", name, e),
            })?;
        if crc32fast::hash(&extracted) != crc32fast::hash(bytes) {
            return Err(BundleError::VerifyFailed {
                bundle: path.to_path_buf(),
                reason: format!("member {} CRC mismatch", name),
            });
        }
    }
    Ok(())
}

fn corrupt(bundle: &Path) -> BundleError {
    BundleError::Corrupt(bundle.to_path_buf())
}

fn temp_sibling(path: &Path) -> PathBuf {
    path.with_extension(format!("zip.tmp-{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
