//! Shared helpers for CLI specs

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway project: an archive root and a database path under one tempdir
pub struct Project {
    temp: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn archive_root(&self) -> PathBuf {
        self.temp.path().join("archive")
    }

    pub fn db_path(&self) -> PathBuf {
        self.temp.path().join("cache.db")
    }

    /// Write a file under the archive root, creating parent directories
    pub fn archive_file(&self, rel: &str, content: &str) {
        let path = self.archive_root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn read_archive_file(&self, rel: &str) -> String {
        fs::read_to_string(self.archive_root().join(rel)).unwrap()
    }

    pub fn archive_path(&self, rel: &str) -> PathBuf {
        self.archive_root().join(rel)
    }

    /// The vigil binary pointed at this project
    pub fn vigil(&self) -> Command {
        let mut cmd = Command::cargo_bin("vigil").unwrap();
        cmd.arg("--archive-root")
            .arg(self.archive_root())
            .arg("--db")
            .arg(self.db_path());
        cmd
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

/// A complete request file: creation by alice, prayer marks by bob and carol
pub const REQUEST_ONE: &str = "\
Request #1
From: alice
Date: 2024-06-01 06:55

Please pray for my exams.

Activity:
2024-06-01 07:10 - bob prayed for this request
2024-06-01 07:15 - carol prayed for this request
";
