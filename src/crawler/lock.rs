//! Per-site crawl lock
//!
//! A crawl of a host holds `<lock dir>/<host>.lock` for its whole run. The
//! file is created exclusively, so a second crawl of the same host fails
//! fast instead of racing the first.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::crawler::error::CrawlError;

/// Held lock; the file is removed on drop
#[derive(Debug)]
pub struct CrawlLock {
    path: PathBuf,
}

impl CrawlLock {
    /// Take the lock for `site` inside `dir`
    pub fn acquire(dir: &Path, site: &str) -> Result<Self, CrawlError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.lock", site));

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CrawlError::Locked { path });
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", chrono::Utc::now().to_rfc3339())?;

        debug!(path = %path.display(), "acquired crawl lock");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CrawlLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}
