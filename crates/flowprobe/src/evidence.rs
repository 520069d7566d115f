//! Screenshot evidence keyed by scenario and step.
//!
//! Layout: `<root>/<scenario>/<step>.png`. Files are written once; a second
//! capture for the same pair is an error. Retried attempts write beside the
//! original as `<step>.retry<N>.png`.

use crate::driver::PageDriver;
use crate::result::{FlowError, FlowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// One stored screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Scenario id as given
    pub scenario: String,
    /// Step id as given
    pub step: String,
    /// 1-based attempt the capture belongs to
    pub attempt: u32,
    /// File written
    pub path: PathBuf,
    /// PNG size
    pub bytes: usize,
    /// Capture time
    pub captured_at: DateTime<Utc>,
}

/// Filesystem-safe form of an identifier
///
/// Keeps ASCII letters, digits, `-`, `_` and `.`; anything else becomes `_`.
/// Leading dots are dropped so ids cannot escape the evidence root.
#[must_use]
pub fn sanitize(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write-once evidence tree
#[derive(Debug)]
pub struct EvidenceStore {
    root: PathBuf,
    records: Mutex<Vec<EvidenceRecord>>,
}

impl EvidenceStore {
    /// Store rooted at `root`; nothing is created until the first capture
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Evidence root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a capture for this key lands
    #[must_use]
    pub fn path_for(&self, scenario: &str, step: &str, attempt: u32) -> PathBuf {
        let step = sanitize(step);
        let file = match attempt {
            0 | 1 => format!("{step}.png"),
            n => format!("{step}.retry{}.png", n - 1),
        };
        self.root.join(sanitize(scenario)).join(file)
    }

    /// Store `png` for the key; fails if the file already exists
    pub fn write(&self, scenario: &str, step: &str, attempt: u32, png: &[u8]) -> FlowResult<EvidenceRecord> {
        let path = self.path_for(scenario, step, attempt);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(FlowError::EvidenceExists { path });
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(png)?;

        let record = EvidenceRecord {
            scenario: scenario.to_string(),
            step: step.to_string(),
            attempt: attempt.max(1),
            path,
            bytes: png.len(),
            captured_at: Utc::now(),
        };
        info!(
            scenario,
            step,
            attempt = record.attempt,
            path = %record.path.display(),
            bytes = record.bytes,
            "evidence captured"
        );
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(record)
    }

    /// Full-page screenshot of the driver's page, stored under the key
    pub async fn capture(
        &self,
        driver: &dyn PageDriver,
        scenario: &str,
        step: &str,
        attempt: u32,
    ) -> FlowResult<EvidenceRecord> {
        let path = self.path_for(scenario, step, attempt);
        if path.exists() {
            return Err(FlowError::EvidenceExists { path });
        }
        let png = driver.screenshot_full_page().await.map_err(|e| match e {
            FlowError::Screenshot { .. } => e,
            other => FlowError::Screenshot {
                message: other.to_string(),
            },
        })?;
        self.write(scenario, step, attempt, &png)
    }

    /// Everything captured so far, in capture order
    #[must_use]
    pub fn records(&self) -> Vec<EvidenceRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captures belonging to one scenario
    #[must_use]
    pub fn records_for(&self, scenario: &str) -> Vec<EvidenceRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.scenario == scenario)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::FakeDriver;

    mod sanitize_tests {
        use super::*;

        #[test]
        fn test_keeps_safe_ids() {
            assert_eq!(sanitize("TC_FP_002"), "TC_FP_002");
            assert_eq!(sanitize("01-login-page"), "01-login-page");
        }

        #[test]
        fn test_replaces_unsafe_characters() {
            assert_eq!(sanitize("a/b c"), "a_b_c");
            assert_eq!(sanitize("../../etc"), "_.._etc");
            assert_eq!(sanitize(""), "_");
        }
    }

    mod store_tests {
        use super::*;

        #[test]
        fn test_layout_and_retry_suffix() {
            let store = EvidenceStore::new("/tmp/ev");
            assert_eq!(
                store.path_for("TC001", "01-form", 1),
                PathBuf::from("/tmp/ev/TC001/01-form.png")
            );
            assert_eq!(
                store.path_for("TC001", "01-form", 3),
                PathBuf::from("/tmp/ev/TC001/01-form.retry2.png")
            );
        }

        #[test]
        fn test_write_once() {
            let dir = tempfile::tempdir().unwrap();
            let store = EvidenceStore::new(dir.path());
            let first = store.write("TC001", "01-form", 1, b"png").unwrap();
            assert_eq!(fs::read(&first.path).unwrap(), b"png");

            let err = store.write("TC001", "01-form", 1, b"other").unwrap_err();
            assert!(matches!(err, FlowError::EvidenceExists { .. }));
            assert_eq!(fs::read(&first.path).unwrap(), b"png");

            let retry = store.write("TC001", "01-form", 2, b"again").unwrap();
            assert!(retry.path.ends_with("01-form.retry1.png"));
            assert_eq!(store.records().len(), 2);
            assert_eq!(store.records_for("TC001").len(), 2);
            assert!(store.records_for("TC002").is_empty());
        }

        #[tokio::test]
        async fn test_capture_from_driver() {
            let dir = tempfile::tempdir().unwrap();
            let store = EvidenceStore::new(dir.path());
            let driver = FakeDriver::new();
            let record = store.capture(&driver, "TC_FP_002", "01-login-page", 1).await.unwrap();
            let bytes = fs::read(&record.path).unwrap();
            assert_eq!(&bytes[1..4], b"PNG");
            assert_eq!(record.bytes, bytes.len());

            let again = store.capture(&driver, "TC_FP_002", "01-login-page", 1).await;
            assert!(matches!(again, Err(FlowError::EvidenceExists { .. })));
        }
    }
}
