//! Mock content prober for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::analyzer::{ContentProber, ProbeReport};

/// Returns a configurable [`ProbeReport`] and records probed paths.
#[derive(Debug, Clone, Default)]
pub struct MockProber {
    report: Arc<RwLock<ProbeReport>>,
    probed: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockProber {
    /// Create a prober that reports nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report returned for every subsequent probe.
    pub async fn set_report(&self, report: ProbeReport) {
        *self.report.write().await = report;
    }

    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.read().await.clone()
    }
}

#[async_trait]
impl ContentProber for MockProber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> ProbeReport {
        self.probed.write().await.push(path.to_path_buf());
        self.report.read().await.clone()
    }
}
