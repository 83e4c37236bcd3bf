//! Shared helpers for integration tests

use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
#[allow(dead_code)]
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Builder for an on-disk BIDS dataset
pub struct DatasetBuilder {
    dir: TempDir,
}

#[allow(dead_code)]
impl DatasetBuilder {
    pub fn new() -> Self {
        let builder = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        builder.file(
            "dataset_description.json",
            r#"{"Name": "test dataset", "BIDSVersion": "1.9.0"}"#,
        )
    }

    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().expect("relative path has a parent")).expect("create dirs");
        fs::write(path, content).expect("write file");
        self
    }

    /// An empty NIfTI plus its JSON sidecar
    pub fn image(self, rel: &str, sidecar: serde_json::Value) -> Self {
        let json = rel.replace(".nii.gz", ".json");
        self.file(rel, "").file(&json, &sidecar.to_string())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn into_dir(self) -> TempDir {
        self.dir
    }
}
