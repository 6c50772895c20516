use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::CatalogProvider;
use crate::error::{RetrievalError, RetrievalResult};
use crate::models::ItemMetadata;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const SYNTHETIC_PREFIX: &str = "SYNTH/img_";

/// Filesystem-backed catalog for development.
///
/// Samples image files from `root_dir`; when the directory is missing or
/// empty, falls back to synthetic `SYNTH/img_NNNN.jpg` ids so the pipeline
/// works without any data on disk. Metadata is derived deterministically from
/// the item path.
pub struct FsCatalog {
    root_dir: PathBuf,
    synthetic_size: usize,
}

impl FsCatalog {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            synthetic_size: 200,
        }
    }

    pub fn with_synthetic_size(mut self, synthetic_size: usize) -> Self {
        self.synthetic_size = synthetic_size;
        self
    }

    fn synthetic_paths(&self, limit: usize) -> Vec<String> {
        (0..limit.min(self.synthetic_size))
            .map(|i| format!("{}{:04}.jpg", SYNTHETIC_PREFIX, i))
            .collect()
    }

    /// Whether `id` is a synthetic id this catalog would itself hand out.
    fn recognizes_synthetic(&self, id: &str) -> bool {
        id.strip_prefix(SYNTHETIC_PREFIX)
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .and_then(|n| n.parse::<usize>().ok())
            .is_some_and(|n| n < self.synthetic_size)
    }
}

#[async_trait]
impl CatalogProvider for FsCatalog {
    async fn sample_paths(&self, limit: usize) -> RetrievalResult<Vec<String>> {
        let mut paths = Vec::new();

        if let Ok(mut entries) = tokio::fs::read_dir(&self.root_dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                let is_image = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        IMAGE_EXTENSIONS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    });
                if is_image {
                    paths.push(path.to_string_lossy().into_owned());
                }
            }
        }

        // read_dir order is platform-dependent; sort so sampling is stable
        paths.sort();
        paths.truncate(limit);

        if paths.is_empty() {
            paths = self.synthetic_paths(limit);
        }

        Ok(paths)
    }

    async fn get_metadata(&self, id: &str) -> RetrievalResult<ItemMetadata> {
        if !self.recognizes_synthetic(id) {
            let exists = tokio::fs::try_exists(id).await.unwrap_or(false);
            if !exists {
                return Err(RetrievalError::NotFound(id.to_string()));
            }
        }

        let basename = Path::new(id)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.to_string());

        let color = if id.to_lowercase().contains("black") {
            "black"
        } else {
            "grey"
        };
        let source = if stable_hash(id) % 2 == 0 {
            "online"
        } else {
            "store"
        };

        Ok(ItemMetadata {
            title: Some(format!("Item {}", basename)),
            brand: Some("DemoBrand".to_string()),
            color: Some(color.to_string()),
            source: Some(source.to_string()),
            url: None,
        })
    }
}

/// Stable 64-bit hash of a string (first 8 bytes of its SHA-256 digest).
///
/// `std::hash` output may change between releases; this must not, because
/// source assignment has to be reproducible across builds.
fn stable_hash(value: &str) -> u64 {
    let digest = Sha256::digest(value.as_bytes());
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}
