//! Object storage for catalog images.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use neurocore_core::TenantId;

/// An image submitted alongside a catalog mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Extension taken from the file name; `jpg` when there is none.
    pub fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "jpg",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageStoreError {
    #[error("image upload rejected: {0}")]
    Rejected(String),
    #[error("image store unavailable: {0}")]
    Unavailable(String),
}

/// Object path for an item image: `inventory/{sku}_{millis}.{ext}`.
///
/// Characters outside `[A-Za-z0-9_-]` in the sku become `_`; an empty sku
/// becomes `no-sku`.
pub fn image_path(sku: &str, upload: &ImageUpload, now: DateTime<Utc>) -> String {
    let sku = if sku.is_empty() { "no-sku" } else { sku };
    let sanitized: String = sku
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!(
        "inventory/{sanitized}_{}.{}",
        now.timestamp_millis(),
        upload.extension()
    )
}

#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the object at `path` and return its public URL.
    async fn put(&self, tenant_id: TenantId, path: &str, upload: &ImageUpload) -> Result<String, ImageStoreError>;
}

/// In-memory bucket for tests/dev. URLs are `{base_url}/{tenant}/{path}`.
#[derive(Debug)]
pub struct InMemoryImageStore {
    base_url: String,
    max_bytes: usize,
    objects: RwLock<HashMap<(TenantId, String), Vec<u8>>>,
}

impl InMemoryImageStore {
    pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_bytes: Self::DEFAULT_MAX_BYTES,
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn contains(&self, tenant_id: TenantId, path: &str) -> bool {
        self.objects
            .read()
            .map(|objects| objects.contains_key(&(tenant_id, path.to_string())))
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(&self, tenant_id: TenantId, path: &str, upload: &ImageUpload) -> Result<String, ImageStoreError> {
        if upload.bytes.is_empty() {
            return Err(ImageStoreError::Rejected("empty file".to_string()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(ImageStoreError::Rejected(format!(
                "{} bytes exceeds the {} byte limit",
                upload.bytes.len(),
                self.max_bytes
            )));
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|_| ImageStoreError::Unavailable("lock poisoned".to_string()))?;
        objects.insert((tenant_id, path.to_string()), upload.bytes.clone());

        Ok(format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            tenant_id,
            path
        ))
    }
}
