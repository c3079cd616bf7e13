use async_trait::async_trait;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoStoreError {
    #[error("duplicate")]
    Duplicate,
    #[error("not_found")]
    NotFound,
    #[error("other: {0}")]
    Other(String),
}

/// Content-addressed storage for dog photos. Keys are SHA-256 hashes of
/// the file bytes, so saves are naturally idempotent.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn save(&self, hash: &str, mime: &str, bytes: &[u8]) -> Result<(), PhotoStoreError>;
    async fn load(&self, hash: &str) -> Result<(Vec<u8>, String), PhotoStoreError>;
    async fn delete(&self, hash: &str) -> Result<(), PhotoStoreError>;
}

// ---------------- Filesystem implementation (default) ----------------

pub struct FsPhotoStore {
    root: PathBuf,
}

impl FsPhotoStore {
    pub fn new() -> Self {
        let mut root = std::env::var("WALKMATE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        root.push("photos");
        Self { root }
    }

    fn path_for(&self, hash: &str) -> PathBuf {
        // shard by leading byte to keep directories small
        self.root.join(&hash[0..2]).join(hash)
    }
}

impl Default for FsPhotoStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PhotoStore for FsPhotoStore {
    async fn save(&self, hash: &str, _mime: &str, bytes: &[u8]) -> Result<(), PhotoStoreError> {
        let path = self.path_for(hash);
        if path.exists() {
            return Err(PhotoStoreError::Duplicate);
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| PhotoStoreError::Other(e.to_string()))?;
        }
        std::fs::write(&path, bytes).map_err(|e| PhotoStoreError::Other(e.to_string()))
    }

    async fn load(&self, hash: &str) -> Result<(Vec<u8>, String), PhotoStoreError> {
        let bytes =
            std::fs::read(self.path_for(hash)).map_err(|_| PhotoStoreError::NotFound)?;
        let mime = infer::get(&bytes)
            .map(|t| t.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        Ok((bytes, mime))
    }

    async fn delete(&self, hash: &str) -> Result<(), PhotoStoreError> {
        // treat a missing file as already deleted
        let _ = std::fs::remove_file(self.path_for(hash));
        Ok(())
    }
}

// ---------------- S3 implementation (MinIO compatible) ----------------

pub struct S3PhotoStore {
    bucket: String,
    client: aws_sdk_s3::Client,
    prefix: String,
}

impl S3PhotoStore {
    pub async fn new() -> anyhow::Result<Self> {
        use aws_credential_types::provider::SharedCredentialsProvider;
        use aws_credential_types::Credentials;

        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "walkmate-photos".into());
        let endpoint = std::env::var("S3_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("S3_ENDPOINT must be set (MinIO / S3 endpoint)"))?;
        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into());
        let access = std::env::var("S3_ACCESS_KEY").unwrap_or_default();
        let secret = std::env::var("S3_SECRET_KEY").unwrap_or_default();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region))
            .endpoint_url(endpoint);
        if !access.is_empty() && !secret.is_empty() {
            let creds = Credentials::new(access, secret, None, None, "static");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(creds));
        }
        let conf = loader.load().await;
        // Path-style addressing: required for MinIO/local endpoints without wildcard DNS.
        let s3_conf = aws_sdk_s3::config::Builder::from(&conf)
            .force_path_style(true)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_conf);
        info!("initialized S3/MinIO photo store (path-style addressing)");

        // Ensure the bucket exists; create it on first boot.
        if client.head_bucket().bucket(&bucket).send().await.is_err() {
            match client.create_bucket().bucket(&bucket).send().await {
                Ok(_) => info!("created photo bucket '{bucket}'"),
                Err(e) => {
                    error!("create_bucket failed for '{bucket}': {e:?}");
                    return Err(anyhow::anyhow!("failed to ensure bucket '{bucket}': {e}"));
                }
            }
        }

        Ok(Self {
            bucket,
            client,
            prefix: "photos".into(),
        })
    }

    fn key_for(&self, hash: &str) -> String {
        format!("{}/{}/{}", self.prefix, &hash[0..2], hash)
    }
}

#[async_trait]
impl PhotoStore for S3PhotoStore {
    async fn save(&self, hash: &str, mime: &str, bytes: &[u8]) -> Result<(), PhotoStoreError> {
        use aws_sdk_s3::primitives::ByteStream;
        let key = self.key_for(hash);
        // HEAD first to detect duplicate uploads
        if self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .is_ok()
        {
            return Err(PhotoStoreError::Duplicate);
        }
        let put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(mime);
        if let Err(e) = put.send().await {
            error!(
                "put_object failed hash={hash} key={key} bucket={}: {e:?}",
                self.bucket
            );
            let hint = if e.to_string().contains("AccessDenied") {
                " (check S3_ACCESS_KEY/S3_SECRET_KEY permissions)"
            } else {
                ""
            };
            return Err(PhotoStoreError::Other(format!("{e}{hint}")));
        }
        Ok(())
    }

    async fn load(&self, hash: &str) -> Result<(Vec<u8>, String), PhotoStoreError> {
        let key = self.key_for(hash);
        let obj = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|_| PhotoStoreError::NotFound)?;
        let data = obj
            .body
            .collect()
            .await
            .map_err(|e| PhotoStoreError::Other(e.to_string()))?;
        // ContentType may be absent; sniff from the bytes instead
        let bytes = Vec::from(data.into_bytes().as_ref());
        let mime = infer::get(&bytes)
            .map(|t| t.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        Ok((bytes, mime))
    }

    async fn delete(&self, hash: &str) -> Result<(), PhotoStoreError> {
        let key = self.key_for(hash);
        // best-effort delete
        let _ = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;
        Ok(())
    }
}

/// Pick a backend from the environment: S3 when S3_ENDPOINT is set,
/// local filesystem otherwise. Misconfigured S3 fails the boot.
pub async fn build_photo_store() -> Arc<dyn PhotoStore> {
    if std::env::var("S3_ENDPOINT").is_ok() {
        match S3PhotoStore::new().await {
            Ok(store) => Arc::new(store),
            Err(e) => panic!("Failed to initialize S3 photo store: {e}"),
        }
    } else {
        warn!("S3_ENDPOINT not set, storing photos on the local filesystem");
        Arc::new(FsPhotoStore::new())
    }
}
