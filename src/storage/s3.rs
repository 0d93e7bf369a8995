//! S3-compatible storage (Supabase storage exposes the S3 protocol).

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{validate_key, Storage, StorageError};
use crate::config::S3Config;

pub struct S3Storage {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3Storage {
    pub fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "helpdesk-env",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            // Supabase only supports path-style addressing
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::S3(DisplayErrorContext(&e).to_string()))?;

        tracing::info!(bucket = %self.bucket, key, size, "Uploaded object");
        Ok(self.object_url(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> S3Config {
        S3Config {
            endpoint: "https://proj.supabase.co/storage/v1/s3".to_string(),
            region: "eu-west-1".to_string(),
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: "resources".to_string(),
            public_url: "https://proj.supabase.co/storage/v1/object/public/resources".to_string(),
        }
    }

    #[tokio::test]
    async fn test_object_url_uses_public_base() {
        let storage = S3Storage::new(&config());
        assert_eq!(
            storage.object_url("resources/r1/a.pdf"),
            "https://proj.supabase.co/storage/v1/object/public/resources/resources/r1/a.pdf"
        );
        assert_eq!(storage.backend_name(), "s3");
    }

    #[tokio::test]
    async fn test_rejects_invalid_key_before_network() {
        let storage = S3Storage::new(&config());
        let err = storage
            .put("../x", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
