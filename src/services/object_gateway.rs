//! Object storage gateway.
//!
//! Wraps an S3 client to mint time-limited, method-scoped presigned URLs so
//! file bytes flow directly between the client and the bucket, never through
//! this process. Presigning is pure computation against the signing key; the
//! only network calls here are the startup bucket check and object deletion.
//!
//! The region is pinned into the client explicitly. A client signed for the
//! wrong region fails with opaque signature mismatches at request time, not
//! at mint time, which is why [`ObjectGateway::validate`] probes the bucket
//! eagerly at startup instead of deferring to the first request.

use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The store could not be reached or answered with a transient fault.
    /// Retryable by the caller; the gateway itself never retries.
    #[error("object storage unreachable: {0}")]
    Unavailable(String),
    /// The store rejected our credentials. A configuration error, not
    /// retryable.
    #[error("object storage rejected credentials: {0}")]
    AuthFailed(String),
    /// The configured bucket does not exist in the configured region.
    #[error("bucket `{0}` not found")]
    BucketMissing(String),
    /// URL signing itself failed.
    #[error("presigning failed: {0}")]
    Presign(String),
}

/// Error codes S3 answers with when the request was signed with bad or
/// stale credentials.
const AUTH_ERROR_CODES: [&str; 5] = [
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
    "AuthorizationHeaderMalformed",
];

fn classify<E, R>(context: &str, err: &SdkError<E, R>) -> GatewayError
where
    E: ProvideErrorMetadata,
    SdkError<E, R>: std::fmt::Display,
{
    match err.code() {
        Some(code) if AUTH_ERROR_CODES.contains(&code) => {
            GatewayError::AuthFailed(format!("{context}: {code}"))
        }
        Some(code) => GatewayError::Unavailable(format!("{context}: {code}")),
        None => GatewayError::Unavailable(format!("{context}: {}", err)),
    }
}

/// Mints presigned URLs for a single bucket.
#[derive(Clone)]
pub struct ObjectGateway {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

impl ObjectGateway {
    pub fn new(client: Client, bucket: impl Into<String>, presign_expiry: Duration) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            presign_expiry,
        }
    }

    /// Build the gateway from application configuration.
    ///
    /// Supports both an explicit key pair and the ambient credential chain
    /// (instance role, environment). A custom endpoint switches the client
    /// to path-style addressing for S3-compatible stores like MinIO.
    /// Retries are disabled: a caller-visible failure is preferable to a
    /// silently doubled side effect.
    pub async fn from_config(cfg: &AppConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(cfg.aws_region.clone()))
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .timeout_config(
                aws_config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(10))
                    .build(),
            );

        if let (Some(access_key), Some(secret_key)) =
            (&cfg.aws_access_key_id, &cfg.aws_secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "we-upload-config",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &cfg.s3_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(
            Client::from_conf(builder.build()),
            cfg.s3_bucket.clone(),
            Duration::from_secs(cfg.presign_expiry_secs),
        )
    }

    /// Probe the configured bucket once, at startup.
    ///
    /// Fails fast on a missing bucket, rejected credentials, or an
    /// unreachable store instead of leaving the misconfiguration to surface
    /// as signature errors on the first real request.
    pub async fn validate(&self) -> Result<(), GatewayError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(ctx)) => {
                if ctx.err().is_not_found() {
                    return Err(GatewayError::BucketMissing(self.bucket.clone()));
                }
                let status = ctx.raw().status().as_u16();
                if status == 401 || status == 403 {
                    Err(GatewayError::AuthFailed(format!(
                        "HeadBucket on `{}` answered {}",
                        self.bucket, status
                    )))
                } else {
                    Err(GatewayError::Unavailable(format!(
                        "HeadBucket on `{}` answered {}",
                        self.bucket, status
                    )))
                }
            }
            Err(err) => Err(GatewayError::Unavailable(format!("HeadBucket: {err}"))),
        }
    }

    fn presign_config(&self) -> Result<PresigningConfig, GatewayError> {
        PresigningConfig::expires_in(self.presign_expiry)
            .map_err(|err| GatewayError::Presign(err.to_string()))
    }

    /// Mint a URL for a single PUT of `content_type` bytes at `storage_key`.
    ///
    /// The method and content type are part of the signature: the grant is
    /// not usable for GET, and not usable with a different declared type.
    pub async fn mint_upload_url(
        &self,
        storage_key: &str,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .content_type(content_type)
            .presigned(self.presign_config()?)
            .await
            .map_err(|err| GatewayError::Presign(err.to_string()))?;
        Ok(presigned.uri().to_string())
    }

    /// Mint a URL for a single GET of the object at `storage_key`.
    pub async fn mint_download_url(&self, storage_key: &str) -> Result<String, GatewayError> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .presigned(self.presign_config()?)
            .await
            .map_err(|err| GatewayError::Presign(err.to_string()))?;
        Ok(presigned.uri().to_string())
    }

    /// Delete the backing object. Called when a record is removed; the
    /// caller tolerates failure here (the object may never have been
    /// uploaded at all).
    pub async fn delete_object(&self, storage_key: &str) -> Result<(), GatewayError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .send()
            .await
            .map_err(|err| classify("DeleteObject", &err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A gateway over a statically-configured client. Presigning never
    /// touches the network, so these tests run offline.
    fn test_gateway(expiry_secs: u64) -> ObjectGateway {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test-key", "test-secret", None, None, "test"))
            .endpoint_url("http://localhost:9000")
            .force_path_style(true)
            .build();
        ObjectGateway::new(
            Client::from_conf(config),
            "test-bucket",
            Duration::from_secs(expiry_secs),
        )
    }

    #[tokio::test]
    async fn distinct_keys_produce_distinct_urls() {
        let gateway = test_gateway(3600);
        let a = gateway.mint_download_url("owner/one/a.txt").await.unwrap();
        let b = gateway.mint_download_url("owner/two/b.txt").await.unwrap();
        assert_ne!(a, b);
        assert!(a.contains("owner/one/a.txt"));
        assert!(b.contains("owner/two/b.txt"));
    }

    #[tokio::test]
    async fn upload_and_download_grants_differ() {
        let gateway = test_gateway(3600);
        let up = gateway
            .mint_upload_url("owner/one/a.txt", "text/plain")
            .await
            .unwrap();
        let down = gateway.mint_download_url("owner/one/a.txt").await.unwrap();
        // Same key, but the signatures cover different methods.
        assert_ne!(up, down);
    }

    #[tokio::test]
    async fn distinct_expiries_produce_distinct_urls() {
        let short = test_gateway(600);
        let long = test_gateway(3600);
        let a = short.mint_download_url("owner/one/a.txt").await.unwrap();
        let b = long.mint_download_url("owner/one/a.txt").await.unwrap();
        assert_ne!(a, b);
        assert!(a.contains("X-Amz-Expires=600"));
        assert!(b.contains("X-Amz-Expires=3600"));
    }

    #[tokio::test]
    async fn repeated_mints_are_fresh_grants() {
        let gateway = test_gateway(3600);
        let first = gateway.mint_download_url("owner/one/a.txt").await.unwrap();
        // Signing input includes the request timestamp at second granularity.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let second = gateway.mint_download_url("owner/one/a.txt").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn urls_are_signed() {
        let gateway = test_gateway(3600);
        let url = gateway.mint_download_url("owner/one/a.txt").await.unwrap();
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Date="));
    }
}
