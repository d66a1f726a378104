use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; built once at startup
/// and threaded into the token service and the storage gateway.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,

    /// Secret used to sign and verify access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    pub token_expiry_minutes: i64,

    /// Region the bucket lives in. Signing with the wrong region produces
    /// signature-mismatch errors at request time, so it is pinned into the
    /// client and checked against the bucket at startup.
    pub aws_region: String,
    pub s3_bucket: String,
    /// Custom endpoint for S3-compatible stores (MinIO). Enables
    /// path-style addressing when set.
    pub s3_endpoint: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    /// Lifetime of presigned upload/download URLs in seconds.
    pub presign_expiry_secs: u64,

    /// Seeded administrator, created at startup when absent.
    pub first_superuser: Option<String>,
    pub first_superuser_password: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "File sharing API with presigned S3 uploads")]
pub struct Args {
    /// Host to bind to (overrides WE_UPLOAD_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides WE_UPLOAD_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides WE_UPLOAD_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let cfg = Self::from_env_with(&args)?;
        Ok((cfg, args.migrate))
    }

    fn from_env_with(args: &Args) -> Result<Self> {
        let env_host = env::var("WE_UPLOAD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("WE_UPLOAD_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing WE_UPLOAD_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8000,
            Err(err) => return Err(err).context("reading WE_UPLOAD_PORT"),
        };
        let env_db = env::var("WE_UPLOAD_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/we_upload.db".into());

        let token_expiry_minutes = match env::var("WE_UPLOAD_TOKEN_EXPIRY_MINUTES") {
            Ok(value) => value.parse::<i64>().with_context(|| {
                format!("parsing WE_UPLOAD_TOKEN_EXPIRY_MINUTES value `{}`", value)
            })?,
            // 8 days, matching the original deployment's design point.
            Err(env::VarError::NotPresent) => 60 * 24 * 8,
            Err(err) => return Err(err).context("reading WE_UPLOAD_TOKEN_EXPIRY_MINUTES"),
        };

        let presign_expiry_secs = match env::var("WE_UPLOAD_PRESIGN_EXPIRY_SECS") {
            Ok(value) => value.parse::<u64>().with_context(|| {
                format!("parsing WE_UPLOAD_PRESIGN_EXPIRY_SECS value `{}`", value)
            })?,
            Err(env::VarError::NotPresent) => 3600,
            Err(err) => return Err(err).context("reading WE_UPLOAD_PRESIGN_EXPIRY_SECS"),
        };

        Ok(Self {
            host: args.host.clone().unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.clone().unwrap_or(env_db),
            jwt_secret: env::var("WE_UPLOAD_SECRET_KEY")
                .unwrap_or_else(|_| "supersecretkey".into()),
            token_expiry_minutes,
            aws_region: env::var("WE_UPLOAD_AWS_REGION").unwrap_or_else(|_| "ap-south-1".into()),
            s3_bucket: env::var("WE_UPLOAD_S3_BUCKET")
                .unwrap_or_else(|_| "we-upload-local".into()),
            s3_endpoint: env::var("WE_UPLOAD_S3_ENDPOINT").ok(),
            aws_access_key_id: env::var("WE_UPLOAD_AWS_ACCESS_KEY_ID").ok(),
            aws_secret_access_key: env::var("WE_UPLOAD_AWS_SECRET_ACCESS_KEY").ok(),
            presign_expiry_secs,
            first_superuser: env::var("WE_UPLOAD_FIRST_SUPERUSER").ok(),
            first_superuser_password: env::var("WE_UPLOAD_FIRST_SUPERUSER_PASSWORD").ok(),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
