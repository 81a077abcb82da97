use std::time::Duration;

use framelink_pipeline::PollConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development,
/// except the DashScope API key, which must be set before any request
/// that reaches the remote service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `1800`).
    /// Sequence runs legitimately take many minutes end to end.
    pub request_timeout_secs: u64,
    /// Public base URL used to build file access URLs for the remote
    /// service and for API responses (default: `http://localhost:8000`).
    pub server_url: String,
    /// Directory holding transient uploaded images.
    pub uploads_dir: String,
    /// Directory holding segment downloads and merged outputs.
    pub outputs_dir: String,
    /// DashScope API key; empty means unconfigured.
    pub dashscope_api_key: String,
    /// DashScope API root.
    pub dashscope_base_url: String,
    /// Generation model applied to every job.
    pub model: String,
    /// Output resolution applied to every job.
    pub resolution: String,
    /// Prompt applied when the caller supplies none.
    pub default_prompt: String,
    /// Number of images a sequence request must carry.
    pub sequence_image_count: usize,
    /// Seconds between task status checks.
    pub poll_interval_secs: u64,
    /// Status checks per job before it is treated as timed out.
    pub poll_max_attempts: u32,
    /// Ceiling on one segment download, in seconds.
    pub download_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                                   |
    /// |-------------------------|-------------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                                 |
    /// | `PORT`                  | `8000`                                    |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`                   |
    /// | `REQUEST_TIMEOUT_SECS`  | `1800`                                    |
    /// | `SERVER_URL`            | `http://localhost:8000`                   |
    /// | `UPLOADS_DIR`           | `uploads`                                 |
    /// | `OUTPUTS_DIR`           | `outputs`                                 |
    /// | `DASHSCOPE_API_KEY`     | *(empty)*                                 |
    /// | `DASHSCOPE_BASE_URL`    | `https://dashscope.aliyuncs.com/api/v1`   |
    /// | `MODEL`                 | `wan2.2-kf2v-flash`                       |
    /// | `RESOLUTION`            | `720P`                                    |
    /// | `DEFAULT_PROMPT`        | built-in transition prompt                |
    /// | `SEQUENCE_IMAGE_COUNT`  | `6`                                       |
    /// | `POLL_INTERVAL_SECS`    | `2`                                       |
    /// | `POLL_MAX_ATTEMPTS`     | `180`                                     |
    /// | `DOWNLOAD_TIMEOUT_SECS` | `300`                                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "1800".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let server_url =
            std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let uploads_dir = std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into());
        let outputs_dir = std::env::var("OUTPUTS_DIR").unwrap_or_else(|_| "outputs".into());

        let dashscope_api_key = std::env::var("DASHSCOPE_API_KEY").unwrap_or_default();
        let dashscope_base_url = std::env::var("DASHSCOPE_BASE_URL")
            .unwrap_or_else(|_| "https://dashscope.aliyuncs.com/api/v1".into());

        let model = std::env::var("MODEL").unwrap_or_else(|_| "wan2.2-kf2v-flash".into());
        let resolution = std::env::var("RESOLUTION").unwrap_or_else(|_| "720P".into());

        let default_prompt = std::env::var("DEFAULT_PROMPT").unwrap_or_else(|_| {
            "Smooth transition of the same subject across scenes, consistent facial \
             features, natural background changes, realistic lighting, rich color, \
             high quality video."
                .into()
        });

        let sequence_image_count: usize = std::env::var("SEQUENCE_IMAGE_COUNT")
            .unwrap_or_else(|_| "6".into())
            .parse()
            .expect("SEQUENCE_IMAGE_COUNT must be a valid usize");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let poll_max_attempts: u32 = std::env::var("POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "180".into())
            .parse()
            .expect("POLL_MAX_ATTEMPTS must be a valid u32");

        let download_timeout_secs: u64 = std::env::var("DOWNLOAD_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("DOWNLOAD_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            server_url,
            uploads_dir,
            outputs_dir,
            dashscope_api_key,
            dashscope_base_url,
            model,
            resolution,
            default_prompt,
            sequence_image_count,
            poll_interval_secs,
            poll_max_attempts,
            download_timeout_secs,
        }
    }

    /// Poll pacing derived from the configured interval and ceiling.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            max_attempts: self.poll_max_attempts,
        }
    }

    /// Public URL of an uploaded image.
    pub fn upload_url(&self, filename: &str) -> String {
        format!("{}/uploads/{}", self.server_url, filename)
    }

    /// Public URL of a produced output.
    pub fn output_url(&self, filename: &str) -> String {
        format!("{}/outputs/{}", self.server_url, filename)
    }
}
