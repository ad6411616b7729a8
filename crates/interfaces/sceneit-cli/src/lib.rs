pub mod commands;
pub mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use camino::Utf8PathBuf;
use sceneit_app_core::{AppKernel, LoaderOptions};
use sceneit_infra::{default_http_client, HttpFetcher};
use sceneit_persistence::FileSessionStore;

pub type CliKernel = AppKernel<HttpFetcher, FileSessionStore>;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api: String,
    /// Zero disables the per-request timeout.
    pub timeout_ms: u64,
    /// Defaults to `storage.json` in the platform config directory.
    pub session_file: Option<Utf8PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api: sceneit_config::DEFAULT_API_ENDPOINT.to_string(),
            timeout_ms: sceneit_config::DEFAULT_REQUEST_TIMEOUT_MS,
            session_file: None,
        }
    }
}

pub fn build_kernel(opts: &ClientOptions) -> anyhow::Result<CliKernel> {
    let client = default_http_client().context("Failed to build HTTP client")?;
    let fetcher = HttpFetcher::new(client, &opts.api)
        .with_context(|| format!("Invalid API endpoint '{}'", opts.api))?;
    let sessions = match &opts.session_file {
        Some(path) => FileSessionStore::new(path.clone()),
        None => FileSessionStore::in_config_dir().context("Failed to locate session storage")?,
    };
    let options = LoaderOptions {
        timeout: (opts.timeout_ms > 0).then(|| Duration::from_millis(opts.timeout_ms)),
    };
    Ok(AppKernel::new(
        Arc::new(fetcher),
        Arc::new(sessions),
        options,
    ))
}
