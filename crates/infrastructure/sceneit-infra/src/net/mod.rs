use reqwest::{Client, Url};
use sceneit_core::{LoadFailure, Method, Resource};
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("sceneit/", env!("CARGO_PKG_VERSION"));

/// Issues one REST call and decodes its JSON body.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync + 'static {
    async fn fetch(&self, resource: &Resource) -> Result<Value, LoadFailure>;
}

pub fn default_http_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// reqwest-backed fetcher rooted at the API base URL.
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

/// Treat the endpoint as a directory so `join("movies/1")` keeps any base path.
pub(crate) fn normalize_base(endpoint: &str) -> Result<Url, LoadFailure> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| LoadFailure::network(None, format!("invalid api url {endpoint}: {e}")))?;
    if !url.path().ends_with('/') {
        url.set_path(&format!("{}/", url.path()));
    }
    Ok(url)
}

impl HttpFetcher {
    pub fn new(client: Client, endpoint: &str) -> Result<Self, LoadFailure> {
        Ok(Self {
            client,
            base: normalize_base(endpoint)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url_for(&self, resource: &Resource) -> Result<Url, LoadFailure> {
        let rel = resource.path.trim_start_matches('/');
        self.base.join(rel).map_err(|e| {
            LoadFailure::network(None, format!("bad url for {}: {e}", resource.path))
        })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// The backend reports errors as `{detail: ...}` or `{message: ...}`.
pub(crate) fn error_detail(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return String::new();
    };
    match value.get("detail").or_else(|| value.get("message")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, resource: &Resource) -> Result<Value, LoadFailure> {
        let url = self.url_for(resource)?;
        debug!("{} -> {}", resource.describe(), url);

        let mut req = self.client.request(to_reqwest(resource.method), url);
        if !resource.query.is_empty() {
            req = req.query(&resource.query);
        }
        if let Some(body) = &resource.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| LoadFailure::network(None, e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| LoadFailure::network(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(LoadFailure::network(
                Some(status.as_u16()),
                error_detail(&bytes),
            ));
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| LoadFailure::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let base = normalize_base("http://host:8000/api").unwrap();
        assert_eq!(base.join("movies/1").unwrap().as_str(), "http://host:8000/api/movies/1");
    }

    #[test]
    fn error_detail_reads_detail_or_message() {
        assert_eq!(error_detail(br#"{"detail":"Movie not found"}"#), "Movie not found");
        assert_eq!(error_detail(br#"{"message":"Login failed"}"#), "Login failed");
        assert_eq!(error_detail(b"<html>oops</html>"), "");
    }
}
