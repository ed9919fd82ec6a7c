//! Request executor shared by all provider adapters.
//!
//! An [`HttpExecutor`] is built once per adapter from its [`ExecutorConfig`]:
//! base URI, default headers and query parameters, timeout, rate limit and
//! content-decoding mode. Each call resolves a [`RequestSpec`] against the
//! base URI, sends exactly one HTTP request and decodes the body in the
//! adapter's [`ContentMode`].
//!
//! Failures are reported, never retried here:
//! - network errors, timeouts and non-success statuses → [`ProviderError::Transport`]
//! - a body that can't be parsed in the configured mode → [`ProviderError::Decode`]

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::ProviderError;
use super::xml;

/// User agent sent when an adapter doesn't configure its own
pub const DEFAULT_USER_AGENT: &str = concat!(
    "MusicMetaCache/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/music-meta-cache)"
);

/// How response bodies are decoded. Fixed per adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Body returned as text, untouched
    Raw,
    #[default]
    Json,
    /// Folded into a JSON tree, see [`xml::to_tree`]
    Xml,
    Html,
}

/// A decoded response body.
#[derive(Debug, Clone)]
pub enum Body {
    Raw(String),
    Json(Value),
    Xml(Value),
    Html(HtmlDocument),
}

impl Body {
    /// The body as a JSON tree (JSON or XML modes).
    pub fn into_tree(self) -> Result<Value, ProviderError> {
        match self {
            Body::Json(value) | Body::Xml(value) => Ok(value),
            Body::Raw(_) => Err(ProviderError::decode("expected a structured body, got raw text")),
            Body::Html(_) => Err(ProviderError::decode("expected a structured body, got HTML")),
        }
    }

    /// Deserialize a JSON or XML body into a provider DTO.
    ///
    /// A tree that doesn't match the DTO is upstream shape drift, not a
    /// decoding failure.
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, ProviderError> {
        let tree = self.into_tree()?;
        serde_json::from_value(tree).map_err(|e| ProviderError::invalid(e.to_string()))
    }
}

/// A parsed HTML page.
///
/// `scraper::Html` is not `Send`, so the document keeps its source and
/// re-parses when queried; queries return owned nodes.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    source: String,
}

/// An element selected from an [`HtmlDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlNode {
    pub text: String,
    pub attributes: BTreeMap<String, String>,
}

impl HtmlDocument {
    /// Parse a page, rejecting bodies that contain no markup at all.
    pub fn parse(source: String) -> Result<Self, ProviderError> {
        let document = scraper::Html::parse_document(&source);
        let has_elements = document
            .root_element()
            .descendants()
            .filter_map(scraper::ElementRef::wrap)
            .any(|el| !matches!(el.value().name(), "html" | "head" | "body"));
        if !has_elements {
            return Err(ProviderError::decode("HTML body contains no elements"));
        }
        Ok(Self { source })
    }

    /// Select elements with a CSS selector.
    pub fn select(&self, css: &str) -> Result<Vec<HtmlNode>, ProviderError> {
        let selector = scraper::Selector::parse(css)
            .map_err(|e| ProviderError::invalid(format!("bad selector {css:?}: {e}")))?;
        let document = scraper::Html::parse_document(&self.source);

        Ok(document
            .select(&selector)
            .map(|el| HtmlNode {
                text: el.text().collect::<String>().trim().to_string(),
                attributes: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
            .collect())
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// What to request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestSpec {
    /// A path relative to the base URI
    Path(String),
    /// A relative path plus query parameters
    PathWithQuery(String, Vec<(String, String)>),
    /// Full control over method, target and headers
    Custom(CustomRequest),
}

/// A fully specified request. `target` may be absolute or relative.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRequest {
    pub method: Method,
    pub target: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn query<K, V>(path: impl Into<String>, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::PathWithQuery(
            path.into(),
            params.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        )
    }
}

/// Per-adapter request settings
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub base_uri: String,
    pub content: ContentMode,
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub timeout: Duration,
    /// Minimum gap between two requests to this provider
    pub min_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            base_uri: String::new(),
            content: ContentMode::Json,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            timeout: Duration::from_secs(10),
            min_interval: Duration::ZERO,
        }
    }
}

/// HTTP executor bound to one provider
pub struct HttpExecutor {
    http_client: reqwest::Client,
    base_uri: Url,
    content: ContentMode,
    default_query: BTreeMap<String, String>,
    min_interval: Duration,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl HttpExecutor {
    /// Build the executor and its HTTP client.
    pub fn new(config: &ExecutorConfig) -> Result<Self, ProviderError> {
        let base_uri = Url::parse(&config.base_uri)
            .map_err(|e| ProviderError::transport(format!("invalid base URI {:?}: {e}", config.base_uri)))?;

        let headers = header_map(&config.headers)?;
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .timeout(config.timeout)
            .default_headers(headers);
        if !config.headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
            builder = builder.user_agent(DEFAULT_USER_AGENT);
        }
        let http_client = builder
            .build()
            .map_err(|e| ProviderError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_uri,
            content: config.content,
            default_query: config.query.clone(),
            min_interval: config.min_interval,
            last_request: tokio::sync::Mutex::new(None),
        })
    }

    pub fn content_mode(&self) -> ContentMode {
        self.content
    }

    pub fn base_uri(&self) -> &Url {
        &self.base_uri
    }

    /// Send one request and decode its body.
    pub async fn execute(&self, spec: RequestSpec) -> Result<Body, ProviderError> {
        let (method, target, query, headers) = match spec {
            RequestSpec::Path(path) => (Method::GET, path, Vec::new(), Vec::new()),
            RequestSpec::PathWithQuery(path, query) => (Method::GET, path, query, Vec::new()),
            RequestSpec::Custom(custom) => (custom.method, custom.target, custom.query, custom.headers),
        };

        let url = resolve_url(&self.base_uri, &target)?;
        let query = merge_query(&self.default_query, query);

        let mut request = self.http_client.request(method, url.clone()).query(&query);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        self.wait_for_slot().await;
        tracing::debug!(url = %url, "Provider request");

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::transport(format!(
                "HTTP {}: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                body.chars().take(200).collect::<String>()
            )));
        }

        let text = response.text().await?;
        decode_body(self.content, text)
    }

    /// Enforce the provider's minimum request interval.
    async fn wait_for_slot(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Decode a raw body in the given mode.
pub fn decode_body(mode: ContentMode, text: String) -> Result<Body, ProviderError> {
    match mode {
        ContentMode::Raw => Ok(Body::Raw(text)),
        ContentMode::Json => serde_json::from_str(&text)
            .map(Body::Json)
            .map_err(|e| ProviderError::decode(format!("invalid JSON: {e}"))),
        ContentMode::Xml => xml::to_tree(&text).map(Body::Xml),
        ContentMode::Html => HtmlDocument::parse(text).map(Body::Html),
    }
}

/// Resolve a request target against the base URI.
///
/// Absolute targets are used as-is; relative ones follow URL reference
/// resolution, so `database/search` against `https://api.discogs.com/`
/// becomes `https://api.discogs.com/database/search`.
pub fn resolve_url(base: &Url, target: &str) -> Result<Url, ProviderError> {
    base.join(target)
        .map_err(|e| ProviderError::transport(format!("cannot resolve {target:?} against {base}: {e}")))
}

/// Default query parameters first, then call parameters. A call parameter
/// replaces a default with the same name.
pub fn merge_query(
    defaults: &BTreeMap<String, String>,
    call: Vec<(String, String)>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .iter()
        .filter(|(k, _)| !call.iter().any(|(ck, _)| ck == *k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    merged.extend(call);
    merged
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, ProviderError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ProviderError::transport(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ProviderError::transport(format!("invalid value for header {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}
