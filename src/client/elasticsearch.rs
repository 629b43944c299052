//! Elasticsearch client module
//!
//! Provides `ElasticsearchClient` for indexing documents one request at a time.

use super::Auth;
use eyre::{Context, Result};
use reqwest::Client;
use serde_json::{Map, Value};
use std::future::Future;
use url::Url;

/// Result of a single index request
///
/// The body is parsed as JSON when possible and kept as a string otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexResponse {
    pub status: u16,
    pub body: Value,
}

impl IndexResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Display for IndexResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.body)
    }
}

/// Something documents can be indexed into
///
/// Every call indexes exactly one document and lets the engine assign its id.
pub trait DocumentIndex: Send + Sync {
    /// Index a single document
    ///
    /// # Errors
    /// Returns an error only if the request could not be completed. A
    /// response with an error status is still an `Ok`.
    fn index_document(
        &self,
        document: &Map<String, Value>,
    ) -> impl Future<Output = Result<IndexResponse>> + Send;
}

/// Elasticsearch client for a single index
///
/// Documents are posted to `{url}/{index}/{doc_type}`. The doc type is the
/// legacy mapping type label; `_doc` is the typeless endpoint on newer
/// clusters.
///
/// # Example
/// ```no_run
/// use house_sales_etl::client::{Auth, DocumentIndex, ElasticsearchClient};
/// use serde_json::json;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("http://localhost:9200")?;
/// let client = ElasticsearchClient::try_new(url, Auth::None, "data_milestone", "doc")?;
///
/// let doc = json!({"house_id": 0, "suburb": "Abbotsford"});
/// let response = client.index_document(doc.as_object().unwrap()).await?;
/// println!("{}", response);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ElasticsearchClient {
    client: Client,
    url: Url,
    index: String,
    doc_type: String,
}

impl ElasticsearchClient {
    /// Create a new client from a base URL, auth and index coordinates
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the index
    /// path cannot be joined onto the URL.
    pub fn try_new(
        url: Url,
        auth: Auth,
        index: impl Into<String>,
        doc_type: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .default_headers(auth.headers()?)
            .build()
            .with_context(|| "Failed to build HTTP client")?;

        let client = Self {
            client,
            url,
            index: index.into(),
            doc_type: doc_type.into(),
        };
        client.index_url()?;
        Ok(client)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Endpoint that documents are posted to
    pub fn index_url(&self) -> Result<Url> {
        let path = format!("/{}/{}", self.index, self.doc_type);
        self.url
            .join(&path)
            .with_context(|| format!("Invalid index path '{}' for {}", path, self.url))
    }
}

impl DocumentIndex for ElasticsearchClient {
    async fn index_document(&self, document: &Map<String, Value>) -> Result<IndexResponse> {
        let url = self.index_url()?;
        log::trace!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .json(document)
            .send()
            .await
            .with_context(|| format!("Failed to send index request to {}", url))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read index response from {}", url))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(IndexResponse { status, body })
    }
}

impl std::fmt::Display for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (index: {})", self.url, self.index)
    }
}
