use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use shared::{
    domain::{PageResult, Post, PostDraft, PostId},
    protocol::{BlogListResponse, ListQuery, PostWriteRequest},
};
use tracing::debug;
use url::Url;

pub mod config;
pub mod detail_view;
pub mod edit_session;
pub mod error;
pub mod list_sync;

pub use config::{load_settings, ClientSettings, ConfigError};
pub use detail_view::{DetailState, DetailViewController};
pub use edit_session::{EditSession, Submission};
pub use error::{ClientError, Operation};
pub use list_sync::{
    AlwaysConfirm, Confirmation, DeleteOutcome, ListSyncController, SyncEvent, SyncState,
};

const COLLECTION_PATH: [&str; 2] = ["api", "blogs"];

/// Transport seam between the controllers and the post collection endpoint.
///
/// Implementations issue exactly one request per call: no retries, no caching.
#[async_trait]
pub trait BlogApi: Send + Sync {
    async fn list(&self, page: u32, per_page: u32) -> Result<PageResult, ClientError>;
    async fn get(&self, id: PostId) -> Result<Post, ClientError>;
    async fn create(&self, title: &str, content: &str) -> Result<Post, ClientError>;
    async fn update(&self, id: PostId, title: &str, content: &str) -> Result<Post, ClientError>;
    async fn delete(&self, id: PostId) -> Result<(), ClientError>;
}

pub struct HttpBlogClient {
    http: Client,
    collection_url: Url,
}

impl HttpBlogClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Self::with_client(http, settings.api_url()?)
    }

    pub fn with_client(http: Client, base_url: Url) -> Result<Self, ConfigError> {
        let mut collection_url = base_url.clone();
        collection_url
            .path_segments_mut()
            .map_err(|_| ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(COLLECTION_PATH);
        collection_url.set_query(None);
        Ok(Self {
            http,
            collection_url,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn item_url(&self, id: PostId) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&id.to_string());
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    async fn send(&self, method: Method, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        debug!(
            method = %method,
            path = response.url().path(),
            status = response.status().as_u16(),
            "blog api request completed"
        );
        Ok(response)
    }
}

fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::http_status(status))
    }
}

#[async_trait]
impl BlogApi for HttpBlogClient {
    async fn list(&self, page: u32, per_page: u32) -> Result<PageResult, ClientError> {
        let request = self
            .request(Method::GET, self.collection_url.clone())
            .query(&ListQuery { page, per_page });
        let response = ensure_success(self.send(Method::GET, request).await?)?;
        let body: BlogListResponse = response.json().await?;
        Ok(PageResult::from(body))
    }

    async fn get(&self, id: PostId) -> Result<Post, ClientError> {
        let request = self.request(Method::GET, self.item_url(id));
        let response = self.send(Method::GET, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(id));
        }
        Ok(ensure_success(response)?.json().await?)
    }

    async fn create(&self, title: &str, content: &str) -> Result<Post, ClientError> {
        let body = PostWriteRequest::from(&PostDraft::new(title, content));
        let request = self
            .request(Method::POST, self.collection_url.clone())
            .json(&body);
        let response = ensure_success(self.send(Method::POST, request).await?)?;
        Ok(response.json().await?)
    }

    async fn update(&self, id: PostId, title: &str, content: &str) -> Result<Post, ClientError> {
        let body = PostWriteRequest::from(&PostDraft::new(title, content));
        let request = self.request(Method::PUT, self.item_url(id)).json(&body);
        let response = ensure_success(self.send(Method::PUT, request).await?)?;
        Ok(response.json().await?)
    }

    async fn delete(&self, id: PostId) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, self.item_url(id));
        ensure_success(self.send(Method::DELETE, request).await?)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
