use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use sitewire_api_types::{Category, ContentSummary, ErrorBody, FilterState};

use super::{ClientError, QueryClient};

/// [`QueryClient`] calling a running sitewire server.
#[derive(Clone, Debug)]
pub struct HttpQueryClient {
    client: Client,
    base: Url,
}

impl HttpQueryClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?.join("/")?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("sitewire-client/", env!("CARGO_PKG_VERSION"))
    }

    pub fn posts_url(&self, filter: &FilterState) -> Result<Url, ClientError> {
        let mut url = self.base.join("api/blog/posts")?;
        let query = filter.to_query_string();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        Ok(url)
    }

    async fn handle<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let error = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(ClientError::Server {
                status: status.as_u16(),
                error,
            });
        }
        serde_json::from_slice(&bytes).map_err(|err| ClientError::Decode(err.to_string()))
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    async fn fetch_posts(&self, filter: &FilterState) -> Result<Vec<ContentSummary>, ClientError> {
        let response = self.client.get(self.posts_url(filter)?).send().await?;
        Self::handle(response).await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, ClientError> {
        let url = self.base.join("api/blog/categories")?;
        let response = self.client.get(url).send().await?;
        Self::handle(response).await
    }
}
