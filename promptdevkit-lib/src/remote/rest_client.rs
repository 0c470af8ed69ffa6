//! REST client for the managed database service

use super::{ApiError, QueryError, ReadRequest, RemoteSource};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "      rest";

/// Remote source backed by the service's REST endpoint.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Create a client for the service at `base_url`.
    ///
    /// The anonymous key is always sent as `apikey`. The bearer token is the caller's
    /// access token when one is supplied and the anonymous key otherwise.
    pub fn new(base_url: &str, anon_key: &str, access_token: Option<&str>, timeout: Duration) -> crate::Result<Self> {
        let parsed = url::Url::parse(base_url).into_app_err_with(|| format!("invalid service URL '{base_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("service URL '{base_url}' must use http or https");
        }

        let mut api_key = HeaderValue::from_str(anon_key)?;
        api_key.set_sensitive(true);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token.unwrap_or(anon_key)))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert("apikey", api_key);
        let _ = headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .user_agent("promptdevkit")
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, QueryError> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(QueryError::transport);
        }

        let body = response.bytes().await.map_err(QueryError::transport)?;
        let error = ApiError::from_body(status.as_u16(), &body);
        log::debug!(target: LOG_TARGET, "service returned HTTP {}: {error}", status.as_u16());
        Err(QueryError::Api(error))
    }
}

impl RemoteSource for RestClient {
    async fn select<T>(&self, request: &ReadRequest) -> Result<Vec<T>, QueryError>
    where
        T: DeserializeOwned + Send,
    {
        log::debug!(target: LOG_TARGET, "GET {request}");

        let response = self
            .client
            .get(self.endpoint(request.table()))
            .query(&request.to_query_pairs())
            .send()
            .await
            .map_err(QueryError::transport)?;

        Self::decode(response).await
    }

    async fn rpc<P, T>(&self, function: &str, params: &P) -> Result<T, QueryError>
    where
        P: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        log::debug!(target: LOG_TARGET, "POST rpc/{function}");

        let response = self
            .client
            .post(self.endpoint(&format!("rpc/{function}")))
            .json(params)
            .send()
            .await
            .map_err(QueryError::transport)?;

        Self::decode(response).await
    }
}
