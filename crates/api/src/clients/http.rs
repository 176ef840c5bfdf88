//! Shared JSON-over-HTTP client for collaborator services.

use common::RequestContext;
use reqwest::{Method, RequestBuilder, Response, Url};
use saga::ServiceError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A base URL plus a pooled HTTP client.
///
/// Every request carries a child trace context and is bounded by the
/// caller's remaining deadline. Paths are given as segments, each escaped
/// on its own so identifiers cannot add segments, queries or fragments.
#[derive(Debug, Clone)]
pub struct JsonClient {
    client: reqwest::Client,
    base_url: String,
}

impl JsonClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &[&str],
    ) -> Result<T, ServiceError> {
        let response = self.send(ctx, self.request(Method::GET, path)?).await?;
        decode(response).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &[&str],
        body: &B,
    ) -> Result<T, ServiceError> {
        let response = self
            .send(ctx, self.request(Method::POST, path)?.json(body))
            .await?;
        decode(response).await
    }

    /// Posts `body` and ignores the response body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &[&str],
        body: &B,
    ) -> Result<(), ServiceError> {
        self.send(ctx, self.request(Method::POST, path)?.json(body))
            .await
            .map(drop)
    }

    pub async fn delete(&self, ctx: &RequestContext, path: &[&str]) -> Result<(), ServiceError> {
        self.send(ctx, self.request(Method::DELETE, path)?)
            .await
            .map(drop)
    }

    fn request(&self, method: Method, path: &[&str]) -> Result<RequestBuilder, ServiceError> {
        Ok(self.client.request(method, self.url(path)?))
    }

    /// Appends `path` to the base URL, one escaped segment per element.
    pub fn url(&self, path: &[&str]) -> Result<Url, ServiceError> {
        let invalid = || ServiceError::Transport(format!("invalid base url {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(path);
        Ok(url)
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        mut request: RequestBuilder,
    ) -> Result<Response, ServiceError> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        if let Some(remaining) = ctx.remaining() {
            request = request.timeout(remaining);
        }
        for (key, value) in ctx.trace().child().headers() {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|error| {
            if error.is_timeout() {
                ServiceError::Transport(format!("timed out: {error}"))
            } else {
                ServiceError::Transport(error.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    response
        .json()
        .await
        .map_err(|error| ServiceError::InvalidResponse(error.to_string()))
}
