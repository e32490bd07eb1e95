use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::MonitorError;

/// Thin JSON-over-HTTP layer for the Syncthing REST API.
///
/// Holds an ordered list of candidate base URLs; a connect failure moves
/// the following requests on to the next candidate.
pub struct HttpClient {
    api_key: String,
    http: Client,
    base_urls: Vec<String>,
    current_idx: AtomicUsize,
}

impl HttpClient {
    pub fn new(api_key: String, http: Client, base_urls: Vec<String>) -> Self {
        let base_urls = if base_urls.is_empty() {
            vec!["http://127.0.0.1:8384".to_string()]
        } else {
            base_urls
        };
        Self {
            api_key,
            http,
            base_urls,
            current_idx: AtomicUsize::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        let idx = self.current_idx.load(Ordering::Relaxed) % self.base_urls.len();
        &self.base_urls[idx]
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, MonitorError>
    where
        T: DeserializeOwned,
    {
        self.get_json_with_query(path, &()).await
    }

    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, MonitorError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).query(query);
        let response = self.send(request, path).await?;
        response.json::<T>().await.map_err(MonitorError::Http)
    }

    /// Like `get_json_with_query` with a per-request timeout, used for long-polls.
    pub async fn get_json_with_timeout<T, Q>(
        &self,
        path: &str,
        query: &Q,
        timeout: Duration,
    ) -> Result<T, MonitorError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).query(query).timeout(timeout);
        let response = self.send(request, path).await?;
        response.json::<T>().await.map_err(MonitorError::Http)
    }

    /// GET that maps a 404 answer to `None` instead of an error.
    pub async fn get_optional_json_with_query<T, Q>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Option<T>, MonitorError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path).query(query);
        let response = request.send().await.map_err(|err| self.transport_error(err))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "Resource not found");
            return Ok(None);
        }
        let response = check_status(response, path)?;
        response.json::<T>().await.map(Some).map_err(MonitorError::Http)
    }

    /// Fire a mutation; only the status code of the answer is inspected.
    pub async fn send_empty<Q>(&self, method: Method, path: &str, query: &Q) -> Result<(), MonitorError>
    where
        Q: Serialize + ?Sized,
    {
        let request = self.request(method, path).query(query);
        self.send(request, path).await?;
        Ok(())
    }

    pub async fn send_json<B>(&self, method: Method, path: &str, body: &B) -> Result<(), MonitorError>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .request(method, path)
            .header("Content-Type", "application/json")
            .json(body);
        self.send(request, path).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/{}",
            self.base_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        self.http
            .request(method, url)
            .header("X-API-Key", &self.api_key)
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, MonitorError> {
        let response = request.send().await.map_err(|err| self.transport_error(err))?;
        check_status(response, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> MonitorError {
        let err = MonitorError::Http(err);
        if err.is_connect() && self.base_urls.len() > 1 {
            let previous = self.base_url().to_string();
            self.current_idx.fetch_add(1, Ordering::Relaxed);
            warn!(from = %previous, to = %self.base_url(), "Connection failed, switching Syncthing URL");
        }
        err
    }
}

fn check_status(response: Response, path: &str) -> Result<Response, MonitorError> {
    if !response.status().is_success() {
        return Err(MonitorError::Syncthing(format!(
            "{} returned {}",
            path,
            response.status()
        )));
    }
    Ok(response)
}
