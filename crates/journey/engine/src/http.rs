//! HTTP client for the journey API

use crate::api::{ApiError, ApiResult, JourneyApi};
use crate::config::ApiConfig;
use async_trait::async_trait;
use journey_types::{JourneyId, JourneyProgress, PhaseUpdate};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the request id of a phase update
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// [`JourneyApi`] over HTTP/JSON
pub struct HttpJourneyApi {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpJourneyApi {
    /// Create a new client
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }

        Ok(Self {
            client,
            base_url,
            bearer_token: config.bearer_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL, escaping each one
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn phase_url(
        &self,
        journey: &JourneyId,
        update: &PhaseUpdate,
        action: Option<&str>,
    ) -> ApiResult<Url> {
        let mut segments = vec![
            "journey-workflow",
            journey.as_str(),
            "phases",
            update.phase.phase_id.phase_id(),
        ];
        segments.extend(action);
        self.url(&segments)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        tracing::debug!(url = %url, "GET");
        let path = url.path().to_string();
        let response = self.authorize(self.client.get(url)).send().await?;
        let body = Self::check_status(response, &path).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_update(&self, url: Url, update: &PhaseUpdate) -> ApiResult<()> {
        tracing::debug!(url = %url, request_id = %update.request_id, "POST");
        let path = url.path().to_string();
        let request = self.client.post(url);
        self.send_update(request, &path, update).await
    }

    async fn put_update(&self, url: Url, update: &PhaseUpdate) -> ApiResult<()> {
        tracing::debug!(url = %url, request_id = %update.request_id, "PUT");
        let path = url.path().to_string();
        let request = self.client.put(url);
        self.send_update(request, &path, update).await
    }

    /// Mutations ignore the response body; only the status matters
    async fn send_update(
        &self,
        request: RequestBuilder,
        path: &str,
        update: &PhaseUpdate,
    ) -> ApiResult<()> {
        let response = self
            .authorize(request)
            .header(IDEMPOTENCY_KEY_HEADER, update.request_id.to_string())
            .json(update)
            .send()
            .await?;
        Self::check_status(response, path).await?;
        Ok(())
    }

    async fn check_status(
        response: reqwest::Response,
        path: &str,
    ) -> ApiResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::NOT_FOUND {
            Err(ApiError::NotFound(path.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl JourneyApi for HttpJourneyApi {
    async fn fetch_progress(&self, journey: &JourneyId) -> ApiResult<JourneyProgress> {
        let url = self.url(&["journey-workflow", journey.as_str(), "progress"])?;
        self.get(url).await
    }

    async fn start_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        let url = self.phase_url(journey, update, Some("start"))?;
        self.post_update(url, update).await
    }

    async fn complete_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        let url = self.phase_url(journey, update, Some("complete"))?;
        self.post_update(url, update).await
    }

    async fn approve_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        let url = self.phase_url(journey, update, Some("approve"))?;
        self.post_update(url, update).await
    }

    async fn save_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        let url = self.phase_url(journey, update, None)?;
        self.put_update(url, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let api = HttpJourneyApi::new(&ApiConfig {
            base_url: "http://localhost:3001/".into(),
            ..ApiConfig::default()
        })
        .unwrap();
        assert_eq!(api.base_url(), "http://localhost:3001");
    }

    #[test]
    fn test_segments_are_escaped_under_base_path() {
        let api = HttpJourneyApi::new(&ApiConfig {
            base_url: "http://localhost:3001/api/".into(),
            ..ApiConfig::default()
        })
        .unwrap();
        let url = api.url(&["journey-workflow", "a/b#1?x", "progress"]).unwrap();
        assert_eq!(url.path(), "/api/journey-workflow/a%2Fb%231%3Fx/progress");
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = HttpJourneyApi::new(&ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        })
        .err();
        assert!(matches!(err, Some(ApiError::InvalidUrl(_))));
    }
}
