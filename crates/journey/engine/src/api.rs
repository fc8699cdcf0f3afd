//! The journey API boundary
//!
//! The backend owns journey progress. The controller reads it once on
//! load and pushes every applied action back through [`JourneyApi`].

use async_trait::async_trait;
use journey_types::{JourneyError, JourneyId, JourneyProgress, PhaseUpdate};
use std::sync::Arc;

/// Errors talking to the journey API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Journey API unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ApiError> for JourneyError {
    /// A body the server sent but that does not decode is bad progress,
    /// not a network failure
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Json(e) => JourneyError::InvalidProgress(e.to_string()),
            other => JourneyError::Network(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the workflow needs from the backend
#[async_trait]
pub trait JourneyApi: Send + Sync {
    /// `GET /journey-workflow/{journeyId}/progress`
    async fn fetch_progress(&self, journey: &JourneyId) -> ApiResult<JourneyProgress>;

    /// `POST /journey-workflow/{journeyId}/phases/{phaseId}/start`
    async fn start_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()>;

    /// `POST /journey-workflow/{journeyId}/phases/{phaseId}/complete`
    async fn complete_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()>;

    /// `POST /journey-workflow/{journeyId}/phases/{phaseId}/approve`
    async fn approve_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()>;

    /// `PUT /journey-workflow/{journeyId}/phases/{phaseId}`; field and media sync
    async fn save_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()>;
}

#[async_trait]
impl<T: JourneyApi + ?Sized> JourneyApi for Arc<T> {
    async fn fetch_progress(&self, journey: &JourneyId) -> ApiResult<JourneyProgress> {
        (**self).fetch_progress(journey).await
    }

    async fn start_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        (**self).start_phase(journey, update).await
    }

    async fn complete_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        (**self).complete_phase(journey, update).await
    }

    async fn approve_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        (**self).approve_phase(journey, update).await
    }

    async fn save_phase(&self, journey: &JourneyId, update: &PhaseUpdate) -> ApiResult<()> {
        (**self).save_phase(journey, update).await
    }
}
