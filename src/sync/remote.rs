//! Client side of the progress service.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::ClientConfig,
    error::AppError,
    models::{
        api::{ApiResponse, StreakResponse, SyncProgressRequest, SyncProgressResponse},
        badge_award::{BadgeHistoryResponse, CheckBadgesResponse},
        progress::UserProgress,
        user::{LoginRequest, LoginResponse, RegisterRequest, User},
        xp_transaction::{AddXpRequest, AddXpResponse, XpHistoryResponse},
    },
};

/// The server-authoritative progress store the reconciler talks to.
#[async_trait]
pub trait RemoteProgress: Send + Sync {
    /// `GET /api/progress`
    async fn fetch_progress(&self) -> Result<UserProgress, AppError>;

    /// `POST /api/progress/sync`
    async fn sync_progress(
        &self,
        local: &UserProgress,
        force_overwrite: bool,
    ) -> Result<SyncProgressResponse, AppError>;

    /// `POST /api/progress/update-streak`
    async fn update_streak(&self) -> Result<StreakResponse, AppError>;

    /// `POST /api/progress/check-badges`
    async fn check_badges(&self) -> Result<CheckBadgesResponse, AppError>;
}

/// `RemoteProgress` over HTTP with bearer-token auth.
#[derive(Debug, Clone)]
pub struct HttpProgressClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpProgressClient {
    /// `base_url` may carry a path prefix, e.g. `https://host/driveprep`;
    /// every endpoint is resolved below it.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: None,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        Self::new(&config.api_url)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let body = RegisterRequest {
            email: email.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        };
        self.send(self.http.post(self.endpoint("api/auth/register")?).json(&body))
            .await
    }

    /// Logs in and keeps the token for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send(self.http.post(self.endpoint("api/auth/login")?).json(&body))
            .await?;
        self.token = Some(response.token.clone());
        Ok(response)
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    pub async fn add_xp(&self, request: &AddXpRequest) -> Result<AddXpResponse, AppError> {
        self.send(self.http.post(self.endpoint("api/progress/add-xp")?).json(request))
            .await
    }

    pub async fn xp_history(&self, limit: u32) -> Result<XpHistoryResponse, AppError> {
        let mut url = self.endpoint("api/progress/xp-history")?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        self.send(self.http.get(url)).await
    }

    pub async fn badge_history(&self) -> Result<BadgeHistoryResponse, AppError> {
        self.send(self.http.get(self.endpoint("api/progress/badges")?))
            .await
    }

    /// Resolves `path` relative to the base URL, keeping its path prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Sends the request and unwraps the `{success, data, error}` envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("unexpected response ({}): {}", status, e)))?;

        if envelope.success {
            return envelope
                .data
                .ok_or_else(|| AppError::Remote("response carried no data".to_string()));
        }

        let message = envelope.error.unwrap_or_else(|| status.to_string());
        Err(match status {
            StatusCode::UNAUTHORIZED => AppError::AuthError(message),
            StatusCode::BAD_REQUEST => AppError::BadRequest(message),
            StatusCode::CONFLICT => AppError::Conflict(message),
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            _ => AppError::Remote(message),
        })
    }
}

#[async_trait]
impl RemoteProgress for HttpProgressClient {
    async fn fetch_progress(&self) -> Result<UserProgress, AppError> {
        self.send(self.http.get(self.endpoint("api/progress")?)).await
    }

    async fn sync_progress(
        &self,
        local: &UserProgress,
        force_overwrite: bool,
    ) -> Result<SyncProgressResponse, AppError> {
        let body = SyncProgressRequest {
            local_progress: local.clone(),
            force_overwrite,
        };
        self.send(self.http.post(self.endpoint("api/progress/sync")?).json(&body))
            .await
    }

    async fn update_streak(&self) -> Result<StreakResponse, AppError> {
        self.send(self.http.post(self.endpoint("api/progress/update-streak")?))
            .await
    }

    async fn check_badges(&self) -> Result<CheckBadgesResponse, AppError> {
        self.send(self.http.post(self.endpoint("api/progress/check-badges")?))
            .await
    }
}
