use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::dashboard::DashboardSource;
use crate::models::{
    Granularity, OverviewSnapshot, PerformanceSnapshot, TimeWindow, TrendMetric, TrendPayload,
};
use crate::settings::SystemSettings;

const SUCCESS_CODE: &str = "0";

/// Response wrapper used by every platform endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub role: String,
    pub token: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<Option<T>> {
        let request = self.authorize(self.http.get(self.url(path)).query(query));
        Self::send(request, path).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> anyhow::Result<Option<T>> {
        let mut request = self.authorize(self.http.post(self.url(path)));
        if let Some(body) = body {
            request = request.json(body);
        }
        Self::send(request, path).await
    }

    async fn send<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> anyhow::Result<Option<T>> {
        tracing::debug!(path, "calling platform API");
        let response = request
            .send()
            .await
            .with_context(|| format!("request to {path} failed"))?
            .error_for_status()
            .with_context(|| format!("{path} returned an error status"))?;

        let envelope: Envelope<T> = response
            .json()
            .await
            .with_context(|| format!("{path} returned an unreadable body"))?;

        if envelope.code != SUCCESS_CODE {
            anyhow::bail!(
                "{path} failed with code {}: {}",
                envelope.code,
                envelope.message.as_deref().unwrap_or("no message")
            );
        }
        Ok(envelope.data)
    }

    pub async fn system_settings(&self) -> anyhow::Result<SystemSettings> {
        self.get("/rag/settings", &[])
            .await?
            .context("/rag/settings returned no data")
    }

    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<LoginUser> {
        let body = LoginRequest { username, password };
        self.post("/auth/login", Some(&body))
            .await?
            .context("/auth/login returned no user")
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.post::<(), serde_json::Value>("/auth/logout", None)
            .await?;
        Ok(())
    }

    pub async fn current_user(&self) -> anyhow::Result<CurrentUser> {
        self.get("/user/me", &[])
            .await?
            .context("/user/me returned no user")
    }
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn overview(&self, window: TimeWindow) -> anyhow::Result<Option<OverviewSnapshot>> {
        self.get("/admin/dashboard/overview", &[("window", window.as_str())])
            .await
    }

    async fn performance(
        &self,
        window: TimeWindow,
    ) -> anyhow::Result<Option<PerformanceSnapshot>> {
        self.get("/admin/dashboard/performance", &[("window", window.as_str())])
            .await
    }

    async fn trends(
        &self,
        metric: TrendMetric,
        window: TimeWindow,
        granularity: Granularity,
    ) -> anyhow::Result<Option<TrendPayload>> {
        self.get(
            "/admin/dashboard/trends",
            &[
                ("metric", metric.as_str()),
                ("window", window.as_str()),
                ("granularity", granularity.as_str()),
            ],
        )
        .await
    }
}
