//! Talking to the attendance backend.

mod envelope;
#[cfg(test)]
pub mod testing;
mod types;

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cookie::time::OffsetDateTime;
use cookie::{Cookie, CookieJar};
use log::{debug, warn};
use parking_lot::Mutex;
use reqwest::header::{ACCEPT, COOKIE, SET_COOKIE};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use rollcall_config::Endpoints;
use serde::Serialize;
use serde_json::Value;

use crate::session::SessionManager;
use crate::vault::SessionVault;

pub use self::envelope::unwrap_list;
pub use self::types::*;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("could not reach the server")]
    Transport(#[from] reqwest::Error),
    #[error("the server sent an unreadable response")]
    Malformed(#[from] serde_json::Error),
    /// The message is shown to the user as-is.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("the server did not hand out an access token")]
    MissingToken,
}

impl ApiError {
    fn rejected(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|body| body.get("message")?.as_str().map(str::to_string))
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

        Self::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// Everything the screens need from the backend.
/// Servers delete cookies by sending them again, already expired.
fn is_removal(cookie: &Cookie<'_>) -> bool {
    let outlived = cookie
        .max_age()
        .is_some_and(|age| age.is_zero() || age.is_negative());
    let expired = cookie
        .expires_datetime()
        .is_some_and(|expires| expires <= OffsetDateTime::now_utc());
    outlived || expired
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, ApiError>;

    async fn colleges(&self) -> Result<Vec<College>, ApiError>;

    async fn ngos(&self) -> Result<Vec<Ngo>, ApiError>;

    async fn events(&self) -> Result<Vec<Event>, ApiError>;

    async fn event_attendance(&self, event_id: &str) -> Result<AttendanceReport, ApiError>;

    async fn add_ngo(&self, ngo: &NewNgo) -> Result<(), ApiError>;

    async fn add_college(&self, college: &NewCollege) -> Result<(), ApiError>;

    async fn add_class(&self, class: &NewClass) -> Result<(), ApiError>;

    async fn add_students(&self, students: &NewStudents) -> Result<(), ApiError>;

    async fn add_event(&self, event: &NewEvent) -> Result<(), ApiError>;

    async fn submit_attendance(&self, attendance: &Attendance) -> Result<(), ApiError>;

    /// Drop all cookies the server has set, in memory and on disk.
    async fn forget_cookies(&self);
}

/// The real backend, spoken to over http.
pub struct Api {
    client: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
    session: SessionManager,
    vault: SessionVault,
    /// Key under which this server's cookies are persisted.
    domain: String,
    cookies: Mutex<CookieJar>,
}

impl Api {
    pub async fn new(
        config: &rollcall_config::Api,
        session: SessionManager,
        vault: SessionVault,
    ) -> anyhow::Result<Self> {
        let url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid api base url {:?}", config.base_url))?;
        let host = url.host_str().unwrap_or("localhost");
        let domain = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .context("failed to create http client")?;

        let cookies = vault
            .cookies(domain.clone())
            .await
            .context("failed to load cookies")?;
        debug!("loaded {} cookies for {domain}", cookies.iter().count());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            session,
            vault,
            domain,
            cookies: Mutex::new(cookies),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.lock();
        let header = cookies
            .iter()
            .map(|cookie| cookie.stripped().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        (!header.is_empty()).then_some(header)
    }

    fn received_cookies(response: &Response) -> Vec<Cookie<'static>> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .collect()
    }

    async fn absorb_cookies(&self, received: Vec<Cookie<'static>>) {
        if received.is_empty() {
            return;
        }

        let jar = {
            let mut cookies = self.cookies.lock();
            for cookie in received {
                if is_removal(&cookie) {
                    cookies.force_remove(cookie.name());
                } else {
                    cookies.add(cookie);
                }
            }
            cookies.clone()
        };

        if let Err(err) = self.vault.set_cookies(self.domain.clone(), jar).await {
            warn!("failed to persist cookies: {err}");
        }
    }

    async fn send(&self, request: RequestBuilder, authenticated: bool) -> Result<Value, ApiError> {
        let mut request = request.header(ACCEPT, "application/json");
        if let Some(cookies) = self.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        if authenticated {
            if let Some(token) = self.session.get().access_token() {
                request = request.bearer_auth(token);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        self.absorb_cookies(Self::received_cookies(&response)).await;
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::rejected(status, &body);
            debug!("request rejected: {err}");
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        debug!("GET {url}");
        self.send(self.client.get(url), true).await
    }

    async fn post<B>(&self, path: &str, body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        debug!("POST {url}");
        self.send(self.client.post(url).json(body), true).await
    }
}

#[async_trait]
impl Backend for Api {
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, ApiError> {
        let url = self.url(&self.endpoints.login);
        debug!("POST {url} as {}", request.role);
        let body = self.send(self.client.post(url).json(request), false).await?;
        LoginGrant::from_body(&body).ok_or(ApiError::MissingToken)
    }

    async fn colleges(&self) -> Result<Vec<College>, ApiError> {
        Ok(unwrap_list(&self.get(&self.endpoints.all_colleges).await?))
    }

    async fn ngos(&self) -> Result<Vec<Ngo>, ApiError> {
        Ok(unwrap_list(&self.get(&self.endpoints.all_ngos).await?))
    }

    async fn events(&self) -> Result<Vec<Event>, ApiError> {
        Ok(unwrap_list(&self.get(&self.endpoints.events).await?))
    }

    async fn event_attendance(&self, event_id: &str) -> Result<AttendanceReport, ApiError> {
        let body = self
            .get(&self.endpoints.event_attendance_for(event_id))
            .await?;
        // Some versions wrap the report in `data`.
        let report = match body.get("data") {
            Some(data) if data.is_object() => data.clone(),
            _ => body,
        };
        Ok(serde_json::from_value(report)?)
    }

    async fn add_ngo(&self, ngo: &NewNgo) -> Result<(), ApiError> {
        self.post(&self.endpoints.add_ngo, ngo).await?;
        Ok(())
    }

    async fn add_college(&self, college: &NewCollege) -> Result<(), ApiError> {
        self.post(&self.endpoints.add_college, college).await?;
        Ok(())
    }

    async fn add_class(&self, class: &NewClass) -> Result<(), ApiError> {
        self.post(&self.endpoints.add_class, class).await?;
        Ok(())
    }

    async fn add_students(&self, students: &NewStudents) -> Result<(), ApiError> {
        self.post(&self.endpoints.add_students, students).await?;
        Ok(())
    }

    async fn add_event(&self, event: &NewEvent) -> Result<(), ApiError> {
        self.post(&self.endpoints.events, event).await?;
        Ok(())
    }

    async fn submit_attendance(&self, attendance: &Attendance) -> Result<(), ApiError> {
        self.post(&self.endpoints.attendance, attendance).await?;
        Ok(())
    }

    async fn forget_cookies(&self) {
        *self.cookies.lock() = CookieJar::new();
        if let Err(err) = self.vault.clear_cookies(Some(self.domain.clone())).await {
            warn!("failed to forget cookies: {err}");
        }
    }
}
