//! Bearer-token decoration for outbound API calls.
//!
//! [`AuthGateway`] wraps any [`HttpClient`] and is itself an `HttpClient`.
//! For every request that is not aimed at a public endpoint it reads the
//! stored access token, refreshes it when it is missing or expired, and
//! attaches it as `Authorization: Bearer <token>`. When the refresh fails
//! the stored credentials are wiped, the user is sent to the login screen
//! and the request is abandoned with [`AlacenaError::RefreshFailed`].
//!
//! Requests that notice a stale token at the same time share one refresh:
//! the endpoint is called once and every waiter gets the same outcome.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::api::http_client::{json_headers, HttpClient, SimpleHttpResponse};
use crate::auth::session::sign_out;
use crate::auth::storage::{CredentialStore, ACCESS_KEY, REFRESH_KEY};
use crate::auth::token::token_expired;
use crate::clock::{Clock, SystemClock};
use crate::error::{AlacenaError, AlacenaResult};
use crate::navigation::Navigator;

pub const LOGIN_PATH: &str = "/api/login/";
pub const REGISTER_PATH: &str = "/api/register/";
pub const REFRESH_PATH: &str = "/api/token/refresh/";

/// Endpoints reached without a bearer token
pub const UNAUTHENTICATED_PATHS: [&str; 3] = [LOGIN_PATH, REGISTER_PATH, REFRESH_PATH];

type SharedRefresh = Shared<BoxFuture<'static, AlacenaResult<String>>>;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// Path component of an absolute or relative URL
fn request_path(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url).to_string(),
    }
}

/// Path prefix of a base URL, without the trailing slash; empty at the root
fn base_path(base_url: &str) -> String {
    reqwest::Url::parse(base_url)
        .map(|parsed| parsed.path().trim_end_matches('/').to_string())
        .unwrap_or_default()
}

/// Whether a request to `url` bypasses authentication entirely, for an API
/// mounted at the root
pub fn is_unauthenticated_path(url: &str) -> bool {
    let path = request_path(url);
    UNAUTHENTICATED_PATHS.contains(&path.as_str())
}

/// Everything a refresh needs, owned so the refresh can outlive any one request
struct Refresher<C> {
    inner: Arc<C>,
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    refresh_url: Arc<str>,
}

impl<C> Clone for Refresher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            store: Arc::clone(&self.store),
            navigator: Arc::clone(&self.navigator),
            clock: Arc::clone(&self.clock),
            refresh_url: Arc::clone(&self.refresh_url),
        }
    }
}

impl<C: HttpClient + 'static> Refresher<C> {
    /// The stored access token if it is still usable, `AuthExpired` otherwise
    async fn valid_access(&self) -> AlacenaResult<String> {
        let Some(token) = self.store.get(ACCESS_KEY).await? else {
            debug!("No access token stored");
            return Err(AlacenaError::AuthExpired);
        };

        match token_expired(&token, self.clock.now()) {
            Ok(false) => Ok(token),
            Ok(true) => {
                debug!("Access token expired");
                Err(AlacenaError::AuthExpired)
            }
            Err(e) => {
                warn!(error = %e, "Stored access token is unreadable, treating it as expired");
                Err(AlacenaError::AuthExpired)
            }
        }
    }

    /// Exchange the refresh token for a new access token
    async fn request_access(&self) -> AlacenaResult<String> {
        let refresh = self
            .store
            .get(REFRESH_KEY)
            .await
            .map_err(AlacenaError::refresh_failed)?
            .ok_or_else(|| AlacenaError::refresh_failed("no refresh token found"))?;

        let body = json!({ "refresh": refresh }).to_string();
        let response: SimpleHttpResponse = self
            .inner
            .post(&self.refresh_url, json_headers(), body)
            .await
            .map_err(AlacenaError::refresh_failed)?;

        if !response.is_success() {
            return Err(AlacenaError::refresh_failed(format!(
                "refresh endpoint returned {}: {}",
                response.status(),
                response.error_message()
            )));
        }

        let RefreshResponse { access } = response
            .json(&self.refresh_url)
            .map_err(AlacenaError::refresh_failed)?;
        Ok(access)
    }

    async fn run(self) -> AlacenaResult<String> {
        // Another request may have finished a refresh after we saw the stale token
        if let Ok(token) = self.valid_access().await {
            debug!("Access token already refreshed");
            return Ok(token);
        }

        info!("Refreshing access token");
        match self.request_access().await {
            Ok(access) => {
                if let Err(e) = self.store.set(ACCESS_KEY, &access).await {
                    warn!(error = %e, "Refreshed access token could not be persisted");
                }
                info!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                error!(error = %e, "Token refresh failed, signing out");
                sign_out(self.store.as_ref(), self.navigator.as_ref()).await;
                Err(e)
            }
        }
    }
}

/// `HttpClient` decorator that authenticates outbound requests
pub struct AuthGateway<C> {
    refresher: Refresher<C>,
    /// Public endpoint paths under the base URL's path prefix
    public_paths: Vec<String>,
    in_flight: Mutex<Option<SharedRefresh>>,
}

impl<C: HttpClient + 'static> AuthGateway<C> {
    /// Wrap `inner`; `base_url` locates the refresh endpoint
    pub fn new(
        inner: C,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let refresh_url = format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH);
        let prefix = base_path(base_url);
        let public_paths = UNAUTHENTICATED_PATHS
            .iter()
            .map(|path| format!("{prefix}{path}"))
            .collect();
        Self {
            refresher: Refresher {
                inner: Arc::new(inner),
                store,
                navigator,
                clock: Arc::new(SystemClock),
                refresh_url: Arc::from(refresh_url),
            },
            public_paths,
            in_flight: Mutex::new(None),
        }
    }

    /// Use a different time source for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.refresher.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.refresher.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.refresher.navigator
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.refresher.clock
    }

    /// The undecorated transport
    pub fn inner(&self) -> &C {
        &self.refresher.inner
    }

    /// Whether `url` is one of the login, register or refresh endpoints
    pub fn is_public(&self, url: &str) -> bool {
        let path = request_path(url);
        self.public_paths.iter().any(|public| *public == path)
    }

    /// Add the bearer header for `url`, refreshing the token first if needed
    pub async fn authorize(
        &self,
        url: &str,
        mut headers: HashMap<String, String>,
    ) -> AlacenaResult<HashMap<String, String>> {
        if self.is_public(url) {
            debug!(url = %url, "Public endpoint, no token attached");
            return Ok(headers);
        }

        let token = match self.refresher.valid_access().await {
            Ok(token) => token,
            Err(AlacenaError::AuthExpired) => self.refresh().await?,
            Err(e) => return Err(e),
        };

        headers.insert(
            http::header::AUTHORIZATION.as_str().to_string(),
            format!("Bearer {token}"),
        );
        Ok(headers)
    }

    /// Run a refresh, or join the one already in flight
    async fn refresh(&self) -> AlacenaResult<String> {
        let pending = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                // A finished refresh left behind by a cancelled waiter is stale
                Some(pending) if pending.peek().is_none() => {
                    debug!("Joining token refresh already in flight");
                    pending.clone()
                }
                _ => {
                    let pending = self.refresher.clone().run().boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;

        let mut slot = self.in_flight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
            *slot = None;
        }
        outcome
    }
}

#[async_trait]
impl<C: HttpClient + 'static> HttpClient for AuthGateway<C> {
    async fn get(
        &self,
        url: &str,
        headers: HashMap<String, String>,
    ) -> AlacenaResult<SimpleHttpResponse> {
        let headers = self.authorize(url, headers).await?;
        self.refresher.inner.get(url, headers).await
    }

    async fn post(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        body: String,
    ) -> AlacenaResult<SimpleHttpResponse> {
        let headers = self.authorize(url, headers).await?;
        self.refresher.inner.post(url, headers, body).await
    }
}
