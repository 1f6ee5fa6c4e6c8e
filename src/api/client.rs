use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use crate::api::http_client::{json_headers, HttpClient};
use crate::auth::gateway::{AuthGateway, LOGIN_PATH, REGISTER_PATH};
use crate::auth::session::sign_out;
use crate::auth::storage::CredentialStore;
use crate::auth::token::Credential;
use crate::clock::Clock;
use crate::error::AlacenaResult;
use crate::models::{Container, Product};
use crate::navigation::{Navigator, DETAILS_SCREEN};

pub const PRODUCTS_PATH: &str = "/api/products/";
pub const CONTAINERS_PATH: &str = "/api/containers/";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    results: Vec<T>,
}

/// Client for the inventory API
///
/// All calls go through an [`AuthGateway`], so authenticated routes always
/// carry a fresh bearer token.
pub struct InventoryApi<C> {
    base_url: String,
    gateway: AuthGateway<C>,
}

impl<C: HttpClient + 'static> InventoryApi<C> {
    pub fn new(
        transport: C,
        base_url: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let base_url = base_url.into();
        let gateway = AuthGateway::new(transport, &base_url, store, navigator);
        Self { base_url, gateway }
    }

    /// Use a different time source for token expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.gateway = self.gateway.with_clock(clock);
        self
    }

    pub fn gateway(&self) -> &AuthGateway<C> {
        &self.gateway
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a route; absolute routes are used as given
    pub fn url(&self, route: &str) -> String {
        if route.starts_with("http://") || route.starts_with("https://") {
            return route.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// Log in and persist the returned token pair
    pub async fn login(&self, username: &str, password: &str) -> AlacenaResult<()> {
        let url = self.url(LOGIN_PATH);
        let body = json!({ "username": username, "password": password }).to_string();

        let response = self
            .gateway
            .post(&url, json_headers(), body)
            .await?
            .error_for_status()?;
        let LoginResponse { access, refresh } = response.json(&url)?;

        Credential::new(access, refresh)
            .save(self.gateway.store().as_ref())
            .await?;
        info!(username = %username, "Logged in");
        Ok(())
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, username: &str, password: &str) -> AlacenaResult<()> {
        let url = self.url(REGISTER_PATH);
        let body = json!({ "username": username, "password": password }).to_string();

        self.gateway
            .post(&url, json_headers(), body)
            .await?
            .error_for_status()?;
        info!(username = %username, "Account registered");
        Ok(())
    }

    /// Forget the stored credentials and return to the login screen
    pub async fn logout(&self) {
        sign_out(
            self.gateway.store().as_ref(),
            self.gateway.navigator().as_ref(),
        )
        .await;
    }

    /// Whether a token pair is stored; says nothing about its validity
    pub async fn has_session(&self) -> AlacenaResult<bool> {
        Ok(Credential::load(self.gateway.store().as_ref())
            .await?
            .is_some())
    }

    /// Authenticated GET returning the `results` array of the body.
    ///
    /// Failures are logged and returned to the caller.
    pub async fn fetch_list<T: DeserializeOwned>(&self, route: &str) -> AlacenaResult<Vec<T>> {
        let url = self.url(route);
        match self.get_results(&url).await {
            Ok(items) => {
                debug!(url = %url, count = items.len(), "Fetched list");
                Ok(items)
            }
            Err(e) => {
                error!(url = %url, error = %e, "Failed to fetch list");
                Err(e)
            }
        }
    }

    async fn get_results<T: DeserializeOwned>(&self, url: &str) -> AlacenaResult<Vec<T>> {
        let response = self
            .gateway
            .get(url, HashMap::new())
            .await?
            .error_for_status()?;
        let ListResponse { results } = response.json(url)?;
        Ok(results)
    }

    pub async fn products(&self) -> AlacenaResult<Vec<Product>> {
        self.fetch_list(PRODUCTS_PATH).await
    }

    pub async fn containers(&self) -> AlacenaResult<Vec<Container>> {
        self.fetch_list(CONTAINERS_PATH).await
    }

    /// Show the detail screen for a product
    pub fn open_product(&self, product: &Product) {
        self.gateway
            .navigator()
            .navigate(DETAILS_SCREEN, json!({ "item": product }));
    }
}
