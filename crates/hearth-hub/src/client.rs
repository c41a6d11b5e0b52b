//! REST client for the automation hub.

use crate::entities::{Domain, EntityState, HubConnectionConfig, ServiceCall};
use crate::error::{HubError, HubResult};
use serde_json::Value;

/// Thin wrapper over the hub's REST API. All calls carry the bearer token
/// and the configured request timeout.
pub struct HubClient {
    config: HubConnectionConfig,
    http: reqwest::Client,
}

impl HubClient {
    pub fn new(config: HubConnectionConfig) -> HubResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .map_err(HubError::Http)?;
        Ok(Self { config, http })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base(), path.trim_start_matches('/'))
    }

    fn add_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.config.token))
    }

    /// Check that the hub answers and the token is accepted.
    pub async fn test_connection(&self) -> HubResult<bool> {
        let response = self
            .add_auth(self.http.get(self.api_url("/")))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Fetch every entity state the hub knows about.
    pub async fn get_states(&self) -> HubResult<Vec<EntityState>> {
        let response = self
            .add_auth(self.http.get(self.api_url("/states")))
            .send()
            .await?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::UNAUTHORIZED {
                return Err(HubError::AuthenticationFailed);
            }
            return Err(HubError::InvalidResponse(format!(
                "Status: {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    /// Fetch one entity's state.
    pub async fn get_state(&self, entity_id: &str) -> HubResult<EntityState> {
        let url = self.api_url(&format!("/states/{}", entity_id));
        let response = self.add_auth(self.http.get(&url)).send().await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json().await?),
            reqwest::StatusCode::NOT_FOUND => Err(HubError::EntityNotFound(entity_id.to_string())),
            reqwest::StatusCode::UNAUTHORIZED => Err(HubError::AuthenticationFailed),
            status => Err(HubError::InvalidResponse(format!("Status: {}", status))),
        }
    }

    /// Fetch all entities in one domain. Always a live read.
    pub async fn get_states_by_domain(&self, domain: Domain) -> HubResult<Vec<EntityState>> {
        let prefix = format!("{}.", domain.as_str());
        let all = self.get_states().await?;
        Ok(all
            .into_iter()
            .filter(|s| s.entity_id.starts_with(&prefix))
            .collect())
    }

    /// Invoke a hub service.
    pub async fn call_service(&self, call: ServiceCall) -> HubResult<Value> {
        let url = self.api_url(&format!("/services/{}/{}", call.domain, call.service));
        let response = self
            .add_auth(self.http.post(&url))
            .json(&call.service_data)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(response.json().await.unwrap_or(Value::Null)),
            reqwest::StatusCode::UNAUTHORIZED => Err(HubError::AuthenticationFailed),
            status => Err(HubError::ServiceCallFailed(format!("Status: {}", status))),
        }
    }

    pub fn config(&self) -> &HubConnectionConfig {
        &self.config
    }
}
