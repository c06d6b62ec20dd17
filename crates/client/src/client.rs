//! Civo REST client

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::*;

/// Client for the Civo API
#[derive(Debug, Clone)]
pub struct CivoClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl CivoClient {
    /// Create a client. The token is not validated here; an empty one is
    /// rejected by the API as `Unauthorized`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("civo-client/{}", crate::VERSION))
            .build()?;

        Ok(Self { http, config })
    }

    /// Create a client from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    // Load balancer operations

    /// List all load balancers in the region
    pub async fn list_load_balancers(&self) -> Result<Vec<LoadBalancer>> {
        self.get_json("/v2/loadbalancers", LoadBalancer::KIND, "").await
    }

    /// Get a load balancer by ID
    pub async fn get_load_balancer(&self, id: &str) -> Result<LoadBalancer> {
        self.get_json(&format!("/v2/loadbalancers/{}", id), LoadBalancer::KIND, id)
            .await
    }

    /// Find a load balancer by ID or hostname.
    ///
    /// An exact match on either field wins; otherwise the search must be a
    /// substring of exactly one load balancer's ID or hostname.
    pub async fn find_load_balancer(&self, search: &str) -> Result<LoadBalancer> {
        let all = self.list_load_balancers().await?;
        find_match(all, search)
    }

    /// Delete a load balancer
    pub async fn delete_load_balancer(&self, id: &str) -> Result<()> {
        let request = self.http.delete(self.url(&format!("/v2/loadbalancers/{}", id)));
        self.send(request, LoadBalancer::KIND, id).await?;
        Ok(())
    }

    // Instance operations

    /// List all instances in the region, following pagination
    pub async fn list_instances(&self) -> Result<Vec<Instance>> {
        let mut instances = Vec::new();
        let mut page = 1;

        loop {
            let path = format!("/v2/instances?page={}&per_page=100", page);
            let batch: PaginatedInstances = self.get_json(&path, Instance::KIND, "").await?;
            instances.extend(batch.items);

            if batch.pages == 0 || page >= batch.pages {
                break;
            }
            page += 1;
        }

        Ok(instances)
    }

    /// Get an instance by ID
    pub async fn get_instance(&self, id: &str) -> Result<Instance> {
        self.get_json(&format!("/v2/instances/{}", id), Instance::KIND, id)
            .await
    }

    /// Find an instance by ID or hostname, with the same rules as
    /// [`CivoClient::find_load_balancer`].
    pub async fn find_instance(&self, search: &str) -> Result<Instance> {
        let all = self.list_instances().await?;
        find_match(all, search)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, kind: &str, id: &str) -> Result<T> {
        let request = self.http.get(self.url(path));
        let response = self.send(request, kind, id).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send(&self, request: RequestBuilder, kind: &str, id: &str) -> Result<reqwest::Response> {
        let request = request
            .header(AUTHORIZATION, format!("bearer {}", self.config.token))
            .query(&[("region", self.config.region.as_str())])
            .build()?;

        debug!("{} {}", request.method(), request.url().path());
        let response = self.http.execute(request).await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_else(|_| ApiErrorBody {
            code: String::new(),
            reason: text.clone(),
        });
        warn!("{} request failed with {}: {} {}", kind, status, body.code, body.reason);

        Err(match status {
            StatusCode::NOT_FOUND => Error::not_found(kind, id),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(body.reason),
            _ => Error::Api {
                status: status.as_u16(),
                code: body.code,
                reason: body.reason,
            },
        })
    }
}

/// Pick the resource matching `search` by ID or hostname.
fn find_match<T: Searchable>(items: Vec<T>, search: &str) -> Result<T> {
    if search.is_empty() {
        return Err(Error::not_found(T::KIND, search));
    }

    let mut partial = Vec::new();
    for item in items {
        if item.id() == search || item.hostname() == search {
            return Ok(item);
        }
        if item.id().contains(search) || item.hostname().contains(search) {
            partial.push(item);
        }
    }

    match partial.len() {
        0 => Err(Error::not_found(T::KIND, search)),
        1 => Ok(partial.remove(0)),
        count => Err(Error::MultipleMatches {
            kind: T::KIND.to_string(),
            search: search.to_string(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lb(id: &str, hostname: &str) -> LoadBalancer {
        LoadBalancer {
            id: id.to_string(),
            hostname: hostname.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_id_wins_over_partial() {
        let items = vec![lb("abc-1", "web"), lb("abc", "api")];
        let found = find_match(items, "abc").unwrap();
        assert_eq!(found.hostname, "api");
    }

    #[test]
    fn test_exact_hostname_match() {
        let items = vec![lb("1", "frontend"), lb("2", "backend")];
        assert_eq!(find_match(items, "backend").unwrap().id, "2");
    }

    #[test]
    fn test_unique_partial_match() {
        let items = vec![lb("1", "frontend"), lb("2", "backend")];
        assert_eq!(find_match(items, "front").unwrap().id, "1");
    }

    #[test]
    fn test_ambiguous_partial_match() {
        let items = vec![lb("1", "frontend"), lb("2", "backend")];
        let err = find_match(items, "end").unwrap_err();
        assert!(matches!(err, Error::MultipleMatches { count: 2, .. }));
    }

    #[test]
    fn test_no_match_is_not_found() {
        let items = vec![lb("1", "frontend")];
        assert!(find_match(items, "nothing").unwrap_err().is_not_found());
        assert!(find_match(Vec::<LoadBalancer>::new(), "").unwrap_err().is_not_found());
    }

    #[test]
    fn test_new_without_token() {
        let client = CivoClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.region(), "LON1");
    }
}
