//! API resource types

use serde::{Deserialize, Serialize};

/// A load balancer as returned by `/v2/loadbalancers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancer {
    pub id: String,
    pub default_hostname: bool,
    pub hostname: String,
    pub protocol: String,
    pub port: i64,
    pub max_request_size: i64,
    pub tls_certificate: String,
    pub tls_key: String,
    pub policy: String,
    pub health_check_path: String,
    pub fail_timeout: i64,
    pub max_conns: i64,
    pub ignore_invalid_backend_tls: bool,
    pub backends: Vec<LoadBalancerBackend>,
}

/// A backend target the load balancer forwards to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBalancerBackend {
    pub instance_id: String,
    pub protocol: String,
    pub port: i64,
}

/// A compute instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub id: String,
    pub hostname: String,
    pub status: String,
    pub size: String,
    pub region: String,
    pub public_ip: String,
}

/// Paginated instance listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaginatedInstances {
    pub page: u32,
    pub per_page: u32,
    pub pages: u32,
    pub items: Vec<Instance>,
}

/// Error envelope returned on non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub code: String,
    pub reason: String,
}

/// Anything the client can search by id or hostname
pub trait Searchable {
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn hostname(&self) -> &str;
}

impl Searchable for LoadBalancer {
    const KIND: &'static str = "loadbalancer";

    fn id(&self) -> &str {
        &self.id
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }
}

impl Searchable for Instance {
    const KIND: &'static str = "instance";

    fn id(&self) -> &str {
        &self.id
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }
}
