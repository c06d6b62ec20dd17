//! `civo_loadbalancer` fixtures and checks

use std::sync::Arc;

use async_trait::async_trait;
use civo_client::{CivoClient, LoadBalancer};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::check::{resource, StateCheck};
use crate::error::{AccError, AccResult};
use crate::state::State;

pub const LOAD_BALANCER_TYPE: &str = "civo_loadbalancer";
pub const INSTANCE_TYPE: &str = "civo_instance";

/// Remote load balancer fetched by one check and read by later ones
pub type LoadBalancerSnapshot = Arc<RwLock<Option<LoadBalancer>>>;

pub fn new_snapshot() -> LoadBalancerSnapshot {
    Arc::new(RwLock::new(None))
}

/// Template for a load balancer in front of one fresh instance
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancerConfig {
    pub resource_name: String,
    pub hostname: String,
    pub protocol: String,
    pub port: u16,
    pub max_request_size: u32,
    pub policy: String,
    pub health_check_path: String,
    pub max_conns: u32,
    pub fail_timeout: u32,
    pub backend_protocol: String,
    pub backend_port: u16,
}

impl LoadBalancerConfig {
    /// The basic scenario: plain http on port 80, round robin.
    pub fn basic(hostname: impl Into<String>) -> Self {
        Self {
            resource_name: "foobar".to_string(),
            hostname: hostname.into(),
            protocol: "http".to_string(),
            port: 80,
            max_request_size: 30,
            policy: "round_robin".to_string(),
            health_check_path: "/".to_string(),
            max_conns: 10,
            fail_timeout: 40,
            backend_protocol: "http".to_string(),
            backend_port: 80,
        }
    }

    /// State address of the load balancer
    pub fn address(&self) -> String {
        format!("{}.{}", LOAD_BALANCER_TYPE, self.resource_name)
    }

    pub fn render(&self) -> String {
        format!(
            r#"
resource "{instance_type}" "vm" {{
  hostname = "instance-{hostname}"
}}

resource "{lb_type}" "{name}" {{
  hostname          = "{hostname}"
  protocol          = "{protocol}"
  port              = {port}
  max_request_size  = {max_request_size}
  policy            = "{policy}"
  health_check_path = "{health_check_path}"
  max_conns         = {max_conns}
  fail_timeout      = {fail_timeout}
  depends_on        = [{instance_type}.vm]

  backend {{
    instance_id = {instance_type}.vm.id
    protocol    = "{backend_protocol}"
    port        = {backend_port}
  }}
}}
"#,
            instance_type = INSTANCE_TYPE,
            lb_type = LOAD_BALANCER_TYPE,
            name = self.resource_name,
            hostname = self.hostname,
            protocol = self.protocol,
            port = self.port,
            max_request_size = self.max_request_size,
            policy = self.policy,
            health_check_path = self.health_check_path,
            max_conns = self.max_conns,
            fail_timeout = self.fail_timeout,
            backend_protocol = self.backend_protocol,
            backend_port = self.backend_port,
        )
    }
}

/// The load balancer in local state exists remotely; records it in the
/// snapshot.
pub struct LoadBalancerExists {
    pub address: String,
    pub client: CivoClient,
    pub snapshot: LoadBalancerSnapshot,
}

#[async_trait]
impl StateCheck for LoadBalancerExists {
    fn name(&self) -> String {
        format!("{} exists", self.address)
    }

    async fn check(&self, state: &State) -> AccResult<()> {
        let rs = resource(state, &self.address)?;

        let lb = self
            .client
            .find_load_balancer(&rs.id)
            .await
            .map_err(|e| AccError::RemoteLookup {
                id: rs.id.clone(),
                reason: e.to_string(),
            })?;

        debug!("Found load balancer {} ({})", lb.id, lb.hostname);
        *self.snapshot.write().await = Some(lb);
        Ok(())
    }
}

/// The snapshotted load balancer carries the configured hostname
pub struct LoadBalancerValues {
    pub snapshot: LoadBalancerSnapshot,
    pub hostname: String,
}

#[async_trait]
impl StateCheck for LoadBalancerValues {
    fn name(&self) -> String {
        format!("hostname = {:?}", self.hostname)
    }

    async fn check(&self, _state: &State) -> AccResult<()> {
        let guard = self.snapshot.read().await;
        let lb = guard.as_ref().ok_or_else(|| AccError::RemoteLookup {
            id: String::new(),
            reason: "load balancer was not fetched before checking values".to_string(),
        })?;

        if lb.hostname != self.hostname {
            return Err(AccError::mismatch("hostname", &self.hostname, &lb.hostname));
        }
        Ok(())
    }
}

/// No load balancer from the pre-destroy state can still be found.
///
/// Any lookup error counts as gone. With `cleanup` set, survivors are
/// deleted before the failure is reported.
pub struct LoadBalancerDestroyed {
    pub client: CivoClient,
    pub cleanup: bool,
}

impl LoadBalancerDestroyed {
    pub fn new(client: CivoClient) -> Self {
        Self {
            client,
            cleanup: false,
        }
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

#[async_trait]
impl StateCheck for LoadBalancerDestroyed {
    fn name(&self) -> String {
        format!("{} destroyed", LOAD_BALANCER_TYPE)
    }

    async fn check(&self, state: &State) -> AccResult<()> {
        let mut first: Option<AccError> = None;

        for rs in state.resources_of_type(LOAD_BALANCER_TYPE) {
            match self.client.find_load_balancer(&rs.id).await {
                Ok(lb) => {
                    if self.cleanup {
                        warn!("Deleting leaked load balancer {} ({})", lb.id, lb.hostname);
                        if let Err(e) = self.client.delete_load_balancer(&lb.id).await {
                            warn!("Cleanup of {} failed: {}", lb.id, e);
                        }
                    }
                    first.get_or_insert(AccError::StillExists {
                        kind: "LoadBalancer".to_string(),
                        id: rs.id.clone(),
                    });
                }
                Err(e) => debug!("Load balancer {} gone: {}", rs.id, e),
            }
        }

        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Instance statuses that mean deletion is under way or done
const INSTANCE_GONE_STATUSES: &[&str] = &["DELETING", "DELETED"];

/// No instance from the pre-destroy state can still be found. Instances are
/// removed asynchronously, so one listed as deleting counts as gone.
pub struct InstanceDestroyed {
    pub client: CivoClient,
}

#[async_trait]
impl StateCheck for InstanceDestroyed {
    fn name(&self) -> String {
        format!("{} destroyed", INSTANCE_TYPE)
    }

    async fn check(&self, state: &State) -> AccResult<()> {
        for rs in state.resources_of_type(INSTANCE_TYPE) {
            if let Ok(instance) = self.client.find_instance(&rs.id).await {
                if is_gone_status(&instance.status) {
                    debug!("Instance {} is {}", instance.id, instance.status);
                    continue;
                }
                info!("Instance {} is still present ({})", instance.id, instance.status);
                return Err(AccError::StillExists {
                    kind: "Instance".to_string(),
                    id: rs.id.clone(),
                });
            }
        }
        Ok(())
    }
}

fn is_gone_status(status: &str) -> bool {
    INSTANCE_GONE_STATUSES
        .iter()
        .any(|gone| status.eq_ignore_ascii_case(gone))
}
