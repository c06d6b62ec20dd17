//! State checks run after each apply

use async_trait::async_trait;
use tracing::debug;

use crate::error::{AccError, AccResult};
use crate::state::{ResourceState, State};

/// A single assertion against applied state
#[async_trait]
pub trait StateCheck: Send + Sync {
    /// Short label used in failure messages
    fn name(&self) -> String;

    async fn check(&self, state: &State) -> AccResult<()>;
}

/// Runs checks in order and stops at the first failure
#[derive(Default)]
pub struct ComposeCheck {
    checks: Vec<Box<dyn StateCheck>>,
}

impl ComposeCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, check: impl StateCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

#[async_trait]
impl StateCheck for ComposeCheck {
    fn name(&self) -> String {
        format!("compose({})", self.checks.len())
    }

    async fn check(&self, state: &State) -> AccResult<()> {
        for (i, check) in self.checks.iter().enumerate() {
            debug!("Running check {}: {}", i + 1, check.name());
            check.check(state).await.map_err(|e| AccError::Check {
                index: i + 1,
                name: check.name(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

/// Look up a resource by address or fail with `NotInState`
pub fn resource<'a>(state: &'a State, address: &str) -> AccResult<&'a ResourceState> {
    state
        .resource(address)
        .ok_or_else(|| AccError::NotInState(address.to_string()))
}

/// Local attribute equals an expected value
pub struct ResourceAttr {
    pub address: String,
    pub key: String,
    pub value: String,
}

impl ResourceAttr {
    pub fn new(address: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
impl StateCheck for ResourceAttr {
    fn name(&self) -> String {
        format!("{}.{} = {:?}", self.address, self.key, self.value)
    }

    async fn check(&self, state: &State) -> AccResult<()> {
        let rs = resource(state, &self.address)?;
        match rs.attr(&self.key) {
            Some(got) if got == self.value => Ok(()),
            Some(got) => Err(AccError::mismatch(
                format!("{}.{}", self.address, self.key),
                &self.value,
                got,
            )),
            None => Err(AccError::mismatch(
                format!("{}.{}", self.address, self.key),
                &self.value,
                "<unset>",
            )),
        }
    }
}

/// Local attribute is present and non-empty
pub struct ResourceAttrSet {
    pub address: String,
    pub key: String,
}

impl ResourceAttrSet {
    pub fn new(address: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl StateCheck for ResourceAttrSet {
    fn name(&self) -> String {
        format!("{}.{} is set", self.address, self.key)
    }

    async fn check(&self, state: &State) -> AccResult<()> {
        let rs = resource(state, &self.address)?;
        match rs.attr(&self.key) {
            Some(v) if !v.is_empty() => Ok(()),
            _ => Err(AccError::mismatch(
                format!("{}.{}", self.address, self.key),
                "<any value>",
                "<unset>",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LB: &str = "civo_loadbalancer.foobar";

    fn state() -> State {
        State::default().with_resource(
            ResourceState::new("civo_loadbalancer", "foobar", "lb-1")
                .with_attr("protocol", "http")
                .with_attr("port", "80")
                .with_attr("tls_key", ""),
        )
    }

    #[tokio::test]
    async fn test_resource_attr_matches() {
        ResourceAttr::new(LB, "protocol", "http").check(&state()).await.unwrap();
        ResourceAttr::new(LB, "port", "80").check(&state()).await.unwrap();
    }

    #[tokio::test]
    async fn test_resource_attr_mismatch() {
        let err = ResourceAttr::new(LB, "port", "443").check(&state()).await.unwrap_err();
        match err {
            AccError::FieldMismatch { field, expected, got } => {
                assert_eq!(field, "civo_loadbalancer.foobar.port");
                assert_eq!(expected, "443");
                assert_eq!(got, "80");
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let err = ResourceAttr::new("civo_loadbalancer.other", "port", "80")
            .check(&state())
            .await
            .unwrap_err();
        assert!(matches!(err, AccError::NotInState(ref a) if a == "civo_loadbalancer.other"));
    }

    #[tokio::test]
    async fn test_attr_set() {
        ResourceAttrSet::new(LB, "id").check(&state()).await.unwrap();
        assert!(ResourceAttrSet::new(LB, "tls_key").check(&state()).await.is_err());
        assert!(ResourceAttrSet::new(LB, "missing").check(&state()).await.is_err());
    }

    #[tokio::test]
    async fn test_compose_stops_at_first_failure() {
        let check = ComposeCheck::new()
            .with(ResourceAttr::new(LB, "protocol", "http"))
            .with(ResourceAttr::new(LB, "port", "8080"))
            .with(ResourceAttr::new("civo_loadbalancer.missing", "port", "80"));
        assert_eq!(check.len(), 3);

        let err = check.check(&state()).await.unwrap_err();
        match &err {
            AccError::Check { index, source, .. } => {
                assert_eq!(*index, 2);
                assert!(matches!(**source, AccError::FieldMismatch { .. }));
            }
            other => panic!("expected check error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_compose_passes() {
        assert!(ComposeCheck::new().is_empty());
        ComposeCheck::new().check(&State::default()).await.unwrap();
    }
}
