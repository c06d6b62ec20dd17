//! Acceptance run configuration

use std::path::PathBuf;

use civo_client::ClientConfig;

use crate::error::AccResult;

/// Settings for an acceptance run, read from the environment
#[derive(Debug, Clone)]
pub struct AccConfig {
    /// `TF_ACC` is set; acceptance tests are skipped otherwise
    pub enabled: bool,

    /// Terraform binary (`TF_ACC_TERRAFORM_PATH`)
    pub terraform_path: PathBuf,

    /// Registry source of the provider under test (`CIVO_PROVIDER_SOURCE`)
    pub provider_source: String,

    /// Version constraint for the provider (`CIVO_PROVIDER_VERSION`)
    pub provider_version: Option<String>,

    /// Leave the terraform working directory behind (`TF_ACC_KEEP_WORKDIR`)
    pub keep_workdir: bool,

    /// API connection settings
    pub client: ClientConfig,
}

impl Default for AccConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            terraform_path: PathBuf::from("terraform"),
            provider_source: "civo/civo".to_string(),
            provider_version: None,
            keep_workdir: false,
            client: ClientConfig::default(),
        }
    }
}

impl AccConfig {
    pub fn from_env() -> AccResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AccResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.enabled = non_empty("TF_ACC").is_some();
        config.keep_workdir = non_empty("TF_ACC_KEEP_WORKDIR").is_some();

        if let Some(path) = non_empty("TF_ACC_TERRAFORM_PATH") {
            config.terraform_path = PathBuf::from(path);
        }
        if let Some(source) = non_empty("CIVO_PROVIDER_SOURCE") {
            config.provider_source = source;
        }
        config.provider_version = non_empty("CIVO_PROVIDER_VERSION");

        config.client = ClientConfig::from_lookup(&lookup)?;

        Ok(config)
    }
}
