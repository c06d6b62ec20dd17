//! Apply/destroy engine - drives the terraform CLI in a scratch directory

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::AccConfig;
use crate::error::{AccError, AccResult};
use crate::state::State;

/// Something that can turn a configuration into real infrastructure and
/// tear it down again.
#[async_trait]
pub trait Engine: Send {
    /// Apply `config` and return the resulting local state
    async fn apply(&mut self, config: &str) -> AccResult<State>;

    /// Current local state, including resources left by a failed apply
    async fn state(&mut self) -> AccResult<State>;

    /// Destroy everything applied so far
    async fn destroy(&mut self) -> AccResult<()>;
}

/// Engine backed by the `terraform` binary
pub struct TerraformCli {
    binary: PathBuf,
    workdir: TempDir,
    provider_block: String,
    token: String,
    initialized: bool,
}

impl TerraformCli {
    pub fn new(config: &AccConfig) -> AccResult<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("civo-acc-")
            .disable_cleanup(config.keep_workdir)
            .tempdir()?;

        info!("Terraform working directory: {}", workdir.path().display());

        Ok(Self {
            binary: config.terraform_path.clone(),
            workdir,
            provider_block: provider_block(config),
            token: config.client.token.clone(),
            initialized: false,
        })
    }

    pub fn working_dir(&self) -> &Path {
        self.workdir.path()
    }

    async fn run(&self, args: &[&str]) -> AccResult<Vec<u8>> {
        let command = args.first().copied().unwrap_or_default().to_string();
        debug!("terraform {}", args.join(" "));

        let output = Command::new(&self.binary)
            .args(args)
            .arg("-no-color")
            .current_dir(self.working_dir())
            .env("TF_IN_AUTOMATION", "1")
            .env("CIVO_TOKEN", &self.token)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AccError::PreCheck(format!(
                    "terraform binary not found at {} (set TF_ACC_TERRAFORM_PATH)",
                    self.binary.display()
                )),
                _ => AccError::Io(e),
            })?;

        if !output.status.success() {
            return Err(AccError::Engine {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl Engine for TerraformCli {
    async fn apply(&mut self, config: &str) -> AccResult<State> {
        tokio::fs::write(self.working_dir().join("provider.tf"), &self.provider_block).await?;
        tokio::fs::write(self.working_dir().join("main.tf"), config).await?;

        if !self.initialized {
            self.run(&["init", "-input=false"]).await?;
            self.initialized = true;
        }

        self.run(&["apply", "-auto-approve", "-input=false"]).await?;
        self.state().await
    }

    async fn state(&mut self) -> AccResult<State> {
        if !self.initialized {
            return Ok(State::default());
        }
        let show = self.run(&["show", "-json"]).await?;
        State::from_show_json(&show)
    }

    async fn destroy(&mut self) -> AccResult<()> {
        if !self.initialized {
            return Ok(());
        }
        self.run(&["destroy", "-auto-approve", "-input=false"]).await?;
        Ok(())
    }
}

/// `terraform` and `provider` blocks pinning the provider under test
pub fn provider_block(config: &AccConfig) -> String {
    let version = config
        .provider_version
        .as_deref()
        .map(|v| format!("\n      version = \"{}\"", v))
        .unwrap_or_default();

    format!(
        r#"terraform {{
  required_providers {{
    civo = {{
      source  = "{source}"{version}
    }}
  }}
}}

provider "civo" {{
  region = "{region}"
}}
"#,
        source = config.provider_source,
        version = version,
        region = config.client.region,
    )
}
