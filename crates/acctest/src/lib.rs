//! Civo Acceptance Test Harness
//!
//! Drives real infrastructure through Terraform and verifies it against the
//! Civo API:
//! - Renders a configuration and applies it with the `terraform` CLI
//! - Reads local state back from `terraform show -json`
//! - Runs checks against local state and the remote API
//! - Destroys everything and confirms the API no longer finds it
//!
//! # Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  TestCase                                                    │
//! │    ├── pre_check(&AccConfig)                                 │
//! │    ├── steps: [TestStep]                                     │
//! │    │     ├── Engine::apply(config) -> State                  │
//! │    │     └── StateCheck::check(&State)                       │
//! │    ├── Engine::destroy()                                     │
//! │    └── check_destroy: StateCheck (pre-destroy State)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing runs unless `TF_ACC` is set.

pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod loadbalancer;
pub mod random;
pub mod runner;
pub mod state;

pub use check::{ComposeCheck, ResourceAttr, ResourceAttrSet, StateCheck};
pub use config::AccConfig;
pub use engine::{Engine, TerraformCli};
pub use error::{AccError, AccResult};
pub use random::rand_string;
pub use runner::{precheck_civo, run, run_terraform, Outcome, TestCase, TestStep};
pub use state::{ResourceState, State};

/// Install a `tracing` subscriber for test binaries. Honours `RUST_LOG`,
/// defaulting to `info`; safe to call more than once.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
