//! Test case runner: pre-check, apply each step, check, destroy, check destroy

use std::time::Instant;

use tracing::{error, info, warn};

use crate::check::StateCheck;
use crate::config::AccConfig;
use crate::engine::{Engine, TerraformCli};
use crate::error::{AccError, AccResult};
use crate::state::State;

pub type PreCheckFn = Box<dyn Fn(&AccConfig) -> AccResult<()> + Send + Sync>;

/// One configuration to apply and the checks to run afterwards
pub struct TestStep {
    pub config: String,
    pub check: Option<Box<dyn StateCheck>>,
}

impl TestStep {
    pub fn new(config: impl Into<String>) -> Self {
        Self {
            config: config.into(),
            check: None,
        }
    }

    pub fn check(mut self, check: impl StateCheck + 'static) -> Self {
        self.check = Some(Box::new(check));
        self
    }
}

/// A full acceptance scenario
#[derive(Default)]
pub struct TestCase {
    pub name: String,
    pub pre_check: Option<PreCheckFn>,
    pub steps: Vec<TestStep>,
    pub check_destroy: Option<Box<dyn StateCheck>>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn pre_check<F>(mut self, f: F) -> Self
    where
        F: Fn(&AccConfig) -> AccResult<()> + Send + Sync + 'static,
    {
        self.pre_check = Some(Box::new(f));
        self
    }

    pub fn step(mut self, step: TestStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn check_destroy(mut self, check: impl StateCheck + 'static) -> Self {
        self.check_destroy = Some(Box::new(check));
        self
    }
}

/// How a test case ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed { steps: usize, duration_ms: u64 },
    Skipped(String),
}

/// The Civo API token must be configured
pub fn precheck_civo(config: &AccConfig) -> AccResult<()> {
    if config.client.token.trim().is_empty() {
        return Err(AccError::PreCheck(
            "CIVO_TOKEN must be set for acceptance tests".to_string(),
        ));
    }
    Ok(())
}

/// Run `case` against the terraform CLI.
pub async fn run_terraform(case: &TestCase, config: &AccConfig) -> AccResult<Outcome> {
    if !config.enabled {
        return Ok(skipped(case));
    }
    let mut engine = TerraformCli::new(config)?;
    run(case, &mut engine, config).await
}

/// Run `case` against `engine`.
///
/// Destroy runs whenever an apply was attempted, even after a failed step,
/// and the destroy check sees the engine's state read just before destroy.
/// The first error encountered is the one returned.
pub async fn run<E: Engine>(case: &TestCase, engine: &mut E, config: &AccConfig) -> AccResult<Outcome> {
    if !config.enabled {
        return Ok(skipped(case));
    }

    let start = Instant::now();
    info!("Running acceptance test: {}", case.name);

    if let Some(pre_check) = &case.pre_check {
        pre_check(config)?;
    }

    let mut last_state = State::default();
    let mut applied = false;
    let mut failure: Option<AccError> = None;

    for (i, step) in case.steps.iter().enumerate() {
        let index = i + 1;
        info!("Step {}/{}: apply", index, case.steps.len());
        applied = true;

        let result = match engine.apply(&step.config).await {
            Ok(state) => {
                last_state = state;
                match &step.check {
                    Some(check) => check.check(&last_state).await,
                    None => Ok(()),
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            error!("Step {} failed: {}", index, e);
            failure = Some(AccError::Step {
                index,
                source: Box::new(e),
            });
            break;
        }
    }

    if applied {
        // A failed apply can still leave resources behind
        let pre_destroy = match engine.state().await {
            Ok(state) => state,
            Err(e) => {
                warn!("Reading state before destroy failed, using last applied state: {}", e);
                last_state
            }
        };

        info!("Destroying resources");
        match engine.destroy().await {
            Ok(()) => {
                if let Some(check) = &case.check_destroy {
                    if let Err(e) = check.check(&pre_destroy).await {
                        error!("Destroy check failed: {}", e);
                        failure.get_or_insert(e);
                    }
                }
            }
            Err(e) => {
                warn!("Destroy failed, resources may have leaked: {}", e);
                failure.get_or_insert(e);
            }
        }
    }

    if let Some(e) = failure {
        return Err(e);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    info!("✓ {} ({} ms)", case.name, duration_ms);

    Ok(Outcome::Passed {
        steps: case.steps.len(),
        duration_ms,
    })
}

fn skipped(case: &TestCase) -> Outcome {
    let reason = "acceptance tests skipped unless TF_ACC is set".to_string();
    info!("Skipping {}: {}", case.name, reason);
    Outcome::Skipped(reason)
}
