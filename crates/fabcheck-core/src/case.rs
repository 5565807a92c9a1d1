// ── Test-case runner ──
//
// A case walks its stages in a fixed order. The first failing stage skips
// the rest, except teardown, which always runs. Teardown failures are kept
// apart from the primary result so a passing assertion followed by a
// dependency conflict on delete is reported as exactly that.

use std::fmt;

use async_trait::async_trait;
use strum::{Display, EnumIter, IntoEnumIterator};
use thiserror::Error;
use tracing::{info, warn};

use crate::builder::Destroy;
use crate::error::CoreError;
use crate::fabric::Fabric;
use crate::topology::Topology;
use crate::verify::Verifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Configure,
    PrimeReachability,
    Inject,
    Verify,
    Teardown,
}

/// A stage failed; `source` is what it returned.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct CaseError {
    pub stage: Stage,
    #[source]
    pub source: CoreError,
}

/// One or more handles could not be destroyed.
#[derive(Debug, Error)]
pub struct TeardownError {
    pub failures: Vec<(String, CoreError)>,
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "teardown failed for {} object(s)", self.failures.len())?;
        for (what, err) in &self.failures {
            write!(f, "\n  {what}: {err}")?;
        }
        Ok(())
    }
}

impl TeardownError {
    /// `true` if any failure was the controller refusing a delete because
    /// something still depends on the object.
    pub fn has_dependency_conflict(&self) -> bool {
        self.failures
            .iter()
            .any(|(_, e)| matches!(e, CoreError::DependencyConflict { .. }))
    }
}

#[derive(Debug)]
pub struct CaseOutcome {
    pub name: String,
    pub primary: Result<(), CaseError>,
    pub teardown: Result<(), TeardownError>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.primary.is_ok() && self.teardown.is_ok()
    }
}

// ── Teardown stack ───────────────────────────────────────────────────

/// Handles registered as they are built, destroyed newest first.
#[derive(Default)]
pub struct Teardown {
    stack: Vec<Box<dyn Destroy>>,
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stack.iter().map(|h| h.describe()))
            .finish()
    }
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clone of `handle` and hand the original back, so a build
    /// can be written `let t = teardown.register(tenant.build(f).await?);`.
    pub fn register<H>(&mut self, handle: H) -> H
    where
        H: Destroy + Clone + 'static,
    {
        self.stack.push(Box::new(handle.clone()));
        handle
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Destroy everything in reverse registration order. Handles the test
    /// already destroyed are skipped. A failure does not stop the rest.
    pub async fn run(&mut self, fabric: &Fabric) -> Result<(), TeardownError> {
        let mut failures = Vec::new();
        while let Some(handle) = self.stack.pop() {
            if handle.is_destroyed() {
                continue;
            }
            if let Err(e) = handle.destroy(fabric).await {
                let what = handle.describe();
                warn!(object = %what, error = %e, "teardown failed");
                failures.push((what, e));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TeardownError { failures })
        }
    }
}

// ── Scenarios ────────────────────────────────────────────────────────

/// Everything a case needs to talk to the fabric.
#[derive(Debug)]
pub struct CaseEnv {
    pub fabric: Fabric,
    pub verifier: Verifier,
    pub topology: Topology,
}

/// A test case split into stages. Only `configure` and `verify` are
/// required; the others default to doing nothing.
#[async_trait]
pub trait Scenario: Send {
    fn name(&self) -> String;

    async fn configure(&mut self, env: &CaseEnv, teardown: &mut Teardown) -> Result<(), CoreError>;

    async fn prime_reachability(&mut self, _env: &CaseEnv) -> Result<(), CoreError> {
        Ok(())
    }

    async fn inject(&mut self, _env: &CaseEnv) -> Result<(), CoreError> {
        Ok(())
    }

    async fn verify(&mut self, env: &CaseEnv) -> Result<(), CoreError>;
}

/// Runs scenarios against one environment.
#[derive(Debug)]
pub struct TestCase<'a> {
    env: &'a CaseEnv,
}

impl<'a> TestCase<'a> {
    pub fn new(env: &'a CaseEnv) -> Self {
        Self { env }
    }

    pub async fn run(&self, scenario: &mut dyn Scenario) -> CaseOutcome {
        let name = scenario.name();
        let mut teardown = Teardown::new();
        info!(case = %name, "case started");

        let primary = self.run_stages(scenario, &mut teardown).await;
        if let Err(e) = &primary {
            warn!(case = %name, stage = %e.stage, error = %e.source, "case failed");
        }

        info!(case = %name, stage = %Stage::Teardown, objects = teardown.len(), "stage");
        let teardown = teardown.run(&self.env.fabric).await;

        info!(
            case = %name,
            primary = primary.is_ok(),
            teardown = teardown.is_ok(),
            "case finished"
        );
        CaseOutcome {
            name,
            primary,
            teardown,
        }
    }

    async fn run_stages(
        &self,
        scenario: &mut dyn Scenario,
        teardown: &mut Teardown,
    ) -> Result<(), CaseError> {
        let env = self.env;
        for stage in Stage::iter().filter(|s| *s != Stage::Teardown) {
            info!(case = %scenario.name(), %stage, "stage");
            let result = match stage {
                Stage::Configure => scenario.configure(env, teardown).await,
                Stage::PrimeReachability => scenario.prime_reachability(env).await,
                Stage::Inject => scenario.inject(env).await,
                Stage::Verify => scenario.verify(env).await,
                Stage::Teardown => Ok(()),
            };
            result.map_err(|source| CaseError { stage, source })?;
        }
        Ok(())
    }
}
