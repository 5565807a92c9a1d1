//! `check`: run one self-cleaning scenario against the controller.
//!
//! Scenarios here only exercise the control plane, so the verifier is
//! backed by a silent loopback dataplane over the profile's ports.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use fabcheck_config::Config;
use fabcheck_core::scenarios::{SflowBoundary, TenantRoundTrip};
use fabcheck_core::{CaseEnv, CaseOutcome, Fabric, LoopbackDataplane, Scenario, TestCase, Verifier};

use crate::cli::{CheckArgs, CheckCommand, GlobalOpts};
use crate::error::CliError;
use crate::{config, output};

#[derive(Debug, Serialize)]
struct CheckReport {
    name: String,
    passed: bool,
    failed_stage: Option<String>,
    error: Option<String>,
    teardown_failures: Vec<String>,
}

impl From<&CaseOutcome> for CheckReport {
    fn from(outcome: &CaseOutcome) -> Self {
        let (failed_stage, error) = match &outcome.primary {
            Ok(()) => (None, None),
            Err(e) => (Some(e.stage.to_string()), Some(e.source.to_string())),
        };
        let teardown_failures = match &outcome.teardown {
            Ok(()) => Vec::new(),
            Err(e) => e
                .failures
                .iter()
                .map(|(what, err)| format!("{what}: {err}"))
                .collect(),
        };
        Self {
            name: outcome.name.clone(),
            passed: outcome.passed(),
            failed_stage,
            error,
            teardown_failures,
        }
    }
}

fn detail(report: &CheckReport, color: bool) -> String {
    let mut out = format!("{}  {}", output::verdict(report.passed, color), report.name);
    if let (Some(stage), Some(error)) = (&report.failed_stage, &report.error) {
        out.push_str(&format!("\n  {stage}: {error}"));
    }
    for failure in &report.teardown_failures {
        out.push_str(&format!("\n  teardown: {failure}"));
    }
    out
}

pub async fn handle(
    fabric: &Fabric,
    cfg: &Config,
    args: CheckArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (profile, topology) = config::topology(cfg, global)?;
    let dataplane = Arc::new(LoopbackDataplane::silent(topology.dataplane_ports()));
    let env = CaseEnv {
        fabric: fabric.clone(),
        verifier: Verifier::new(dataplane, *fabric.timing()),
        topology,
    };

    let mut scenario: Box<dyn Scenario> = match args.command {
        CheckCommand::TenantRoundtrip {
            name,
            segment,
            vlan,
        } => Box::new(TenantRoundTrip::new(name).segment(segment, vlan)),
        CheckCommand::SflowBoundary { collector, device } => {
            let check = SflowBoundary::new(collector);
            Box::new(match device {
                Some(id) => check.device(id),
                None => check,
            })
        }
    };

    info!(profile = %profile, case = %scenario.name(), "running check");
    let outcome = TestCase::new(&env).run(scenario.as_mut()).await;
    let report = CheckReport::from(&outcome);

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &report,
        |r| detail(r, color),
        |r| format!("{} {}", r.name, if r.passed { "pass" } else { "fail" }),
    )?;
    output::print_output(&out, global.quiet);

    if report.passed {
        Ok(())
    } else {
        Err(CliError::CheckFailed { name: report.name })
    }
}
