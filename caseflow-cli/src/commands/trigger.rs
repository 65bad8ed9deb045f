//! `caseflow trigger`: request a Jenkins build for selected cases.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use caseflow_core::Config;
use caseflow_trigger::{JenkinsClient, TriggerOutcome, TriggerRequest};

/// Arguments for `caseflow trigger`.
#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Comma-separated script paths (`path::Class::method` or `path::function`).
    #[arg(long, value_name = "A,B,...")]
    pub scripts: String,

    /// pytest marker expression passed to the job.
    #[arg(long)]
    pub marker: Option<String>,

    /// Job name (overrides `jenkins.job`).
    #[arg(long)]
    pub job: Option<String>,

    /// Emit the outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl TriggerArgs {
    pub fn run(self, mut config: Config) -> Result<()> {
        if let Some(job) = self.job {
            config.jenkins.job = job;
        }

        let request = TriggerRequest::from_csv(&self.scripts, self.marker);
        if request.script_paths.is_empty() {
            anyhow::bail!("--scripts must name at least one script path");
        }

        let client = JenkinsClient::from_config(&config.jenkins)
            .context("cannot build Jenkins client")?;
        let outcome = client
            .trigger(&request)
            .with_context(|| format!("failed to trigger job '{}'", client.job()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome)
                    .context("failed to serialize trigger outcome")?
            );
        } else {
            print_outcome(&outcome);
        }
        Ok(())
    }
}

fn print_outcome(outcome: &TriggerOutcome) {
    println!(
        "{} triggered '{}' (HTTP {})",
        "✓".green(),
        outcome.job,
        outcome.status
    );
    if let Some(queue_url) = &outcome.queue_url {
        match outcome.queue_id {
            Some(id) => println!("  queue item #{id}: {queue_url}"),
            None => println!("  queue item: {queue_url}"),
        }
    }
    if let Some(build_url) = &outcome.build_url {
        match outcome.build_number {
            Some(n) => println!("  build #{n}: {build_url}"),
            None => println!("  build: {build_url}"),
        }
    }
    if let Some(latest) = &outcome.latest_build {
        println!("  latest build #{}: {}", latest.number, latest.url);
    }
}
