//! `caseflow ping`: check that Jenkins is reachable with the configured credentials.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use caseflow_core::Config;
use caseflow_trigger::JenkinsClient;

/// Arguments for `caseflow ping`.
#[derive(Args, Debug)]
pub struct PingArgs {}

impl PingArgs {
    pub fn run(self, config: Config) -> Result<()> {
        let client = JenkinsClient::from_config(&config.jenkins)
            .context("cannot build Jenkins client")?;
        let status = client.check_connection();
        if !status.connected {
            bail!("{} ({})", status.message, client.base());
        }
        println!("{} {} ({})", "✓".green(), status.message, client.base());
        Ok(())
    }
}
