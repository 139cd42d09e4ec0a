use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::platform::PlatformClient;
use crate::{daemon, policy};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Run => daemon::run(Arc::new(config)).await,
        Command::Beat => daemon::run_once(Arc::new(config)).await,
        Command::Status => status(&config).await,
        Command::Register { name, description } => register(&config, name, description).await,
        Command::Policy => {
            print_policy();
            Ok(())
        }
    }
}

async fn status(config: &Config) -> Result<()> {
    config.validate()?;
    let client = PlatformClient::new(
        &config.platform.base_url,
        config.platform.api_key.as_deref(),
    );
    if !client.has_api_key() {
        warn!("no platform API key configured; run `krill register` first");
        return Ok(());
    }

    let status = client.agent_status().await?;
    if status.is_claimed() {
        info!("agent is claimed and ready");
    } else {
        info!(status = %status.status, "agent is not claimed yet");
    }
    Ok(())
}

async fn register(
    config: &Config,
    name: Option<String>,
    description: Option<String>,
) -> Result<()> {
    config.validate()?;
    let client = PlatformClient::new(&config.platform.base_url, None);
    let name = name.unwrap_or_else(|| config.agent.name.clone());
    let description = description.unwrap_or_else(|| config.agent.description.clone());

    info!(name = %name, "registering agent");
    let receipt = client.register(&name, &description).await?;

    println!("registration successful");
    println!();
    println!("api key (save it now):");
    println!("  {}", receipt.agent.api_key);
    println!();
    println!("export it for the next run:");
    println!("  export KRILL_API_KEY=\"{}\"", receipt.agent.api_key);
    if let Some(claim_url) = &receipt.agent.claim_url {
        println!();
        println!("claim URL (send to your human):");
        println!("  {claim_url}");
    }
    if let Some(code) = &receipt.agent.verification_code {
        println!();
        println!("verification code: {code}");
    }
    Ok(())
}

fn print_policy() {
    println!("restricted (never executed autonomously):");
    for action in policy::restricted_actions() {
        println!("  - {action}");
    }
    println!();
    println!("confirmation required (executed, flagged for review):");
    for action in policy::confirmation_actions() {
        println!("  - {action}");
    }
    println!();
    println!("anything else is allowed.");
}
