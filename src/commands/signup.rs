use anyhow::{bail, Result};
use tracing::info;

use trialbot_core::config::AppConfig;
use trialbot_core::PollResult;
use trialbot_registration::{FlowOutcome, LogNotifier, SignupFlow};

/// One flow from the terminal; progress goes to the log
pub async fn run(config: AppConfig, name: String) -> Result<()> {
    config.validate()?;

    // terminal runs act as the operator
    let operator = config.telegram.admin_id.unwrap_or_default();
    let flow = SignupFlow::from_config(&config, operator)?;

    info!(name = %name, "running signup flow");
    let outcome = flow.run(operator, &name, &LogNotifier).await;

    let address = flow
        .registry()
        .latest(operator)
        .map(|identity| identity.address())
        .unwrap_or_else(|| "-".to_string());

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║           Signup Flow Summary                ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("  Address: {}", address);
    println!("  Outcome: {:?}", outcome);
    println!("╚══════════════════════════════════════════════╝\n");

    match outcome {
        FlowOutcome::Finished(PollResult::Confirmed) => Ok(()),
        FlowOutcome::InvalidName(reason) => bail!("invalid name: {}", reason),
        other => bail!("flow did not complete: {:?}", other),
    }
}
