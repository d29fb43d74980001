//! remit - money transfer client
//!
//! Entry point. Resolves configuration from the environment, installs
//! logging, optionally performs the bearer-token handshake, then runs
//! either a single scripted transfer (`--from/--to/--amount`) or the
//! interactive prompt loop.

use anyhow::Context;

use remit::auth::get_token;
use remit::cli::run_interactive;
use remit::client::TransferSession;
use remit::config::TransferConfig;
use remit::logging::{LogSettings, init_logging};
use remit::transfer::submit_transfer;
use remit::validators::parse_amount;

// ============================================================
// COMMAND-LINE FLAGS
// ============================================================

fn get_flag(name: &str) -> Option<String> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == name && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

fn get_claim() -> String {
    get_flag("--claim").unwrap_or_else(|| "enquiry".to_string())
}

// ============================================================
// MAIN
// ============================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = LogSettings::from_env();
    let _log_guard = init_logging(&settings);

    let config = TransferConfig::from_env().context("invalid transfer configuration")?;

    // Authenticate only when credentials were supplied
    let token = match (get_flag("--username"), get_flag("--password")) {
        (Some(username), Some(password)) => {
            let token = get_token(&config, &username, &password, &get_claim())
                .await
                .context("authentication failed")?;
            Some(token)
        }
        _ => None,
    };

    // Scripted mode: one transfer, then exit
    if let (Some(from_acc), Some(to_acc), Some(amount_str)) =
        (get_flag("--from"), get_flag("--to"), get_flag("--amount"))
    {
        let amount = parse_amount(&amount_str)?;
        let session = TransferSession::new(&config)?;

        match submit_transfer(
            &session,
            &config,
            &from_acc,
            &to_acc,
            amount,
            token.as_deref(),
        )
        .await
        {
            Ok(receipt) => {
                tracing::info!(
                    transaction_id = %receipt.transaction_id,
                    "Transfer completed successfully"
                );
                println!(
                    "✓ Transfer successful! Transaction ID: {}",
                    receipt.transaction_id
                );
                return Ok(());
            }
            Err(e) => {
                tracing::error!(code = e.code(), "Transfer failed - {e}");
                println!("✗ Transfer failed: {e}");
                return Err(e.into());
            }
        }
    }

    let session = TransferSession::new(&config)?;
    run_interactive(&config, &session, token.as_deref()).await?;

    Ok(())
}
