//! Interactive prompt loop
//!
//! Collects source account, destination account and amount from stdin,
//! submits through one shared session, and renders the outcome. The user
//! leaves with `quit`, `exit`, `q` or end of input.

use std::io::{self, Write};

use tracing::{error, info};

use crate::client::TransferSession;
use crate::config::TransferConfig;
use crate::error::TransferError;
use crate::transfer::submit_transfer;
use crate::validators::parse_amount;

/// Print `question` and read one trimmed line. `None` means end of input.
fn prompt(question: &str) -> io::Result<Option<String>> {
    print!("{question}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Run the transfer prompt loop until the user quits.
///
/// One session serves every submission, so retries and connection reuse
/// behave the same as in scripted mode.
pub async fn run_interactive(
    config: &TransferConfig,
    session: &TransferSession,
    token: Option<&str>,
) -> io::Result<()> {
    info!("Starting money transfer client...");
    info!("API URL: {}", config.api_base_url);

    loop {
        println!("\n{}", "=".repeat(50));
        println!("Money Transfer System");
        println!("{}", "=".repeat(50));

        let Some(from_acc) = prompt("Enter source account (or 'quit' to exit): ")? else {
            break;
        };
        if matches!(from_acc.to_lowercase().as_str(), "quit" | "exit" | "q") {
            info!("Exiting money transfer client...");
            break;
        }

        let Some(to_acc) = prompt("Enter destination account: ")? else {
            break;
        };
        let Some(amount_str) = prompt("Enter amount to transfer: ")? else {
            break;
        };

        let amount = match parse_amount(&amount_str) {
            Ok(amount) => amount,
            Err(e) => {
                error!("{e}");
                continue;
            }
        };

        match submit_transfer(session, config, &from_acc, &to_acc, amount, token).await {
            Ok(receipt) => {
                info!(
                    transaction_id = %receipt.transaction_id,
                    "Transfer completed successfully"
                );
                println!(
                    "\n✓ Transfer successful! Transaction ID: {}",
                    receipt.transaction_id
                );
            }
            Err(e) if e.is_validation() => {
                error!(code = e.code(), "Validation error: {e}");
                println!("\n✗ Error: {e}");
            }
            Err(e @ TransferError::Unexpected { .. }) => {
                error!(code = e.code(), "Unexpected error in main loop: {e}");
                println!("\n✗ Unexpected error: {e}");
            }
            Err(e) => {
                error!(code = e.code(), "Transfer failed - {e}");
                println!("\n✗ Transfer failed. Please try again.");
            }
        }
    }

    println!("\nThank you for using the Money Transfer System!");
    Ok(())
}
