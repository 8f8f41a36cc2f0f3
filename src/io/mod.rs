//! Script-driven I/O
//!
//! - [`script`] - CSV command format and the streaming async reader
//! - [`report`] - final account-state CSV report
//!
//! [`run_script`] wires both to a [`LedgerEngine`]: commands are applied in
//! order, rejected commands are logged with their stable error code, and the
//! final account report is written when the script ends.

pub mod report;
pub mod script;

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{error, info};

use crate::core::LedgerEngine;
use crate::types::{ErrorResponse, LedgerError};

pub use report::write_accounts_csv;
pub use script::{Command, ScriptReader};

/// Execute a CSV command script against `engine` and write the final
/// account report to `output`.
///
/// Business rejections are logged and do not abort the run; only I/O faults
/// on the script itself are fatal.
pub async fn run_script<W: Write>(
    engine: &LedgerEngine,
    input: &Path,
    output: &mut W,
) -> Result<(), LedgerError> {
    let file = tokio::fs::File::open(input).await?;
    let mut reader = ScriptReader::new(file.compat());

    // Script labels for runtime-generated transaction ids.
    let mut labels: HashMap<String, String> = HashMap::new();

    while let Some(command) = reader.next_command().await {
        apply_command(engine, command, &mut labels).await;
    }

    write_accounts_csv(&engine.all_accounts(), output)
}

/// Resolve a script label to the transaction id it was bound to, falling
/// back to the literal value.
fn resolve_label(labels: &HashMap<String, String>, transaction_id: &str) -> String {
    labels
        .get(transaction_id)
        .cloned()
        .unwrap_or_else(|| transaction_id.to_string())
}

fn log_rejection(operation: &str, error: &LedgerError) {
    let response = ErrorResponse::from(error);
    error!(
        operation,
        code = %response.error_code,
        "{}", response.error_message
    );
}

async fn apply_command(
    engine: &LedgerEngine,
    command: Command,
    labels: &mut HashMap<String, String>,
) {
    match command {
        Command::RegisterUser { name } => {
            let user = engine.register_user(&name);
            info!(user_id = user.id, name = %user.name, "registered user");
        }
        Command::CreateAccount {
            user_id,
            initial_balance,
        } => match engine.create_account(user_id, initial_balance) {
            Ok(account) => info!(
                user_id,
                account_number = %account.account_number,
                balance = account.balance,
                "created account"
            ),
            Err(e) => log_rejection("create_account", &e),
        },
        Command::CloseAccount {
            user_id,
            account_number,
        } => match engine.close_account(user_id, &account_number) {
            Ok(account) => info!(
                user_id,
                account_number = %account.account_number,
                "closed account"
            ),
            Err(e) => log_rejection("close_account", &e),
        },
        Command::ListAccounts { user_id } => match engine.accounts_for_user(user_id) {
            Ok(accounts) => {
                for account in &accounts {
                    info!(
                        user_id,
                        account_number = %account.account_number,
                        status = ?account.status,
                        balance = account.balance,
                        "account"
                    );
                }
            }
            Err(e) => log_rejection("list_accounts", &e),
        },
        Command::UseBalance { request, label } => {
            let account_number = request.account_number.clone();
            match engine.use_balance(request).await {
                Ok(confirmation) => {
                    info!(
                        account_number = %account_number,
                        transaction_id = %confirmation.transaction_id,
                        amount = confirmation.amount,
                        balance = confirmation.balance_snapshot,
                        "use balance succeeded"
                    );
                    if let Some(label) = label {
                        labels.insert(label, confirmation.transaction_id);
                    }
                }
                Err(e) => log_rejection("use_balance", &e),
            }
        }
        Command::CancelBalance(mut request) => {
            request.transaction_id = resolve_label(labels, &request.transaction_id);
            let account_number = request.account_number.clone();
            match engine.cancel_balance(request).await {
                Ok(confirmation) => info!(
                    account_number = %account_number,
                    transaction_id = %confirmation.transaction_id,
                    amount = confirmation.amount,
                    balance = confirmation.balance_snapshot,
                    "cancel balance succeeded"
                ),
                Err(e) => log_rejection("cancel_balance", &e),
            }
        }
        Command::QueryTransaction { transaction_id } => {
            let transaction_id = resolve_label(labels, &transaction_id);
            match engine.query_transaction(&transaction_id) {
                Ok(tx) => info!(
                    transaction_id = %tx.transaction_id,
                    account_number = %tx.account_number,
                    amount = tx.amount,
                    balance_snapshot = tx.balance_snapshot,
                    "transaction found"
                ),
                Err(e) => log_rejection("query_transaction", &e),
            }
        }
    }
}
