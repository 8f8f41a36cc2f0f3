//! Command script parsing
//!
//! The CLI drives the engine from a CSV script with the header
//! `command,name,user_id,account_number,amount,transaction_id`. Unused
//! columns are left empty per row. Supported commands:
//!
//! | command             | fields used                                  |
//! |---------------------|----------------------------------------------|
//! | `register_user`     | `name`                                       |
//! | `create_account`    | `user_id`, `amount` (initial balance)        |
//! | `close_account`     | `user_id`, `account_number`                  |
//! | `list_accounts`     | `user_id`                                    |
//! | `use_balance`       | `user_id`, `account_number`, `amount`, optional `transaction_id` label |
//! | `cancel_balance`    | `transaction_id`, `account_number`, `amount` |
//! | `query_transaction` | `transaction_id`                             |
//!
//! Ledger transaction ids are generated at runtime, so a static script
//! cannot reference them directly. A `use_balance` row may instead carry a
//! label in its `transaction_id` column; the runner remembers the real id
//! under that label, and later `cancel_balance`/`query_transaction` rows
//! reference the label.

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use serde::Deserialize;
use tracing::warn;

use crate::types::{CancelBalanceRequest, LedgerError, UseBalanceRequest, UserId};

/// One raw CSV row, before command-specific field checks
#[derive(Debug, Clone, Deserialize)]
pub struct RawCommand {
    command: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    account_number: Option<String>,
    #[serde(default)]
    amount: Option<u64>,
    #[serde(default)]
    transaction_id: Option<String>,
}

/// A parsed script command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a user and log the assigned id
    RegisterUser { name: String },
    /// Open an account with an initial balance
    CreateAccount { user_id: UserId, initial_balance: u64 },
    /// Unregister an empty account
    CloseAccount {
        user_id: UserId,
        account_number: String,
    },
    /// Log every account a user holds
    ListAccounts { user_id: UserId },
    /// Guarded debit; `label` optionally names the resulting transaction id
    UseBalance {
        request: UseBalanceRequest,
        label: Option<String>,
    },
    /// Guarded full cancellation; `transaction_id` may be a label
    CancelBalance(CancelBalanceRequest),
    /// Ledger lookup; `transaction_id` may be a label
    QueryTransaction { transaction_id: String },
}

fn require<T>(field: Option<T>, command: &str, name: &str) -> Result<T, LedgerError> {
    field.ok_or_else(|| {
        LedgerError::invalid_request(format!("{command} requires the {name} column"))
    })
}

/// Convert a raw CSV row into a command.
///
/// Missing or unknown fields are reported as `InvalidRequest`; the runner
/// logs and skips such rows.
pub fn convert_raw_command(raw: RawCommand) -> Result<Command, LedgerError> {
    match raw.command.to_ascii_lowercase().as_str() {
        "register_user" => Ok(Command::RegisterUser {
            name: require(raw.name, "register_user", "name")?,
        }),
        "create_account" => Ok(Command::CreateAccount {
            user_id: require(raw.user_id, "create_account", "user_id")?,
            initial_balance: require(raw.amount, "create_account", "amount")?,
        }),
        "close_account" => Ok(Command::CloseAccount {
            user_id: require(raw.user_id, "close_account", "user_id")?,
            account_number: require(raw.account_number, "close_account", "account_number")?,
        }),
        "list_accounts" => Ok(Command::ListAccounts {
            user_id: require(raw.user_id, "list_accounts", "user_id")?,
        }),
        "use_balance" => Ok(Command::UseBalance {
            request: UseBalanceRequest {
                user_id: require(raw.user_id, "use_balance", "user_id")?,
                account_number: require(raw.account_number, "use_balance", "account_number")?,
                amount: require(raw.amount, "use_balance", "amount")?,
            },
            label: raw.transaction_id,
        }),
        "cancel_balance" => Ok(Command::CancelBalance(CancelBalanceRequest {
            transaction_id: require(raw.transaction_id, "cancel_balance", "transaction_id")?,
            account_number: require(raw.account_number, "cancel_balance", "account_number")?,
            amount: require(raw.amount, "cancel_balance", "amount")?,
        })),
        "query_transaction" => Ok(Command::QueryTransaction {
            transaction_id: require(raw.transaction_id, "query_transaction", "transaction_id")?,
        }),
        other => Err(LedgerError::invalid_request(format!(
            "unknown command '{other}'"
        ))),
    }
}

/// Streaming command reader over an async CSV source
pub struct ScriptReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> ScriptReader<R> {
    /// Create a reader over async CSV data.
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read the next well-formed command.
    ///
    /// Malformed rows are logged and skipped. Returns `None` at end of
    /// input.
    pub async fn next_command(&mut self) -> Option<Command> {
        let mut records = self.csv_reader.deserialize::<RawCommand>();
        loop {
            match records.next().await {
                Some(Ok(raw)) => match convert_raw_command(raw) {
                    Ok(command) => return Some(command),
                    Err(e) => warn!(error = %e, "skipping malformed script row"),
                },
                Some(Err(e)) => warn!(error = %e, "skipping unparseable script row"),
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    const HEADER: &str = "command,name,user_id,account_number,amount,transaction_id\n";

    async fn read_all(csv: &str) -> Vec<Command> {
        let mut reader = ScriptReader::new(Cursor::new(csv.as_bytes().to_vec()));
        let mut commands = vec![];
        while let Some(command) = reader.next_command().await {
            commands.push(command);
        }
        commands
    }

    #[tokio::test]
    async fn test_parses_every_command_kind() {
        let csv = format!(
            "{HEADER}\
             register_user,alice,,,,\n\
             create_account,,1,,1000,\n\
             use_balance,,1,1000000000,100,first_use\n\
             cancel_balance,,,1000000000,100,first_use\n\
             query_transaction,,,,,first_use\n\
             list_accounts,,1,,,\n\
             close_account,,1,1000000000,,\n"
        );

        let commands = read_all(&csv).await;
        assert_eq!(commands.len(), 7);
        assert_eq!(
            commands[0],
            Command::RegisterUser {
                name: "alice".to_string()
            }
        );
        assert_eq!(
            commands[1],
            Command::CreateAccount {
                user_id: 1,
                initial_balance: 1000
            }
        );
        assert_eq!(
            commands[2],
            Command::UseBalance {
                request: UseBalanceRequest {
                    user_id: 1,
                    account_number: "1000000000".to_string(),
                    amount: 100,
                },
                label: Some("first_use".to_string()),
            }
        );
        assert_eq!(commands[5], Command::ListAccounts { user_id: 1 });
        assert_eq!(
            commands[6],
            Command::CloseAccount {
                user_id: 1,
                account_number: "1000000000".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_skips_malformed_rows() {
        let csv = format!(
            "{HEADER}\
             use_balance,,,,100,\n\
             bogus_command,,,,,\n\
             register_user,bob,,,,\n"
        );

        let commands = read_all(&csv).await;
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands[0],
            Command::RegisterUser {
                name: "bob".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_script() {
        let commands = read_all(HEADER).await;
        assert!(commands.is_empty());
    }

    #[tokio::test]
    async fn test_use_balance_label_is_optional() {
        let csv = format!("{HEADER}use_balance,,1,1000000000,100,\n");
        let commands = read_all(&csv).await;
        assert!(matches!(
            &commands[0],
            Command::UseBalance { label: None, .. }
        ));
    }
}
