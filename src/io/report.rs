//! Final account report
//!
//! After a script run the CLI writes every account's state as CSV, sorted by
//! account number for deterministic output.

use std::io::Write;

use crate::types::{AccountStatus, AccountSummary, LedgerError};

/// Write account states as CSV to `output`.
pub fn write_accounts_csv<W: Write>(
    accounts: &[AccountSummary],
    output: &mut W,
) -> Result<(), LedgerError> {
    let mut sorted: Vec<&AccountSummary> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.account_number.cmp(&b.account_number));

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["account_number", "user_id", "status", "balance"])?;

    for account in sorted {
        let status = match account.status {
            AccountStatus::InUse => "IN_USE",
            AccountStatus::Unregistered => "UNREGISTERED",
        };
        writer.write_record([
            account.account_number.as_str(),
            &account.user_id.to_string(),
            status,
            &account.balance.to_string(),
        ])?;
    }

    writer.flush().map_err(LedgerError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(number: &str, user_id: u64, balance: u64) -> AccountSummary {
        AccountSummary {
            user_id,
            account_number: number.to_string(),
            status: AccountStatus::InUse,
            balance,
            registered_at: Utc::now(),
            unregistered_at: None,
        }
    }

    #[test]
    fn test_writes_sorted_rows() {
        let accounts = vec![
            summary("1000000001", 2, 50),
            summary("1000000000", 1, 990),
        ];
        let mut output = Vec::new();

        write_accounts_csv(&accounts, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "account_number,user_id,status,balance\n\
             1000000000,1,IN_USE,990\n\
             1000000001,2,IN_USE,50\n"
        );
    }

    #[test]
    fn test_unregistered_status_spelled_out() {
        let mut account = summary("1000000000", 1, 0);
        account.status = AccountStatus::Unregistered;
        let mut output = Vec::new();

        write_accounts_csv(&[account], &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("1000000000,1,UNREGISTERED,0"));
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let mut output = Vec::new();
        write_accounts_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account_number,user_id,status,balance\n"
        );
    }
}
