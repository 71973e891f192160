//! Per-account aggregation of transaction rows
//!
//! Produces one row per bank account with a transaction count and a signed
//! balance, including reference accounts with zero matches. Balances are
//! accumulated as f64 for display purposes only; this is not an auditable
//! ledger total.

use crate::present::format::format_currency;
use serde_json::{json, Value};
use std::collections::HashMap;

const UNKNOWN_ACCOUNT: &str = "Unknown Account";

pub const ACCOUNT_COLUMN: &str = "Bank Account";
pub const COUNT_COLUMN: &str = "Count of Unreconciled";
pub const BALANCE_COLUMN: &str = "Balance on Xero";

/// Raw per-account totals, before any currency formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTotals {
    pub account: String,
    pub count: u64,
    pub balance: f64,
}

/// Fold transactions into per-account totals.
///
/// Reference accounts seed the map first (count 0, balance 0), so they
/// appear in the output even with no matching transactions; accounts seen
/// only in the transaction list are appended after them. Output order is
/// insertion order.
pub fn aggregate_by_account(
    reference_accounts: &[Value],
    transactions: &[Value],
) -> Vec<AccountTotals> {
    let mut totals: Vec<AccountTotals> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for account in reference_accounts {
        let name = account_label(account);
        if !index.contains_key(&name) {
            index.insert(name.clone(), totals.len());
            totals.push(AccountTotals {
                account: name,
                count: 0,
                balance: 0.0,
            });
        }
    }

    for transaction in transactions {
        let name = transaction
            .pointer("/BankAccount/Name")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_ACCOUNT)
            .to_string();
        // Unparseable amounts count as zero rather than aborting the fold.
        let amount = parse_amount(transaction.get("Total"));

        let position = *index.entry(name.clone()).or_insert_with(|| {
            totals.push(AccountTotals {
                account: name,
                count: 0,
                balance: 0.0,
            });
            totals.len() - 1
        });
        totals[position].count += 1;
        totals[position].balance += amount;
    }

    totals
}

/// Render totals as display rows with a locale-formatted currency balance.
pub fn totals_to_rows(totals: &[AccountTotals], currency: &str, locale: &str) -> Vec<Value> {
    totals
        .iter()
        .map(|t| {
            let mut row = serde_json::Map::new();
            row.insert(ACCOUNT_COLUMN.to_string(), json!(t.account));
            row.insert(COUNT_COLUMN.to_string(), json!(t.count));
            row.insert(
                BALANCE_COLUMN.to_string(),
                json!(format_currency(t.balance, currency, locale)),
            );
            Value::Object(row)
        })
        .collect()
}

fn account_label(account: &Value) -> String {
    account
        .get("Name")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            account
                .get("Code")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(UNKNOWN_ACCOUNT)
        .to_string()
}

fn parse_amount(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(account: &str, total: f64) -> Value {
        json!({"BankAccount": {"Name": account}, "Total": total})
    }

    #[test]
    fn seeds_reference_accounts_and_appends_strays() {
        let accounts = vec![json!({"Name": "A"}), json!({"Name": "B"})];
        let transactions = vec![tx("A", 10.0), tx("A", 5.0), tx("C", 2.0)];

        let totals = aggregate_by_account(&accounts, &transactions);

        assert_eq!(
            totals,
            vec![
                AccountTotals {
                    account: "A".to_string(),
                    count: 2,
                    balance: 15.0
                },
                AccountTotals {
                    account: "B".to_string(),
                    count: 0,
                    balance: 0.0
                },
                AccountTotals {
                    account: "C".to_string(),
                    count: 1,
                    balance: 2.0
                },
            ]
        );
    }

    #[test]
    fn falls_back_to_code_then_unknown_for_account_labels() {
        let accounts = vec![json!({"Code": "090"}), json!({})];
        let totals = aggregate_by_account(&accounts, &[]);
        assert_eq!(totals[0].account, "090");
        assert_eq!(totals[1].account, UNKNOWN_ACCOUNT);
    }

    #[test]
    fn transactions_without_account_land_in_unknown() {
        let transactions = vec![json!({"Total": "7.50"}), json!({"Total": "bad"})];
        let totals = aggregate_by_account(&[], &transactions);

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].account, UNKNOWN_ACCOUNT);
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[0].balance, 7.5);
    }

    #[test]
    fn string_totals_are_parsed_and_negatives_accumulate() {
        let transactions = vec![tx("A", -4.25), json!({"BankAccount": {"Name": "A"}, "Total": "1.25"})];
        let totals = aggregate_by_account(&[], &transactions);
        assert_eq!(totals[0].count, 2);
        assert!((totals[0].balance - (-3.0)).abs() < 1e-9);
    }

    #[test]
    fn rows_carry_formatted_balance_and_integer_count() {
        let totals = vec![AccountTotals {
            account: "Cheque".to_string(),
            count: 3,
            balance: 1234.5,
        }];
        let rows = totals_to_rows(&totals, "GBP", "en-GB");

        assert_eq!(rows[0][ACCOUNT_COLUMN], "Cheque");
        assert_eq!(rows[0][COUNT_COLUMN], 3);
        assert_eq!(rows[0][BALANCE_COLUMN], "£1,234.50");
    }
}
