//! Helpers for decoding transfer requests and reporting account states

use std::io::{BufRead, Write};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::{
    errors::Error,
    types::{Account, AccountId, PaymentSystem, TransferRequest},
};

/// Decodes a single JSON [`TransferRequest`].
///
/// # Errors
/// [`Error::MalformedRequest`] for invalid JSON, missing or unknown fields, or wrongly typed values
pub fn parse_transfer_request(request: &str) -> Result<TransferRequest, Error> {
    serde_json::from_str(request).map_err(Error::MalformedRequest)
}

/// Serializes every account in the ledger as a JSON object keyed by account identifier.
///
/// Output looks like this, with accounts ordered by identifier:
/// ```json
/// {"BY00EMIS00000000000000000000":{"id":"BY00EMIS00000000000000000000","balance":1000.0,"active":true}}
/// ```
pub fn accounts_info_json<L>(ledger: &L) -> Result<String, Error>
where
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    serde_json::to_string(&ledger.snapshot()).map_err(Error::Snapshot)
}

/// Outcome of loading a batch of transfer requests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Transfers that were applied
    pub applied: usize,
    /// Lines that were rejected, either malformed or refused by the ledger
    pub rejected: usize,
}

/// Applies transfer requests read as JSON lines, one [`TransferRequest`] per line.
///
/// Blank lines are skipped. A rejected transfer is logged and counted, and the
/// rest of the batch still applies.
///
/// Expects input data in this format:
/// ```json
/// {"from":"BY00EMIS00000000000000000000","to":"BY12345678901234567890123456","amount":500}
/// {"from":"BY12345678901234567890123456","to":"BY98765432109876543210987654","amount":"12.50"}
/// ```
pub fn load_transfer_requests<R, L>(reader: &mut R, ledger: &mut L) -> Result<BatchSummary, Error>
where
    R: BufRead,
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    let mut summary = BatchSummary::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match ledger.transfer_money_from_request(&line) {
            Ok(()) => summary.applied += 1,
            Err(err) => {
                warn!(line = index + 1, error = %err, "rejected transfer request");
                summary.rejected += 1;
            }
        }
    }
    Ok(summary)
}

/// Type used for serializing an [`Account`] as one CSV row.
#[derive(Serialize, Debug)]
struct AccountRow<'a> {
    /// The account's unique identifier
    id: &'a AccountId,
    /// Funds held by the account
    balance: Decimal,
    /// Whether the account takes part in transfers
    active: bool,
}

impl<'a> From<&'a Account> for AccountRow<'a> {
    fn from(account: &'a Account) -> Self {
        Self {
            id: account.id(),
            balance: account.balance(),
            active: account.is_active(),
        }
    }
}

/// Outputs the state of every account in the ledger to CSV, ordered by identifier.
///
/// Output data will be in the form:
/// ```csv
/// id,balance,active
/// BY00EMIS00000000000000000000,500.0000,true
/// BY12345678901234567890123456,500.0000,true
/// ```
pub fn write_accounts_to_csv<W, L>(writer: &mut W, ledger: &L) -> Result<(), Error>
where
    W: Write,
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    let snapshot = ledger.snapshot();
    let mut csv_writer = csv::Writer::from_writer(writer);
    for account in snapshot.iter() {
        csv_writer.serialize(AccountRow::from(account))?;
    }
    csv_writer.flush()?;
    Ok(())
}
