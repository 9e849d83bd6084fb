//! Common datatypes supporting functions throughout the ledger

use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap},
    fmt::Display,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::Error, io, ops};

/// The number of decimals to track for all amounts
pub const DECIMAL_SCALE: u32 = 4;

/// The largest balance an account can hold while keeping [`DECIMAL_SCALE`] decimals
pub const MAX_BALANCE: Decimal =
    Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, DECIMAL_SCALE);

/// Well-known identifier of the account that receives newly emitted money
pub const EMISSION_ACCOUNT_ID: &str = "BY00EMIS00000000000000000000";

/// Well-known identifier of the account that accumulates destroyed money
pub const DESTRUCTION_ACCOUNT_ID: &str = "BY99DEST00000000000000000000";

/// Unique identifier for an account, usually IBAN-like
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct AccountId(String);

impl From<&str> for AccountId {
    fn from(account_id: &str) -> Self {
        Self(account_id.to_owned())
    }
}

impl From<String> for AccountId {
    fn from(account_id: String) -> Self {
        Self(account_id)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AccountId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to move money between two accounts, as received from the outside world.
///
/// Decoded from JSON in this form:
/// ```json
/// {"from": "BY00EMIS00000000000000000000", "to": "BY12345678901234567890123456", "amount": 500}
/// ```
/// The amount may be a JSON number or a decimal string. Unknown fields are rejected.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransferRequest {
    /// Account the money is taken from
    pub from: AccountId,
    /// Account the money is moved to
    pub to: AccountId,
    /// The amount to move, as sent. The ledger brings it to [`DECIMAL_SCALE`] when applying it.
    pub amount: Decimal,
}

/// State of a single account in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// The unique identifier for the account
    pub(crate) id: AccountId,
    /// Funds held by the account.
    ///
    /// Transfers never take this below zero.
    #[serde(with = "rust_decimal::serde::float")]
    pub(crate) balance: Decimal,
    /// Inactive accounts can neither send nor receive transfers
    pub(crate) active: bool,
}

impl Account {
    /// Creates a new, active account with a zero balance
    #[must_use]
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            balance: Decimal::new(0, DECIMAL_SCALE),
            active: true,
        }
    }

    /// Returns the unique identifier for the account
    #[must_use]
    #[inline]
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// Returns the funds held by the account
    #[must_use]
    #[inline]
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Returns whether the account may take part in transfers
    #[must_use]
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Point-in-time copy of every account in a ledger, ordered by identifier.
///
/// Serializes as a JSON object keyed by account identifier:
/// ```json
/// {"BY00EMIS00000000000000000000": {"id": "BY00EMIS00000000000000000000", "balance": 500.0, "active": true}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccountsSnapshot(BTreeMap<AccountId, Account>);

impl AccountsSnapshot {
    /// Looks up a single account in the snapshot
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Account> {
        self.0.get(id)
    }

    /// Number of accounts in the snapshot
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot holds no accounts
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the accounts in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.0.values()
    }
}

impl FromIterator<Account> for AccountsSnapshot {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|account| (account.id.clone(), account))
                .collect(),
        )
    }
}

/// Settings for a new ledger.
///
/// Every field has a default, so a partial (or empty) JSON object deserializes fine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Identifier of the account credited by [`PaymentSystem::emit_money`]
    pub emission_account: AccountId,
    /// Identifier of the account credited by [`PaymentSystem::destroy_money`]
    pub destruction_account: AccountId,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            emission_account: EMISSION_ACCOUNT_ID.into(),
            destruction_account: DESTRUCTION_ACCOUNT_ID.into(),
        }
    }
}

/// An interface to a ledger of accounts.
///
/// Implementors only supply storage; every operation is provided on top of it, so an
/// alternative backing store gets identical validation and atomicity rules.
pub trait PaymentSystem
where
    for<'a> &'a Self: IntoIterator<Item = &'a Account>,
    Self: Sized,
{
    /// Identifier of the reserved emission account
    fn emission_account(&self) -> &AccountId;

    /// Identifier of the reserved destruction account
    fn destruction_account(&self) -> &AccountId;

    /// Fetches an account, if one exists
    fn account(&self, id: &str) -> Option<&Account>;

    /// Fetches an account for modification, if one exists
    fn account_mut(&mut self, id: &str) -> Option<&mut Account>;

    /// Stores a new account.
    ///
    /// # Errors
    /// [`Error::AccountExists`] if the identifier is already taken
    fn insert_account(&mut self, account: Account) -> Result<(), Error>;

    /// Opens a new, empty, active account.
    ///
    /// # Errors
    /// [`Error::AccountExists`] if the identifier is already taken, including by a reserved account
    fn open_account(&mut self, id: impl Into<AccountId>) -> Result<(), Error> {
        ops::open_account(self, id.into())
    }

    /// Creates money by crediting the emission account.
    ///
    /// # Errors
    /// [`Error::InvalidAmount`] for negative amounts, [`Error::AmountOverflow`] if the balance would overflow
    fn emit_money(&mut self, amount: Decimal) -> Result<(), Error> {
        let account = self.emission_account().clone();
        ops::credit_reserved(self, &account, amount)
    }

    /// Records destroyed money by crediting the destruction account.
    ///
    /// # Errors
    /// [`Error::InvalidAmount`] for negative amounts, [`Error::AmountOverflow`] if the balance would overflow
    fn destroy_money(&mut self, amount: Decimal) -> Result<(), Error> {
        let account = self.destruction_account().clone();
        ops::credit_reserved(self, &account, amount)
    }

    /// Moves money between two accounts. Either both balances change or neither does.
    ///
    /// # Errors
    /// - [`Error::InvalidAmount`] for negative amounts
    /// - [`Error::InvalidSourceAccount`] if the source is missing, inactive, or short of funds
    /// - [`Error::InvalidDestinationAccount`] if the destination is missing or inactive
    /// - [`Error::AmountOverflow`] if the destination balance would overflow
    fn transfer_money(&mut self, from: &str, to: &str, amount: Decimal) -> Result<(), Error> {
        ops::transfer_money(self, from, to, amount)
    }

    /// Decodes a JSON [`TransferRequest`] and applies it with [`PaymentSystem::transfer_money`].
    ///
    /// # Errors
    /// [`Error::MalformedRequest`] if the request can't be decoded, otherwise whatever the
    /// transfer itself returns
    fn transfer_money_from_request(&mut self, request: &str) -> Result<(), Error> {
        let request = io::parse_transfer_request(request)?;
        self.transfer_money(request.from.as_ref(), request.to.as_ref(), request.amount)
    }

    /// Stops an account from sending or receiving transfers.
    ///
    /// # Errors
    /// [`Error::ReservedAccount`] for the emission and destruction accounts,
    /// [`Error::AccountNotFound`] for unknown identifiers
    fn deactivate_account(&mut self, id: &str) -> Result<(), Error> {
        ops::set_active(self, id, false)
    }

    /// Allows a deactivated account to take part in transfers again.
    ///
    /// # Errors
    /// [`Error::ReservedAccount`] for the emission and destruction accounts,
    /// [`Error::AccountNotFound`] for unknown identifiers
    fn activate_account(&mut self, id: &str) -> Result<(), Error> {
        ops::set_active(self, id, true)
    }

    /// Copies every account into an [`AccountsSnapshot`]
    fn snapshot(&self) -> AccountsSnapshot {
        self.into_iter().cloned().collect()
    }

    /// Serializes a snapshot of every account as JSON
    ///
    /// # Errors
    /// [`Error::Snapshot`] if a balance can't be represented as a JSON number
    fn accounts_info(&self) -> Result<String, Error> {
        io::accounts_info_json(self)
    }

    /// Sums the balances of every account
    ///
    /// # Errors
    /// [`Error::AmountOverflow`] if the sum exceeds the range of [`Decimal`]
    fn total_balance(&self) -> Result<Decimal, Error> {
        ops::total_balance(self)
    }
}

/// Holds all accounts in an in-memory structure.
///
/// # Limitations
/// No persistence.
///
/// Only a single operation is allowed on the entire
/// ledger at any given time.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    /// Storage for the map of account ID to account
    pub(crate) accounts: HashMap<AccountId, Account>,
    pub(crate) emission_account: AccountId,
    pub(crate) destruction_account: AccountId,
}

impl MemoryLedger {
    /// Creates a ledger holding only the default emission and destruction accounts
    #[must_use]
    pub fn new() -> Self {
        Self::with_reserved(EMISSION_ACCOUNT_ID.into(), DESTRUCTION_ACCOUNT_ID.into())
    }

    /// Creates a ledger holding only the reserved accounts named in `config`.
    ///
    /// # Errors
    /// [`Error::AccountExists`] if both reserved accounts share one identifier
    pub fn with_config(config: LedgerConfig) -> Result<Self, Error> {
        if config.emission_account == config.destruction_account {
            return Err(Error::AccountExists(config.destruction_account));
        }
        Ok(Self::with_reserved(
            config.emission_account,
            config.destruction_account,
        ))
    }

    fn with_reserved(emission_account: AccountId, destruction_account: AccountId) -> Self {
        let accounts = [emission_account.clone(), destruction_account.clone()]
            .into_iter()
            .map(|id| (id.clone(), Account::new(id)))
            .collect();
        Self {
            accounts,
            emission_account,
            destruction_account,
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}
