use std::collections::hash_map::Entry;

use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    errors::Error,
    types::{Account, AccountId, MemoryLedger, PaymentSystem, DECIMAL_SCALE},
};

impl Account {
    /// Adds funds to the account's balance.
    fn credit(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    /// Subtracts funds from the account's balance.
    ///
    /// Callers check that the balance covers the amount first.
    fn debit(&mut self, amount: Decimal) {
        self.balance -= amount;
    }
}

/// Rejects negative amounts and brings the rest to [`DECIMAL_SCALE`].
///
/// This is the only place amounts are rescaled, whichever way they entered the ledger.
fn checked_amount(mut amount: Decimal) -> Result<Decimal, Error> {
    if amount < Decimal::ZERO {
        return Err(Error::InvalidAmount(amount));
    }
    amount.rescale(DECIMAL_SCALE);
    // Too large to carry every decimal, so no balance could hold it exactly
    if amount.scale() < DECIMAL_SCALE {
        return Err(Error::AmountOverflow);
    }
    Ok(amount)
}

/// Adds two amounts without losing any of the [`DECIMAL_SCALE`] decimals.
///
/// Near its upper range [`Decimal`] rounds a sum to fewer decimals instead of failing,
/// so a sum that comes back with a smaller scale counts as an overflow.
fn checked_sum(balance: Decimal, amount: Decimal) -> Result<Decimal, Error> {
    balance
        .checked_add(amount)
        .filter(|sum| sum.scale() >= DECIMAL_SCALE)
        .ok_or(Error::AmountOverflow)
}

pub(crate) fn open_account<L>(ledger: &mut L, id: AccountId) -> Result<(), Error>
where
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    if ledger.account(id.as_ref()).is_some() {
        return Err(Error::AccountExists(id));
    }
    debug!(account = %id, "opening account");
    ledger.insert_account(Account::new(id))
}

/// Credits one of the reserved accounts. Emission and destruction both only ever accumulate.
pub(crate) fn credit_reserved<L>(
    ledger: &mut L,
    reserved: &AccountId,
    amount: Decimal,
) -> Result<(), Error>
where
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    let amount = checked_amount(amount)?;
    let account = ledger
        .account_mut(reserved.as_ref())
        .ok_or_else(|| Error::AccountNotFound(reserved.clone()))?;
    account.balance = checked_sum(account.balance, amount)?;
    debug!(account = %reserved, %amount, balance = %account.balance, "credited reserved account");
    Ok(())
}

/// Does the work of moving funds from one account to another.
///
/// Every check runs before the first mutation, and neither mutation can fail, so a
/// rejected transfer leaves all balances exactly as they were.
pub(crate) fn transfer_money<L>(
    ledger: &mut L,
    from: &str,
    to: &str,
    amount: Decimal,
) -> Result<(), Error>
where
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    let amount = checked_amount(amount)?;
    let source_balance = ledger
        .account(from)
        .filter(|source| source.active && source.balance >= amount)
        .map(Account::balance)
        .ok_or_else(|| Error::InvalidSourceAccount(from.into()))?;
    let destination_balance = ledger
        .account(to)
        .filter(|destination| destination.active)
        .map(Account::balance)
        .ok_or_else(|| Error::InvalidDestinationAccount(to.into()))?;
    if source_balance < amount {
        return Err(Error::InvalidSourceAccount(from.into()));
    }
    // A self-transfer credits the already debited balance
    let credited_balance = if from == to {
        source_balance - amount
    } else {
        destination_balance
    };
    checked_sum(credited_balance, amount)?;

    // Both accounts were resolved above, so neither lookup below misses
    ledger
        .account_mut(from)
        .ok_or_else(|| Error::InvalidSourceAccount(from.into()))?
        .debit(amount);
    ledger
        .account_mut(to)
        .ok_or_else(|| Error::InvalidDestinationAccount(to.into()))?
        .credit(amount);
    debug!(%from, %to, %amount, "transferred funds");
    Ok(())
}

pub(crate) fn set_active<L>(ledger: &mut L, id: &str, active: bool) -> Result<(), Error>
where
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    if ledger.emission_account().as_ref() == id || ledger.destruction_account().as_ref() == id {
        return Err(Error::ReservedAccount(id.into()));
    }
    let account = ledger
        .account_mut(id)
        .ok_or_else(|| Error::AccountNotFound(id.into()))?;
    account.active = active;
    debug!(account = %id, active, "changed account status");
    Ok(())
}

pub(crate) fn total_balance<L>(ledger: &L) -> Result<Decimal, Error>
where
    L: PaymentSystem,
    for<'a> &'a L: IntoIterator<Item = &'a Account>,
{
    ledger
        .into_iter()
        .try_fold(Decimal::new(0, DECIMAL_SCALE), |total, account| {
            checked_sum(total, account.balance)
        })
}

impl PaymentSystem for MemoryLedger {
    fn emission_account(&self) -> &AccountId {
        &self.emission_account
    }

    fn destruction_account(&self) -> &AccountId {
        &self.destruction_account
    }

    fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    fn account_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.get_mut(id)
    }

    fn insert_account(&mut self, account: Account) -> Result<(), Error> {
        match self.accounts.entry(account.id.clone()) {
            Entry::Occupied(entry) => Err(Error::AccountExists(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(account);
                Ok(())
            }
        }
    }
}

impl<'a> IntoIterator for &'a MemoryLedger {
    type Item = &'a Account;

    type IntoIter = std::collections::hash_map::Values<'a, AccountId, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.accounts.values()
    }
}

impl IntoIterator for MemoryLedger {
    type Item = Account;
    type IntoIter = std::collections::hash_map::IntoValues<AccountId, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.accounts.into_values()
    }
}
