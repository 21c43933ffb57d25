//! Trust accounts and financial transactions.

use core::{fmt, str::FromStr};

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    Timestamps,
    id::DealId,
    money::{Amount, Balance, MoneyError},
};

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(i64);

        impl $name {
            /// Returns the raw row id.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from($name(id): $name) -> Self {
                id
            }
        }

        impl FromStr for $name {
            type Err = core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

ledger_id!(
    /// Identifies a trust account row.
    AccountId
);

ledger_id!(
    /// Identifies a transaction row.
    TransactionId
);

/// Operational status of a trust account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum AccountStatus {
    /// Balance mutations are accepted.
    Active,
    /// Temporarily locked.
    Frozen,
    /// Permanently closed.
    Closed,
}

/// Direction of a balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum BalanceDirection {
    /// Adds to the balance.
    Credit,
    /// Subtracts from the balance.
    Debit,
}

/// Rule violations raised by a balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    /// The account is frozen or closed.
    #[error("cannot update balance on {0} account")]
    AccountNotActive(AccountStatus),

    /// A debit exceeds the available balance.
    #[error("insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance {
        /// The current balance.
        balance: Balance,
        /// The requested debit.
        requested: Amount,
    },

    /// The credit does not fit in the decimal range.
    #[error("balance arithmetic error: {0}")]
    Arithmetic(#[from] MoneyError),
}

/// A regulated account holding funds in trust.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrustAccount {
    id: AccountId,
    account_number: String,
    holder_name: String,
    balance: Balance,
    status: AccountStatus,
    #[cfg_attr(feature = "serde", serde(flatten))]
    timestamps: Timestamps,
}

impl TrustAccount {
    /// Computes the balance that results from moving `amount` in `direction`.
    ///
    /// The account itself is not modified, the caller persists the result. A debit larger than
    /// the balance is rejected outright, never clamped.
    ///
    /// # Errors
    ///
    /// Returns [`BalanceError::AccountNotActive`] unless the account is active and
    /// [`BalanceError::InsufficientBalance`] for an overdrawing debit.
    pub fn apply(&self, direction: BalanceDirection, amount: Amount) -> Result<Balance, BalanceError> {
        if self.status != AccountStatus::Active {
            return Err(BalanceError::AccountNotActive(self.status));
        }

        match direction {
            BalanceDirection::Credit => self.balance.checked_add(amount).map_err(From::from),
            BalanceDirection::Debit => self.balance.checked_sub(amount).ok_or(
                BalanceError::InsufficientBalance { balance: self.balance, requested: amount },
            ),
        }
    }

    /// Returns the account id.
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Returns the unique account number.
    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    /// Returns the holder name.
    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    /// Returns the current balance.
    pub fn balance(&self) -> Balance {
        self.balance
    }

    /// Returns the status.
    pub fn status(&self) -> AccountStatus {
        self.status
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> Timestamps {
        self.timestamps
    }
}

/// The caller-supplied part of a new trust account.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
pub struct NewTrustAccount {
    /// Unique account number.
    account_number: String,
    /// Holder name.
    holder_name: String,
    /// Opening balance.
    initial_balance: Balance,
}

impl NewTrustAccount {
    /// Returns the account number.
    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    /// Returns the holder name.
    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    /// Returns the opening balance.
    pub fn initial_balance(&self) -> Balance {
        self.initial_balance
    }
}

/// Partial update of a trust account's holder and status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Dissolve)]
pub struct AccountPatch {
    /// New holder name.
    holder_name: Option<String>,
    /// New status.
    status: Option<AccountStatus>,
}

impl AccountPatch {
    /// Returns the new holder name.
    pub fn holder_name(&self) -> Option<&str> {
        self.holder_name.as_deref()
    }

    /// Returns the new status.
    pub fn status(&self) -> Option<AccountStatus> {
        self.status
    }
}

/// Kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum TransactionType {
    /// Funds received into trust.
    Deposit,
    /// Funds paid out.
    Payment,
    /// Funds returned.
    Refund,
    /// Agent commission.
    Commission,
    /// Correcting entry.
    Adjustment,
}

/// Processing status of a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum TransactionStatus {
    /// Awaiting settlement.
    Pending,
    /// Settled.
    #[default]
    Completed,
    /// Settlement failed.
    Failed,
    /// Reversed after settlement.
    Reversed,
}

/// An immutable record of a money movement tagged to a deal.
///
/// `deal_id` is a loose reference into the document store, no referential integrity is
/// enforced by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transaction {
    id: TransactionId,
    deal_id: DealId,
    amount: Amount,
    transaction_type: TransactionType,
    status: TransactionStatus,
    from_account: Option<String>,
    to_account: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the transaction id.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the deal the transaction is tagged to.
    pub fn deal_id(&self) -> DealId {
        self.deal_id
    }

    /// Returns the amount.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the transaction type.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Returns the status.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns the source account label.
    pub fn from_account(&self) -> Option<&str> {
        self.from_account.as_deref()
    }

    /// Returns the destination account label.
    pub fn to_account(&self) -> Option<&str> {
        self.to_account.as_deref()
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// The caller-supplied part of a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
pub struct NewTransaction {
    /// The deal the money relates to.
    deal_id: DealId,
    /// The amount moved.
    amount: Amount,
    /// The kind of movement.
    transaction_type: TransactionType,
    /// Status to record, completed unless stated otherwise.
    #[builder(default)]
    status: TransactionStatus,
    /// Source account label.
    from_account: Option<String>,
    /// Destination account label.
    to_account: Option<String>,
    /// Free-form description.
    description: Option<String>,
}

impl NewTransaction {
    /// Materializes the transaction once the store has assigned its id.
    pub fn into_transaction(self, id: TransactionId, created_at: DateTime<Utc>) -> Transaction {
        let NewTransactionDissolved {
            deal_id,
            amount,
            transaction_type,
            status,
            from_account,
            to_account,
            description,
        } = self.dissolve();

        Transaction {
            id,
            deal_id,
            amount,
            transaction_type,
            status,
            from_account,
            to_account,
            description,
            created_at,
        }
    }

    /// Returns the deal id.
    pub fn deal_id(&self) -> DealId {
        self.deal_id
    }

    /// Returns the amount.
    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Returns the transaction type.
    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Returns the status.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns the source account label.
    pub fn from_account(&self) -> Option<&str> {
        self.from_account.as_deref()
    }

    /// Returns the destination account label.
    pub fn to_account(&self) -> Option<&str> {
        self.to_account.as_deref()
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
