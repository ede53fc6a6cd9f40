use serde::{Deserialize, Serialize};

use crate::transfer::{Transfer, TransferStatus};

/// Tokens a first-time user starts with, absent other credit.
pub const DEFAULT_GRANT: u64 = 10;

/// A persisted user record. Serializes in the wire format the `users`
/// collection uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(rename = "tokenBalance")]
    pub token_balance: u64,
}

/// The username -> balance mapping.
///
/// Records keep their insertion order, which is also the order of the
/// persisted collection. Balance lookups never fail: an unknown user simply
/// holds zero tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceStore {
    users: Vec<UserRecord>,
}

impl BalanceStore {
    pub fn from_records(users: Vec<UserRecord>) -> Self {
        Self { users }
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.iter().any(|user| user.username == username)
    }

    pub fn balance_of(&self, username: &str) -> u64 {
        self.users
            .iter()
            .find(|user| user.username == username)
            .map(|user| user.token_balance)
            .unwrap_or(0)
    }

    /// Unconditionally overwrites a user's balance, creating the record if
    /// the user is unknown.
    pub fn set_balance(&mut self, username: &str, balance: u64) {
        match self.users.iter_mut().find(|user| user.username == username) {
            Some(user) => user.token_balance = balance,
            None => self.users.push(UserRecord {
                username: username.to_string(),
                token_balance: balance,
            }),
        }
    }

    /// Creates a record for `username` unless one exists, folding approved
    /// incoming transfers into the default grant. Transfers approved before
    /// the user ever registered are credited this way instead of being lost.
    ///
    /// Returns the user's balance in either case.
    pub fn ensure_user(&mut self, username: &str, history: &[Transfer], default_grant: u64) -> u64 {
        if let Some(user) = self.users.iter().find(|user| user.username == username) {
            return user.token_balance;
        }
        let balance = default_grant
            + history
                .iter()
                .filter(|transfer| {
                    transfer.recipient == username && transfer.status == TransferStatus::Approved
                })
                .map(|transfer| transfer.token_amount)
                .sum::<u64>();
        self.users.push(UserRecord {
            username: username.to_string(),
            token_balance: balance,
        });
        balance
    }

    /// Total tokens across all users. Approvals conserve this; only the
    /// initial grant increases it.
    pub fn total_supply(&self) -> u64 {
        self.users.iter().map(|user| user.token_balance).sum()
    }
}
