use thiserror::Error;
use tracing::{debug, info};

use crate::{
    balance::{BalanceStore, DEFAULT_GRANT},
    command::{CommandError, Role, SuggestCommand},
    ledger::{Decision, LedgerError, TransferLedger},
    session::Session,
    storage::{Storage, StorageError, TOKENS_KEY, USERS_KEY, read_json, write_json},
    transfer::{Transfer, TransferId},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The application state container.
///
/// Owns the storage adapter, the session and the two collections, hydrated
/// once at [`open`](TokenApp::open). Every mutating operation stages its
/// changes on copies of the affected collections, persists them, and only
/// then commits. An operation that returns an error has touched nothing,
/// in memory or in storage.
#[derive(Debug)]
pub struct TokenApp<S> {
    storage: S,
    session: Session,
    balances: BalanceStore,
    ledger: TransferLedger,
    default_grant: u64,
}

impl<S: Storage> TokenApp<S> {
    pub fn open(storage: S) -> Result<Self, AppError> {
        Self::with_default_grant(storage, DEFAULT_GRANT)
    }

    pub fn with_default_grant(storage: S, default_grant: u64) -> Result<Self, AppError> {
        let users = read_json(&storage, USERS_KEY)?.unwrap_or_default();
        let transfers: Vec<Transfer> = read_json(&storage, TOKENS_KEY)?.unwrap_or_default();
        let session = Session::hydrate(&storage)?;
        let balances = BalanceStore::from_records(users);
        debug!(
            users = balances.records().len(),
            transfers = transfers.len(),
            "hydrated application state"
        );
        Ok(Self {
            storage,
            session,
            balances,
            ledger: TransferLedger::from_records(transfers),
            default_grant,
        })
    }

    /// Logs `username` in, creating their balance record on first sight.
    /// Returns the user's balance.
    pub fn login(&mut self, username: &str) -> Result<u64, AppError> {
        if username.is_empty() {
            return Err(CommandError::MissingUsername { role: Role::Account }.into());
        }
        let balance = self.ensure_user(username)?;
        self.session.login(&mut self.storage, username)?;
        info!(username, balance, "logged in");
        Ok(balance)
    }

    pub fn logout(&mut self) -> Result<(), AppError> {
        self.session.logout(&mut self.storage)?;
        info!("logged out");
        Ok(())
    }

    pub fn current_user(&self) -> Option<&str> {
        self.session.current_user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Creates a balance record for `username` unless one exists, crediting
    /// approved transfers received before registration on top of the default
    /// grant. Returns the balance either way.
    pub fn ensure_user(&mut self, username: &str) -> Result<u64, AppError> {
        if username.is_empty() {
            return Err(CommandError::MissingUsername { role: Role::Account }.into());
        }
        if self.balances.contains(username) {
            return Ok(self.balances.balance_of(username));
        }
        let mut balances = self.balances.clone();
        let balance = balances.ensure_user(username, self.ledger.transfers(), self.default_grant);
        write_json(&mut self.storage, USERS_KEY, balances.records())?;
        self.balances = balances;
        info!(username, balance, "created user record");
        Ok(balance)
    }

    /// The user's balance; zero for users without a record.
    pub fn balance_of(&self, username: &str) -> u64 {
        self.balances.balance_of(username)
    }

    /// Unconditionally overwrites a user's balance and persists the user
    /// collection.
    pub fn set_balance(&mut self, username: &str, balance: u64) -> Result<(), AppError> {
        if username.is_empty() {
            return Err(CommandError::MissingUsername { role: Role::Account }.into());
        }
        let mut balances = self.balances.clone();
        balances.set_balance(username, balance);
        write_json(&mut self.storage, USERS_KEY, balances.records())?;
        self.balances = balances;
        Ok(())
    }

    /// Records a new pending transfer and returns its id.
    pub fn suggest(&mut self, command: SuggestCommand) -> Result<TransferId, AppError> {
        let mut ledger = self.ledger.clone();
        let id = ledger.suggest(command)?;
        write_json(&mut self.storage, TOKENS_KEY, ledger.transfers())?;
        self.ledger = ledger;
        info!(id, "transfer suggested");
        Ok(id)
    }

    /// Approves a pending transfer and moves the tokens, as one
    /// all-or-nothing update of both collections. The sender's balance is
    /// checked at approval time, not at suggestion time.
    pub fn approve(&mut self, id: TransferId, approver: &str) -> Result<(), AppError> {
        if approver.is_empty() {
            return Err(CommandError::MissingUsername {
                role: Role::Approver,
            }
            .into());
        }
        let mut ledger = self.ledger.clone();
        let transfer = ledger.resolve(id, approver, Decision::Approve)?;

        let mut balances = self.balances.clone();
        let sender_balance = balances.balance_of(&transfer.sender);
        if sender_balance < transfer.token_amount {
            return Err(LedgerError::InsufficientBalance {
                sender: transfer.sender,
                balance: sender_balance,
                amount: transfer.token_amount,
            }
            .into());
        }
        balances.set_balance(&transfer.sender, sender_balance - transfer.token_amount);
        let recipient_balance = balances.balance_of(&transfer.recipient);
        balances.set_balance(&transfer.recipient, recipient_balance + transfer.token_amount);

        write_json(&mut self.storage, USERS_KEY, balances.records())?;
        write_json(&mut self.storage, TOKENS_KEY, ledger.transfers())?;
        self.balances = balances;
        self.ledger = ledger;
        info!(id, approver, "transfer approved");
        Ok(())
    }

    /// Rejects a pending transfer. Balances are not touched.
    pub fn reject(&mut self, id: TransferId, approver: &str) -> Result<(), AppError> {
        if approver.is_empty() {
            return Err(CommandError::MissingUsername {
                role: Role::Approver,
            }
            .into());
        }
        let mut ledger = self.ledger.clone();
        ledger.resolve(id, approver, Decision::Reject)?;
        write_json(&mut self.storage, TOKENS_KEY, ledger.transfers())?;
        self.ledger = ledger;
        info!(id, approver, "transfer rejected");
        Ok(())
    }

    /// The full transfer history in insertion order.
    pub fn transfers(&self) -> &[Transfer] {
        self.ledger.transfers()
    }

    pub fn balances(&self) -> &BalanceStore {
        &self.balances
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        storage::in_memory::MemoryStorage,
        transfer::TransferStatus,
    };

    fn open_app() -> TokenApp<MemoryStorage> {
        TokenApp::open(MemoryStorage::new()).unwrap()
    }

    fn suggest(app: &mut TokenApp<MemoryStorage>, sender: &str, recipient: &str, amount: u64) -> TransferId {
        app.suggest(SuggestCommand {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
        })
        .unwrap()
    }

    #[test]
    fn login_grants_default_balance() {
        let mut app = open_app();
        assert_eq!(app.login("alice").unwrap(), 10);
        assert_eq!(app.current_user(), Some("alice"));
        assert_eq!(app.balance_of("alice"), 10);

        // a second login keeps the stored balance
        app.set_balance("alice", 3).unwrap();
        assert_eq!(app.login("alice").unwrap(), 3);
    }

    #[test]
    fn approve_moves_tokens() {
        let mut app = open_app();
        app.login("alice").unwrap();
        let id = suggest(&mut app, "alice", "bob", 4);

        app.approve(id, "alice").unwrap();
        assert_eq!(app.balance_of("alice"), 6);
        assert_eq!(app.balance_of("bob"), 4);

        let transfer = &app.transfers()[id];
        assert_eq!(transfer.status, TransferStatus::Approved);
        assert_eq!(transfer.approver, "alice");
        // the recipient's record was created by the approval
        assert!(app.balances().contains("bob"));
    }

    #[test]
    fn insufficient_balance_leaves_transfer_pending() {
        let mut app = open_app();
        app.login("alice").unwrap();
        let id = suggest(&mut app, "alice", "bob", 20);

        let err = app.approve(id, "carol").unwrap_err();
        assert!(matches!(
            err,
            AppError::Ledger(LedgerError::InsufficientBalance {
                balance: 10,
                amount: 20,
                ..
            })
        ));
        assert_eq!(app.transfers()[id].status, TransferStatus::Pending);
        assert_eq!(app.balance_of("alice"), 10);
        assert_eq!(app.balance_of("bob"), 0);

        // the persisted history still shows the transfer as pending
        let resumed = TokenApp::open(app.storage().clone()).unwrap();
        assert_eq!(resumed.transfers()[id].status, TransferStatus::Pending);
    }

    #[test]
    fn reject_leaves_balances_alone() {
        let mut app = open_app();
        app.login("alice").unwrap();
        let id = suggest(&mut app, "alice", "bob", 4);

        app.reject(id, "alice").unwrap();
        let transfer = &app.transfers()[id];
        assert_eq!(transfer.status, TransferStatus::Rejected);
        assert_eq!(transfer.approver, "alice");
        assert_eq!(app.balance_of("alice"), 10);
        assert_eq!(app.balance_of("bob"), 0);
    }

    #[test]
    fn double_resolution_keeps_first_outcome() {
        let mut app = open_app();
        app.login("alice").unwrap();
        let id = suggest(&mut app, "alice", "bob", 4);
        app.approve(id, "alice").unwrap();

        let err = app.reject(id, "bob").unwrap_err();
        assert!(matches!(
            err,
            AppError::Ledger(LedgerError::AlreadyResolved {
                status: TransferStatus::Approved,
                ..
            })
        ));
        let err = app.approve(id, "bob").unwrap_err();
        assert!(matches!(err, AppError::Ledger(LedgerError::AlreadyResolved { .. })));

        // balances moved exactly once
        assert_eq!(app.balance_of("alice"), 6);
        assert_eq!(app.balance_of("bob"), 4);
    }

    #[test]
    fn approvals_conserve_total_supply() {
        let mut app = open_app();
        app.login("alice").unwrap();
        app.login("bob").unwrap();
        assert_eq!(app.balances().total_supply(), 20);

        let first = suggest(&mut app, "alice", "bob", 7);
        app.approve(first, "carol").unwrap();
        let second = suggest(&mut app, "bob", "alice", 2);
        app.approve(second, "carol").unwrap();

        assert_eq!(app.balances().total_supply(), 20);
        assert_eq!(app.balance_of("alice"), 5);
        assert_eq!(app.balance_of("bob"), 15);
    }

    #[test]
    fn ensure_user_credits_history_received_before_registration() {
        let mut app = open_app();
        app.login("alice").unwrap();
        let id = suggest(&mut app, "alice", "bob", 5);
        app.approve(id, "alice").unwrap();

        // bob already holds the approved 5; registering must not double-credit
        assert_eq!(app.balance_of("bob"), 5);
        assert_eq!(app.ensure_user("bob").unwrap(), 5);

        // carol registers after receiving an approved transfer without a record:
        // seed storage where only the history mentions her
        let mut storage = MemoryStorage::new();
        write_json(
            &mut storage,
            TOKENS_KEY,
            &vec![Transfer {
                sender: "alice".to_string(),
                recipient: "carol".to_string(),
                token_amount: 5,
                status: TransferStatus::Approved,
                approver: "alice".to_string(),
            }],
        )
        .unwrap();
        let mut app = TokenApp::open(storage).unwrap();
        assert_eq!(app.ensure_user("carol").unwrap(), 15);
    }

    #[test]
    fn suggest_rejects_invalid_commands() {
        let mut app = open_app();
        app.login("alice").unwrap();

        let err = app
            .suggest(SuggestCommand {
                sender: "alice".to_string(),
                recipient: "alice".to_string(),
                amount: 4,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Command(CommandError::SenderIsRecipient)
        ));
        assert!(app.transfers().is_empty());
    }

    #[test]
    fn resolving_needs_an_approver() {
        let mut app = open_app();
        app.login("alice").unwrap();
        let id = suggest(&mut app, "alice", "bob", 4);

        let err = app.approve(id, "").unwrap_err();
        assert!(matches!(
            err,
            AppError::Command(CommandError::MissingUsername {
                role: Role::Approver
            })
        ));
        assert_eq!(app.transfers()[id].status, TransferStatus::Pending);
    }

    #[test]
    fn session_survives_rehydration() {
        let mut app = open_app();
        app.login("alice").unwrap();

        let resumed = TokenApp::open(app.storage().clone()).unwrap();
        assert_eq!(resumed.current_user(), Some("alice"));

        app.logout().unwrap();
        let resumed = TokenApp::open(app.storage().clone()).unwrap();
        assert_eq!(resumed.current_user(), None);
    }

    #[test]
    fn persisted_collections_use_the_wire_format() {
        let mut app = open_app();
        app.login("alice").unwrap();
        let id = suggest(&mut app, "alice", "bob", 4);
        app.approve(id, "alice").unwrap();

        let users: serde_json::Value =
            serde_json::from_str(&app.storage().get(USERS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            users,
            json!([
                { "username": "alice", "tokenBalance": 6 },
                { "username": "bob", "tokenBalance": 4 },
            ])
        );

        let transfers: serde_json::Value =
            serde_json::from_str(&app.storage().get(TOKENS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(
            transfers,
            json!([{
                "sender": "alice",
                "recipient": "bob",
                "tokenAmount": 4,
                "status": "approved",
                "approver": "alice",
            }])
        );
    }
}
