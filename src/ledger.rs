use thiserror::Error;

use crate::{
    command::{CommandError, SuggestCommand},
    transfer::{Transfer, TransferId, TransferStatus},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("No transfer exists with id {0}")]
    NotFound(TransferId),
    #[error("Transfer {id} cannot be resolved, because it is already {status}")]
    AlreadyResolved { id: TransferId, status: TransferStatus },
    #[error("`{sender}` holds {balance} tokens, which is not enough to send {amount}")]
    InsufficientBalance {
        sender: String,
        balance: u64,
        amount: u64,
    },
}

/// How a pending transfer gets resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// The ordered transfer history.
///
/// Appends only; a transfer's status moves away from pending at most once
/// and terminal states are immutable. Identity is the insertion index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferLedger {
    transfers: Vec<Transfer>,
}

impl TransferLedger {
    pub fn from_records(transfers: Vec<Transfer>) -> Self {
        Self { transfers }
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn get(&self, id: TransferId) -> Result<&Transfer, LedgerError> {
        self.transfers.get(id).ok_or(LedgerError::NotFound(id))
    }

    /// Validates the command and appends a new pending transfer, returning
    /// its id.
    pub fn suggest(&mut self, command: SuggestCommand) -> Result<TransferId, CommandError> {
        command.validate()?;
        let id = self.transfers.len();
        self.transfers
            .push(Transfer::pending(command.sender, command.recipient, command.amount));
        Ok(id)
    }

    /// Moves a pending transfer to its terminal state and records who
    /// resolved it. Returns a snapshot of the updated record.
    pub fn resolve(
        &mut self,
        id: TransferId,
        approver: &str,
        decision: Decision,
    ) -> Result<Transfer, LedgerError> {
        let transfer = self
            .transfers
            .get_mut(id)
            .ok_or(LedgerError::NotFound(id))?;
        if !transfer.is_pending() {
            return Err(LedgerError::AlreadyResolved {
                id,
                status: transfer.status,
            });
        }
        transfer.status = match decision {
            Decision::Approve => TransferStatus::Approved,
            Decision::Reject => TransferStatus::Rejected,
        };
        transfer.approver = approver.to_string();
        Ok(transfer.clone())
    }
}
