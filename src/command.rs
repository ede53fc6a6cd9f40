use thiserror::Error;

/// Which participant slot a username was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Account,
    Sender,
    Recipient,
    Approver,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{role:?} username is required")]
    MissingUsername { role: Role },
    #[error("A transfer id is required")]
    MissingTransferId,
    #[error("Transfer amount must be greater than zero")]
    NonPositiveAmount,
    #[error("Sender and recipient must be different users")]
    SenderIsRecipient,
}

/// Request to record a new pending transfer.
#[derive(Debug, Clone)]
pub struct SuggestCommand {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl SuggestCommand {
    /// All suggest validation happens here, before any state is touched.
    pub fn validate(&self) -> Result<(), CommandError> {
        if self.sender.is_empty() {
            return Err(CommandError::MissingUsername { role: Role::Sender });
        }
        if self.recipient.is_empty() {
            return Err(CommandError::MissingUsername {
                role: Role::Recipient,
            });
        }
        if self.sender == self.recipient {
            return Err(CommandError::SenderIsRecipient);
        }
        if self.amount == 0 {
            return Err(CommandError::NonPositiveAmount);
        }
        Ok(())
    }
}
