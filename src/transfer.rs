use serde::{Deserialize, Serialize};

/// Transfers are identified by their position in the ledger's ordered
/// sequence; they are never deleted or reordered.
pub type TransferId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
        };
        f.write_str(status)
    }
}

/// A proposed movement of tokens between two users.
///
/// Field names serialize in the wire format the persisted collections use,
/// so a stored blob round-trips unchanged. `approver` stays empty while the
/// transfer is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: String,
    pub recipient: String,
    #[serde(rename = "tokenAmount")]
    pub token_amount: u64,
    pub status: TransferStatus,
    pub approver: String,
}

impl Transfer {
    pub fn pending(sender: String, recipient: String, token_amount: u64) -> Self {
        Self {
            sender,
            recipient,
            token_amount,
            status: TransferStatus::Pending,
            approver: String::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransferStatus::Pending
    }
}
