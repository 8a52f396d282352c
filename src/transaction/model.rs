use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A value transfer waiting in the mempool or embedded in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: i64, // Unix millis (UTC)
    /// Position in the mempool at submission, and therefore in the block.
    pub index: usize,
}

impl Transaction {
    /// Build a transaction after checking its fields.
    pub fn new(
        sender: &str,
        recipient: &str,
        amount: u64,
        timestamp: i64,
        index: usize,
    ) -> Result<Self, LedgerError> {
        let sender = sender.trim();
        let recipient = recipient.trim();
        if sender.is_empty() {
            return Err(LedgerError::Validation("sender required".into()));
        }
        if recipient.is_empty() {
            return Err(LedgerError::Validation("recipient required".into()));
        }
        if amount == 0 {
            return Err(LedgerError::Validation("amount must be > 0".into()));
        }

        Ok(Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
            timestamp,
            index,
        })
    }
}

/// Receipt returned when a transaction enters the mempool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submitted {
    /// Position the transaction will take in the next block.
    pub tx_index: usize,
    /// Index of the block that will absorb it.
    pub block_index: u64,
}

#[cfg(test)]
mod tests {
    use super::Transaction;
    use crate::error::LedgerError;

    #[test]
    fn trims_addresses() {
        let tx = Transaction::new(" alice ", "bob\n", 5, 1_000, 2).unwrap();
        assert_eq!(tx.sender, "alice");
        assert_eq!(tx.recipient, "bob");
        assert_eq!(tx.index, 2);
    }

    #[test]
    fn rejects_blank_fields_and_zero_amount() {
        assert!(matches!(
            Transaction::new("", "b", 1, 0, 0),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            Transaction::new("a", "   ", 1, 0, 0),
            Err(LedgerError::Validation(_))
        ));
        assert!(matches!(
            Transaction::new("a", "b", 0, 0, 0),
            Err(LedgerError::Validation(_))
        ));
    }
}
