use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::grid::Grid;
use crate::wins::WinSet;

/// A player's mutable aggregate. Only the spin transaction writes it,
/// at most twice per spin (debit, then conditionally credit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAccount {
    pub balance: Decimal,
    pub total_wagered: Decimal,
    pub total_won: Decimal,
}

impl PlayerAccount {
    pub fn with_balance(balance: Decimal) -> Self {
        Self {
            balance,
            total_wagered: Decimal::ZERO,
            total_won: Decimal::ZERO,
        }
    }
}

/// Immutable record of one engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    pub id: Uuid,
    pub bet_amount: Decimal,
    pub payout: Decimal,
    pub grid: Grid,
    pub win_set: Option<WinSet>,
    pub timestamp: DateTime<Utc>,
}

/// Account plus its append-only spin history, guarded as one unit so a
/// reader can never observe a balance change without its record.
#[derive(Debug)]
pub(crate) struct AccountSlot {
    pub account: PlayerAccount,
    pub history: Vec<Spin>,
}

/// In-process account store. One mutex per player: concurrent spins for
/// the same account serialize, while spins for different accounts only
/// share a brief read lock on the index.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    slots: RwLock<HashMap<Uuid, Arc<Mutex<AccountSlot>>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and hand back its id.
    pub fn open_account(&self, opening_balance: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        let slot = AccountSlot {
            account: PlayerAccount::with_balance(opening_balance),
            history: Vec::new(),
        };
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(slot)));
        id
    }

    /// Snapshot of the account as last committed.
    pub fn account(&self, id: Uuid) -> Result<PlayerAccount, EngineError> {
        let slot = self.slot(id)?;
        let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.account.clone())
    }

    /// The player's spin records, oldest first.
    pub fn history(&self, id: Uuid) -> Result<Vec<Spin>, EngineError> {
        let slot = self.slot(id)?;
        let slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.history.clone())
    }

    pub(crate) fn slot(&self, id: Uuid) -> Result<Arc<Mutex<AccountSlot>>, EngineError> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(EngineError::UnknownPlayer(id))
    }
}
