use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::EngineError;
use crate::grid::{Grid, GridLayout};
use crate::ledger::{MemoryLedger, Spin};
use crate::payout;
use crate::rng::ReelSource;
use crate::symbols::SymbolCatalog;
use crate::wins::{detect, WinSet};

/// The deterministic half of a spin: one grid draw evaluated down to a
/// payout. No account state is touched here.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinResolution {
    pub grid: Grid,
    pub win_set: Option<WinSet>,
    pub payout: Decimal,
}

/// Draw, detect and price one spin against `catalog`.
pub fn resolve<S: ReelSource + ?Sized>(
    source: &mut S,
    catalog: &SymbolCatalog,
    layout: GridLayout,
    bet: Decimal,
) -> Result<SpinResolution, EngineError> {
    if bet <= Decimal::ZERO {
        return Err(EngineError::InvalidBet(bet));
    }
    let grid = source.draw(catalog, layout)?;
    let win_set = detect(&grid);
    let payout = payout::calculate(win_set.as_ref(), bet, catalog)?;
    Ok(SpinResolution {
        grid,
        win_set,
        payout,
    })
}

/// Why a spin was declined before any state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    InsufficientFunds,
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientFunds => f.write_str("insufficient funds"),
        }
    }
}

/// Everything a completed spin hands back to the caller. `balance_after`
/// is the balance as committed, never a re-read.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinReceipt {
    pub spin_id: Uuid,
    pub grid: Grid,
    pub win_set: Option<WinSet>,
    pub payout: Decimal,
    pub balance_after: Decimal,
}

/// What one admitted spin request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SpinOutcome {
    Completed(SpinReceipt),
    Declined { reason: DeclineReason },
}

/// One machine: a catalog, a layout, a reel source and the ledger its
/// spins settle against.
#[derive(Debug)]
pub struct SlotMachine<S: ReelSource> {
    catalog: SymbolCatalog,
    layout: GridLayout,
    reels: Mutex<S>,
    ledger: MemoryLedger,
}

impl<S: ReelSource> SlotMachine<S> {
    pub fn new(catalog: SymbolCatalog, layout: GridLayout, reels: S) -> Self {
        Self {
            catalog,
            layout,
            reels: Mutex::new(reels),
            ledger: MemoryLedger::new(),
        }
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    /// Run one spin for `player_id`, all or nothing.
    ///
    /// The player's account lock is held for the whole sequence: funds
    /// check, resolution, then debit, credit and history append as a
    /// single unit. A decline or an error out of resolution leaves the
    /// account exactly as it was, with no record written. Spins for other
    /// players proceed under their own locks.
    pub fn play(&self, player_id: Uuid, bet: Decimal) -> Result<SpinOutcome, EngineError> {
        if bet <= Decimal::ZERO {
            return Err(EngineError::InvalidBet(bet));
        }
        let slot = self.ledger.slot(player_id)?;
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.account.balance < bet {
            return Ok(SpinOutcome::Declined {
                reason: DeclineReason::InsufficientFunds,
            });
        }

        let resolution = {
            let mut reels = self.reels.lock().unwrap_or_else(PoisonError::into_inner);
            resolve(&mut *reels, &self.catalog, self.layout, bet)?
        };

        slot.account.balance -= bet;
        slot.account.total_wagered += bet;
        if resolution.payout > Decimal::ZERO {
            slot.account.balance += resolution.payout;
            slot.account.total_won += resolution.payout;
        }

        let spin = Spin {
            id: Uuid::new_v4(),
            bet_amount: bet,
            payout: resolution.payout,
            grid: resolution.grid.clone(),
            win_set: resolution.win_set.clone(),
            timestamp: Utc::now(),
        };
        let spin_id = spin.id;
        slot.history.push(spin);

        Ok(SpinOutcome::Completed(SpinReceipt {
            spin_id,
            grid: resolution.grid,
            win_set: resolution.win_set,
            payout: resolution.payout,
            balance_after: slot.account.balance,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RandomReels;
    use rust_decimal_macros::dec;

    #[test]
    fn seeded_spins_replay_identically() {
        let run = || {
            let machine = SlotMachine::new(
                SymbolCatalog::classic(),
                GridLayout::default(),
                RandomReels::seeded(7),
            );
            let player = machine.ledger().open_account(dec!(100.00));
            (0..10)
                .map(|_| match machine.play(player, dec!(1.00)).unwrap() {
                    SpinOutcome::Completed(receipt) => {
                        (receipt.grid, receipt.payout, receipt.balance_after)
                    }
                    SpinOutcome::Declined { .. } => panic!("funds were sufficient"),
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn zero_bet_is_rejected() {
        let machine = SlotMachine::new(
            SymbolCatalog::classic(),
            GridLayout::default(),
            RandomReels::seeded(7),
        );
        let player = machine.ledger().open_account(dec!(100.00));
        let err = machine.play(player, Decimal::ZERO).unwrap_err();
        assert_eq!(err, EngineError::InvalidBet(Decimal::ZERO));
    }
}
