pub mod engine;
pub mod error;
pub mod grid;
pub mod ledger;
pub mod payout;
pub mod rng;
pub mod symbols;
pub mod wins;

pub use crate::engine::{
    resolve, DeclineReason, SlotMachine, SpinOutcome, SpinReceipt, SpinResolution,
};
pub use crate::error::EngineError;
pub use crate::grid::{generate, Grid, GridLayout};
pub use crate::ledger::{MemoryLedger, PlayerAccount, Spin};
pub use crate::rng::{FixedReels, RandomReels, ReelSource};
pub use crate::symbols::{Symbol, SymbolCatalog};
pub use crate::wins::{detect, select_row_winner, WinEntry, WinSet, MIN_WIN_COUNT};
