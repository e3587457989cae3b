use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Engine failures. Running out of funds is not one of these: a declined
/// spin is an ordinary outcome, reported as
/// [`SpinOutcome::Declined`](crate::engine::SpinOutcome).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The catalog cannot fill a reel without repeating a symbol.
    #[error("catalog has {available} distinct symbols, a reel shows {required}")]
    InsufficientSymbols { available: usize, required: usize },
    /// A grid referenced a symbol the catalog no longer knows.
    #[error("symbol `{0}` is not in the catalog")]
    UnknownSymbol(String),
    #[error("unknown player `{0}`")]
    UnknownPlayer(Uuid),
    #[error("bet must be positive, got {0}")]
    InvalidBet(Decimal),
}
