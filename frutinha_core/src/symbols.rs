use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One entry of the externally supplied catalog. The engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub payout_multiplier: Decimal,
}

/// The machine's symbol list, immutable for the duration of a spin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolCatalog(pub Vec<Symbol>);

impl SymbolCatalog {
    /// Classic fruit-machine table. Used by the offline simulator and as
    /// the seed catalog for fresh deployments.
    pub fn classic() -> Self {
        let entry = |name: &str, cents: i64| Symbol {
            name: name.to_string(),
            payout_multiplier: Decimal::new(cents, 2),
        };
        Self(vec![
            entry("Cherry", 250),
            entry("Lemon", 150),
            entry("Orange", 180),
            entry("Plum", 200),
            entry("Bell", 300),
            entry("Diamond", 300),
            entry("Bar", 400),
            entry("Seven", 500),
        ])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.name.as_str())
    }

    /// Payout multiplier for `name`. `UnknownSymbol` means the catalog and
    /// the grid being priced have gone out of sync.
    pub fn multiplier_of(&self, name: &str) -> Result<Decimal, EngineError> {
        self.0
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.payout_multiplier)
            .ok_or_else(|| EngineError::UnknownSymbol(name.to_string()))
    }

    /// Fail fast when fewer distinct symbols exist than a reel must show.
    pub fn require_distinct(&self, required: usize) -> Result<(), EngineError> {
        let available = self.names().collect::<HashSet<_>>().len();
        if available < required {
            return Err(EngineError::InsufficientSymbols {
                available,
                required,
            });
        }
        Ok(())
    }
}
