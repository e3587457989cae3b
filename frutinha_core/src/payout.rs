use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::symbols::SymbolCatalog;
use crate::wins::WinSet;

/// Total payout for a spin: `bet × run length × symbol multiplier`, summed
/// over every winning row. Exact decimal arithmetic throughout; repeated
/// spins accumulate no rounding drift.
pub fn calculate(
    win_set: Option<&WinSet>,
    bet: Decimal,
    catalog: &SymbolCatalog,
) -> Result<Decimal, EngineError> {
    let Some(wins) = win_set else {
        return Ok(Decimal::ZERO);
    };
    let mut total = Decimal::ZERO;
    for entry in wins.values() {
        let multiplier = catalog.multiplier_of(&entry.symbol)?;
        total += bet * Decimal::from(entry.run.len() as u64) * multiplier;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wins::WinEntry;
    use rust_decimal_macros::dec;

    fn win(row: u32, symbol: &str, run: &[usize]) -> (u32, WinEntry) {
        (
            row,
            WinEntry {
                symbol: symbol.to_string(),
                run: run.to_vec(),
            },
        )
    }

    #[test]
    fn no_wins_pay_zero() {
        let total = calculate(None, dec!(10.00), &SymbolCatalog::classic()).unwrap();
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn single_row_pays_bet_times_length_times_multiplier() {
        let wins = WinSet::from([win(1, "Cherry", &[0, 1, 2])]);
        let total = calculate(Some(&wins), dec!(10.00), &SymbolCatalog::classic()).unwrap();
        // 10.00 x 3 x 2.50
        assert_eq!(total, dec!(75.00));
    }

    #[test]
    fn rows_accumulate_exactly() {
        let wins = WinSet::from([
            win(1, "Cherry", &[0, 1, 2]),
            win(3, "Lemon", &[1, 2, 3, 4]),
        ]);
        let total = calculate(Some(&wins), dec!(0.10), &SymbolCatalog::classic()).unwrap();
        // 0.10 x 3 x 2.50 + 0.10 x 4 x 1.50
        assert_eq!(total, dec!(1.35));
    }

    #[test]
    fn unknown_symbol_is_a_catalog_error() {
        let wins = WinSet::from([win(1, "Anchor", &[0, 1, 2])]);
        let err = calculate(Some(&wins), dec!(1.00), &SymbolCatalog::classic()).unwrap_err();
        assert_eq!(err, EngineError::UnknownSymbol("Anchor".to_string()));
    }
}
