use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Minimum length of a consecutive run before a row pays out.
pub const MIN_WIN_COUNT: usize = 3;

/// A winning run: the reel indices (ascending, consecutive) at which
/// `symbol` lines up within one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEntry {
    pub symbol: String,
    pub run: Vec<usize>,
}

/// Wins keyed by 1-based row number, at most one per row (see
/// [`select_row_winner`]). Never built empty: no wins at all is `None`.
pub type WinSet = BTreeMap<u32, WinEntry>;

/// Scan every visible row of `grid` for winning runs. Deterministic for a
/// fixed grid; all randomness lives in the generator.
pub fn detect(grid: &Grid) -> Option<WinSet> {
    let mut wins = WinSet::new();
    for (i, row) in grid.rows().enumerate() {
        if let Some(entry) = select_row_winner(&row) {
            wins.insert(i as u32 + 1, entry);
        }
    }
    if wins.is_empty() {
        None
    } else {
        Some(wins)
    }
}

/// Row policy: the first symbol, in order of first appearance scanning
/// left to right, that forms a long-enough run claims the row; later
/// winning symbols in the same row are dropped. Swap this function to pay
/// every winning symbol per row instead.
pub fn select_row_winner(row: &[&str]) -> Option<WinEntry> {
    let mut seen: Vec<&str> = Vec::with_capacity(row.len());
    for &symbol in row {
        if seen.contains(&symbol) {
            continue;
        }
        seen.push(symbol);
        let positions: Vec<usize> = row
            .iter()
            .enumerate()
            .filter_map(|(idx, s)| (*s == symbol).then_some(idx))
            .collect();
        if positions.len() < MIN_WIN_COUNT {
            continue;
        }
        let run = longest_run(&positions);
        if run.len() >= MIN_WIN_COUNT {
            return Some(WinEntry {
                symbol: symbol.to_string(),
                run: run.to_vec(),
            });
        }
    }
    None
}

/// Longest run of consecutive integers within an ascending position list.
/// Equal-length runs resolve to the earliest one.
fn longest_run(positions: &[usize]) -> &[usize] {
    if positions.is_empty() {
        return positions;
    }
    let (mut best_start, mut best_len) = (0, 1);
    let (mut start, mut len) = (0, 1);
    for i in 1..positions.len() {
        if positions[i] == positions[i - 1] + 1 {
            len += 1;
        } else {
            start = i;
            len = 1;
        }
        if len > best_len {
            best_start = start;
            best_len = len;
        }
    }
    &positions[best_start..best_start + best_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_in_a_row_wins() {
        let row = vec!["Cherry", "Cherry", "Cherry", "Lemon", "Lemon"];
        let win = select_row_winner(&row).unwrap();
        assert_eq!(win.symbol, "Cherry");
        assert_eq!(win.run, vec![0, 1, 2]);
    }

    #[test]
    fn broken_run_of_two_does_not_win() {
        let row = vec!["Cherry", "Lemon", "Cherry", "Cherry", "Lemon"];
        assert_eq!(select_row_winner(&row), None);
    }

    #[test]
    fn first_winning_symbol_claims_the_row() {
        let row = vec!["Cherry", "Cherry", "Cherry", "Lemon", "Lemon", "Lemon"];
        let win = select_row_winner(&row).unwrap();
        assert_eq!(win.symbol, "Cherry");
        assert_eq!(win.run, vec![0, 1, 2]);
    }

    #[test]
    fn equal_runs_keep_the_earliest() {
        let row = vec!["Bar", "Bar", "Bar", "Lemon", "Bar", "Bar", "Bar"];
        let win = select_row_winner(&row).unwrap();
        assert_eq!(win.run, vec![0, 1, 2]);
    }

    #[test]
    fn longer_later_run_beats_earlier_short_one() {
        let positions = [0, 1, 3, 4, 5];
        assert_eq!(longest_run(&positions), &[3, 4, 5]);
    }

    #[test]
    fn scattered_positions_have_no_run() {
        let row = vec!["Seven", "Lemon", "Seven", "Lemon", "Seven"];
        // Seven appears three times but never on adjacent reels
        assert_eq!(select_row_winner(&row), None);
    }

    #[test]
    fn detect_keys_rows_one_based_and_returns_none_when_empty() {
        let grid = Grid::from_reels(vec![
            vec!["Lemon".into(), "Cherry".into()],
            vec!["Bar".into(), "Cherry".into()],
            vec!["Plum".into(), "Cherry".into()],
        ]);
        let wins = detect(&grid).unwrap();
        assert_eq!(wins.len(), 1);
        assert_eq!(wins[&2].symbol, "Cherry");
        assert_eq!(wins[&2].run, vec![0, 1, 2]);

        let quiet = Grid::from_reels(vec![
            vec!["Lemon".into()],
            vec!["Bar".into()],
            vec!["Plum".into()],
        ]);
        assert_eq!(detect(&quiet), None);
    }
}
