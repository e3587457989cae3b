use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::symbols::SymbolCatalog;

/// Reel and visible-row counts for one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub reel_count: usize,
    pub visible_rows: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            reel_count: 5,
            visible_rows: 3,
        }
    }
}

/// The visible symbols of one spin, reel-major: `reels()[r]` holds reel
/// `r`'s symbols top to bottom. Every reel has the same number of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    reels: Vec<Vec<String>>,
}

impl Grid {
    pub fn from_reels(reels: Vec<Vec<String>>) -> Self {
        debug_assert!(reels.windows(2).all(|w| w[0].len() == w[1].len()));
        Self { reels }
    }

    pub fn reels(&self) -> &[Vec<String>] {
        &self.reels
    }

    pub fn reel_count(&self) -> usize {
        self.reels.len()
    }

    pub fn visible_rows(&self) -> usize {
        self.reels.first().map_or(0, Vec::len)
    }

    /// Horizontal slices across the reels, top row first: row `i` is the
    /// `i`-th visible symbol of every reel, in reel order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.visible_rows()).map(move |i| self.reels.iter().map(|reel| reel[i].as_str()).collect())
    }
}

/// Draw a random grid. Each reel independently shows the first
/// `visible_rows` entries of a fresh uniform shuffle of the whole catalog,
/// so a symbol never repeats within one reel's draw but may repeat across
/// reels at the same row.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    catalog: &SymbolCatalog,
    layout: GridLayout,
) -> Result<Grid, EngineError> {
    catalog.require_distinct(layout.visible_rows)?;
    let mut reels = Vec::with_capacity(layout.reel_count);
    for _ in 0..layout.reel_count {
        let mut names: Vec<&str> = catalog.names().collect();
        names.shuffle(rng);
        reels.push(
            names[..layout.visible_rows]
                .iter()
                .map(|name| name.to_string())
                .collect(),
        );
    }
    Ok(Grid::from_reels(reels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_grid_has_layout_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let layout = GridLayout::default();
        let grid = generate(&mut rng, &SymbolCatalog::classic(), layout).unwrap();
        assert_eq!(grid.reel_count(), layout.reel_count);
        for reel in grid.reels() {
            assert_eq!(reel.len(), layout.visible_rows);
        }
    }

    #[test]
    fn reels_never_repeat_a_symbol() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let grid = generate(&mut rng, &SymbolCatalog::classic(), GridLayout::default()).unwrap();
            for reel in grid.reels() {
                let mut sorted = reel.clone();
                sorted.sort();
                sorted.dedup();
                assert_eq!(sorted.len(), reel.len(), "duplicate within a reel: {reel:?}");
            }
        }
    }

    #[test]
    fn refuses_catalog_smaller_than_a_reel() {
        let mut rng = StdRng::seed_from_u64(3);
        let catalog = SymbolCatalog(SymbolCatalog::classic().0.into_iter().take(2).collect());
        let err = generate(&mut rng, &catalog, GridLayout::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientSymbols {
                available: 2,
                required: 3
            }
        );
    }

    #[test]
    fn rows_transpose_the_reels() {
        let grid = Grid::from_reels(vec![
            vec!["a".into(), "b".into()],
            vec!["c".into(), "d".into()],
            vec!["e".into(), "f".into()],
        ]);
        let rows: Vec<Vec<&str>> = grid.rows().collect();
        assert_eq!(rows, vec![vec!["a", "c", "e"], vec!["b", "d", "f"]]);
    }
}
