//! Substitution cost matrices for alignment scoring

use std::fmt;

/// Dense 256×256 table of substitution scores, indexed `[a][b]`
#[derive(Clone, PartialEq, Eq)]
pub struct CostMatrix {
    cells: Box<[[i8; 256]; 256]>,
}

impl CostMatrix {
    /// Matrix scoring `matched` on the diagonal and `mismatched` everywhere else
    ///
    /// ```rust
    /// use strand::CostMatrix;
    /// let costs = CostMatrix::unit(1, -1);
    /// assert_eq!(costs.get(b'A', b'A'), 1);
    /// assert_eq!(costs.get(b'A', b'C'), -1);
    /// ```
    pub fn unit(matched: i8, mismatched: i8) -> Self {
        Self::from_fn(|a, b| if a == b { matched } else { mismatched })
    }

    /// Matrix built from a scoring function
    pub fn from_fn<F: FnMut(u8, u8) -> i8>(mut f: F) -> Self {
        let mut cells = Box::new([[0i8; 256]; 256]);
        for (a, row) in cells.iter_mut().enumerate() {
            for (b, cell) in row.iter_mut().enumerate() {
                *cell = f(a as u8, b as u8);
            }
        }
        Self { cells }
    }

    /// Score of substituting `a` with `b`
    #[inline(always)]
    pub fn get(&self, a: u8, b: u8) -> i8 {
        self.cells[a as usize][b as usize]
    }

    /// Set the score of substituting `a` with `b`
    pub fn set(&mut self, a: u8, b: u8, score: i8) {
        self.cells[a as usize][b as usize] = score;
    }

    /// The row of scores for substituting `a`
    #[inline(always)]
    pub fn row(&self, a: u8) -> &[i8; 256] {
        &self.cells[a as usize]
    }

    /// Whether `get(a, b) == get(b, a)` for every pair
    pub fn is_symmetric(&self) -> bool {
        (0..256).all(|a| (0..a).all(|b| self.cells[a][b] == self.cells[b][a]))
    }
}

impl Default for CostMatrix {
    /// Levenshtein-compatible scores: 0 on match, -1 on mismatch
    fn default() -> Self {
        Self::unit(0, -1)
    }
}

impl fmt::Debug for CostMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = self.cells.iter().flatten().min().copied().unwrap_or(0);
        let max = self.cells.iter().flatten().max().copied().unwrap_or(0);
        f.debug_struct("CostMatrix")
            .field("min", &min)
            .field("max", &max)
            .field("symmetric", &self.is_symmetric())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_matrix() {
        let costs = CostMatrix::unit(2, -3);
        assert_eq!(costs.get(7, 7), 2);
        assert_eq!(costs.get(7, 8), -3);
        assert!(costs.is_symmetric());
        assert_eq!(costs.row(b'x')[b'x' as usize], 2);
    }

    #[test]
    fn test_set_breaks_symmetry() {
        let mut costs = CostMatrix::default();
        costs.set(b'A', b'G', 1);
        assert_eq!(costs.get(b'A', b'G'), 1);
        assert_eq!(costs.get(b'G', b'A'), -1);
        assert!(!costs.is_symmetric());
    }
}
