use std::{
    fmt::Display,
    ops::{Index, IndexMut},
};

/// A dense row-major matrix. Rows are stored as separate vectors so that
/// each one can be handed to a model as a plain slice.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix<T>(Vec<Vec<T>>);

impl<T: Default + Clone> Matrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(vec![vec![T::default(); cols]; rows])
    }
}

impl<T> Matrix<T> {
    /// build a matrix from `rows`, which must all have the same length
    pub fn from_rows(rows: Vec<Vec<T>>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].len() == w[1].len()));
        Self(rows)
    }

    pub fn rows(&self) -> &[Vec<T>] {
        &self.0
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.0[i]
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.0.len(), self.0.first().map(|v| v.len()).unwrap_or(0))
    }
}

impl<T: Clone> Matrix<T> {
    /// a new matrix whose column `j` is column `cols[j]` of `self`. columns
    /// may repeat or be left out
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        Self(
            self.0
                .iter()
                .map(|row| cols.iter().map(|&c| row[c].clone()).collect())
                .collect(),
        )
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        &self.0[x][y]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        &mut self.0[x][y]
    }
}

impl<T: Display> Display for Matrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = f.width().unwrap_or(8);
        let prec = f.precision().unwrap_or(4);
        for row in &self.0 {
            for col in row {
                write!(f, "{col:width$.prec$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
