//! Columnar match-result table.
//!
//! One column per variable slot, in slot order. Rows are appended only when
//! a full pattern is satisfied. During parallel search each worker owns a
//! private table; [`merge_rows`](MatchTable::merge_rows) and the
//! column-claiming merge in the parallel matcher are the only mutations
//! permitted once the search phase has finished.

use crate::graph::Element;

/// Fixed-width columnar buffer of match rows.
#[derive(Debug)]
pub struct MatchTable {
    columns: Vec<Vec<Element>>,
}

impl MatchTable {
    /// Creates an empty table with the given column count.
    pub fn new(column_count: usize) -> Self {
        Self {
            columns: (0..column_count).map(|_| Vec::new()).collect(),
        }
    }

    /// Assembles a table from pre-built columns; all columns must have the
    /// same length.
    pub(crate) fn from_columns(columns: Vec<Vec<Element>>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].len() == w[1].len()),
            "ragged columns"
        );
        Self { columns }
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of complete rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// The element bound at `(row, column)`.
    pub fn get(&self, row: usize, column: usize) -> Element {
        self.columns[column][row]
    }

    /// One full column.
    pub fn column(&self, column: usize) -> &[Element] {
        &self.columns[column]
    }

    /// Appends one row; the slice length must equal the column count.
    pub fn push_row(&mut self, row: &[Element]) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width mismatch");
        for (column, element) in self.columns.iter_mut().zip(row) {
            column.push(*element);
        }
    }

    /// Moves every row of `src` to the end of `self`, leaving `src` empty.
    /// Both tables must share a column count.
    pub fn merge_rows(&mut self, src: &mut MatchTable) {
        debug_assert_eq!(self.column_count(), src.column_count());
        for (dst, src) in self.columns.iter_mut().zip(src.columns.iter_mut()) {
            dst.append(src);
        }
    }
}
