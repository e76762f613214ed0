//! Plain string table: scraped HTML tables and small display tables.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Rows are padded or truncated to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Projects `names` (in that order). `None` if any column is missing.
    pub fn select(&self, names: &[&str]) -> Option<Table> {
        let indexes = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<Vec<_>>>()?;
        Some(Table {
            columns: names.iter().map(|n| n.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| indexes.iter().map(|&i| r[i].clone()).collect())
                .collect(),
        })
    }

    /// Replaces column names positionally.
    pub fn renamed(mut self, names: &[&str]) -> Table {
        for (column, name) in self.columns.iter_mut().zip(names) {
            *column = name.to_string();
        }
        self
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Column-major view, as table figures expect.
    pub fn column_values(&self) -> Vec<Vec<String>> {
        (0..self.columns.len())
            .map(|i| self.rows.iter().map(|r| r[i].clone()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Symbol".into(), "Last".into(), "% Change".into()],
            vec![
                vec!["INFY".into(), "1500.5".into(), "2.1".into()],
                vec!["TCS".into(), "3900".into()],
            ],
        )
    }

    #[test]
    fn new_pads_short_rows() {
        let t = sample();
        assert_eq!(t.rows()[1], vec!["TCS", "3900", ""]);
    }

    #[test]
    fn select_reorders_and_rejects_missing() {
        let t = sample();
        let s = t.select(&["% Change", "Symbol"]).unwrap();
        assert_eq!(s.columns(), &["% Change".to_string(), "Symbol".to_string()]);
        assert_eq!(s.rows()[0], vec!["2.1", "INFY"]);
        assert!(t.select(&["Symbol", "Volume"]).is_none());
    }

    #[test]
    fn renamed_and_head() {
        let t = sample().renamed(&["Symbol", "Last Traded Price"]).head(1);
        assert_eq!(t.columns()[1], "Last Traded Price");
        assert_eq!(t.columns()[2], "% Change");
        assert_eq!(t.rows().len(), 1);
    }

    #[test]
    fn column_values_are_column_major() {
        let cols = sample().column_values();
        assert_eq!(cols[0], vec!["INFY", "TCS"]);
        assert_eq!(cols[2], vec!["2.1", ""]);
    }
}
