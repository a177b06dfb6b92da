//! Column hints.

use crate::table::CsvTable;

/// Whether every non-empty value of a column is numeric.
///
/// A column without any value is not numeric.
pub fn is_numeric_column(table: &CsvTable, col_idx: usize) -> bool {
    let mut values = table
        .column_values(col_idx)
        .filter(|value| !value.is_empty())
        .peekable();
    values.peek().is_some() && values.all(|value| value.parse::<f64>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CsvTable {
        CsvTable::new(
            vec!["id".into(), "count".into(), "note".into(), "blank".into()],
            vec![
                vec!["SP_1.1".into(), "10".into(), "a".into(), String::new()],
                vec!["SP_1.2".into(), String::new(), "1".into(), String::new()],
                vec!["SP_1.3".into(), "12.5".into(), "a".into(), String::new()],
            ],
        )
    }

    #[test]
    fn test_numeric_columns() {
        let table = table();
        assert!(!is_numeric_column(&table, 0));
        assert!(is_numeric_column(&table, 1));
        assert!(!is_numeric_column(&table, 2));
        assert!(!is_numeric_column(&table, 3));
    }
}
