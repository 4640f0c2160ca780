// CSV decoding into a typed Dataset

use crate::data::{Column, Dataset};
use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::io::{self, Read};

/// Cell contents treated as missing values (compared after trimming).
pub const NULL_TOKENS: &[&str] = &[
    "",
    "#N/A",
    "#N/A N/A",
    "#NA",
    "-1.#IND",
    "-1.#QNAN",
    "-NaN",
    "-nan",
    "1.#IND",
    "1.#QNAN",
    "<NA>",
    "N/A",
    "NA",
    "NULL",
    "NaN",
    "None",
    "n/a",
    "nan",
    "null",
];

/// Read all of stdin and parse it as CSV
pub fn read_csv_from_stdin() -> Result<Dataset> {
    let mut bytes = Vec::new();
    io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read stdin")?;
    read_csv(&bytes)
}

/// Parse CSV bytes (header row first) into a Dataset with inferred column types
pub fn read_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let raw_headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    if raw_headers.is_empty() || (raw_headers.len() == 1 && raw_headers[0].trim().is_empty()) {
        bail!("No columns to parse from file");
    }

    let headers = normalize_headers(raw_headers);
    let width = headers.len();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to parse CSV record {}", idx + 1))?;

        // A blank line shows up as a single empty field
        if record.len() == 1 && record[0].trim().is_empty() && width > 1 {
            continue;
        }

        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or(idx as u64 + 2);
            bail!(
                "Error tokenizing data: expected {} fields in line {}, saw {}",
                width,
                line,
                record.len()
            );
        }

        for (col, column_cells) in cells.iter_mut().enumerate() {
            let value = record.get(col).and_then(non_null);
            column_cells.push(value);
        }
    }

    let has_rows = cells.first().map(|c| !c.is_empty()).unwrap_or(false);
    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| infer_column(name, values, has_rows))
        .collect();

    Dataset::new(columns)
}

/// `None` for missing-value tokens, otherwise the raw cell
fn non_null(cell: &str) -> Option<String> {
    if NULL_TOKENS.contains(&cell.trim()) {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Numeric iff every present value parses as f64. An all-missing column of a
/// non-empty file counts as numeric; columns of a header-only file are text.
fn infer_column(name: String, values: Vec<Option<String>>, has_rows: bool) -> Column {
    if !has_rows {
        return Column::text(name, values);
    }

    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.trim().parse::<f64>().ok().map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) => Column::numeric(name, numbers),
        None => Column::text(name, values),
    }
}

/// Fill in blank header names and de-duplicate repeated ones. Other names are
/// kept verbatim, surrounding whitespace included.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnKind;

    #[test]
    fn test_read_simple_numeric() {
        let ds = read_csv(b"a,b\n1,2\n3,4\n").unwrap();
        assert_eq!(ds.shape(), (2, 2));
        assert_eq!(ds.numeric_columns(), vec!["a", "b"]);
        assert_eq!(
            ds.column("a").unwrap().as_numbers().unwrap(),
            &[Some(1.0), Some(3.0)]
        );
    }

    #[test]
    fn test_read_mixed_types() {
        let ds = read_csv(b"name,score\nalice,1.5\nbob,2\n").unwrap();
        assert_eq!(ds.column("name").unwrap().kind(), ColumnKind::Text);
        assert_eq!(ds.column("score").unwrap().kind(), ColumnKind::Numeric);
    }

    #[test]
    fn test_null_tokens_become_missing() {
        let ds = read_csv(b"a,b\n1,NA\n,x\nnan,null\n").unwrap();
        let a = ds.column("a").unwrap();
        assert!(a.is_numeric());
        assert_eq!(a.null_count(), 2);
        let b = ds.column("b").unwrap();
        assert!(!b.is_numeric());
        assert_eq!(b.null_count(), 2);
    }

    #[test]
    fn test_short_rows_padded_with_nulls() {
        let ds = read_csv(b"a,b,c\n1,2\n4,5,6\n").unwrap();
        assert_eq!(ds.shape(), (2, 3));
        assert_eq!(ds.column("c").unwrap().null_count(), 1);
    }

    #[test]
    fn test_long_rows_rejected() {
        let result = read_csv(b"a,b\n1,2,3\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Error tokenizing data"));
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = read_csv(b"");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No columns"));
    }

    #[test]
    fn test_header_only_columns_are_text() {
        let ds = read_csv(b"x,y\n").unwrap();
        assert_eq!(ds.shape(), (0, 2));
        assert!(ds.numeric_columns().is_empty());
    }

    #[test]
    fn test_all_missing_column_is_numeric() {
        let ds = read_csv(b"a,b\n1,\n2,\n").unwrap();
        let b = ds.column("b").unwrap();
        assert!(b.is_numeric());
        assert_eq!(b.null_count(), 2);
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let ds = read_csv(b"a,a,,a\n1,2,3,4\n").unwrap();
        assert_eq!(ds.column_names(), vec!["a", "a.1", "Unnamed: 2", "a.2"]);
    }

    #[test]
    fn test_header_whitespace_kept() {
        let ds = read_csv(b"a, b\n1,2\n").unwrap();
        assert_eq!(ds.column_names(), vec!["a", " b"]);
        assert!(ds.column("b").is_none());
        assert!(ds.column(" b").unwrap().is_numeric());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let ds = read_csv(b"a,b\n1,2\n\n3,4\n").unwrap();
        assert_eq!(ds.row_count(), 2);
    }

    #[test]
    fn test_quoted_fields() {
        let ds = read_csv(b"city,pop\n\"Paris, FR\",2.1\n").unwrap();
        assert_eq!(ds.column("city").unwrap().display_cell(0).as_deref(), Some("Paris, FR"));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let result = read_csv(b"a,b\n\xff\xfe,1\n");
        assert!(result.is_err());
    }
}
