//! Symbol list extraction from uploaded delimited files.

use std::collections::HashSet;

use crate::domain::Symbol;
use crate::error::ExtractError;

/// Extract the unique symbols from an uploaded CSV.
///
/// The file must carry a `symbol` column (exact header match, any position).
/// Blank cells are dropped and duplicates collapse to the first occurrence;
/// first-seen order is preserved so repeated uploads of the same file
/// produce identical output.
pub fn extract_symbols(bytes: &[u8]) -> Result<Vec<Symbol>, ExtractError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::NotUtf8)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = headers
        .iter()
        .position(|header| header.trim() == "symbol")
        .ok_or(ExtractError::MissingSymbolColumn)?;

    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    for record in reader.records() {
        let record = record?;
        let Some(cell) = record.get(column) else {
            continue;
        };
        let Ok(symbol) = Symbol::parse(cell) else {
            // Blank cell; the row is dropped, not an error.
            continue;
        };
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    if symbols.is_empty() {
        return Err(ExtractError::NoSymbols);
    }

    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_and_drops_blanks() {
        let upload = b"symbol\nAAPL\nAAPL\n\nMSFT\n";
        let symbols = extract_symbols(upload).expect("extraction should succeed");

        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn distinct_count_matches_distinct_non_blank_values() {
        let upload = b"symbol\nAL30\nGD35\nAL30\n  \nGD35\nAE38\n";
        let symbols = extract_symbols(upload).expect("extraction should succeed");
        assert_eq!(symbols.len(), 3);
    }

    #[test]
    fn finds_symbol_column_in_any_position() {
        let upload = b"name,symbol,weight\nApple,AAPL,0.5\nMicrosoft,MSFT,0.5\n";
        let symbols = extract_symbols(upload).expect("extraction should succeed");

        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn rejects_missing_symbol_column() {
        let upload = b"ticker\nAAPL\n";
        let error = extract_symbols(upload).expect_err("must fail");
        assert!(matches!(error, ExtractError::MissingSymbolColumn));
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let upload = [0xff, 0xfe, 0x00, 0x41];
        let error = extract_symbols(&upload).expect_err("must fail");
        assert!(matches!(error, ExtractError::NotUtf8));
    }

    #[test]
    fn rejects_file_with_only_blank_symbols() {
        let upload = b"symbol\n\n \n";
        let error = extract_symbols(upload).expect_err("must fail");
        assert!(matches!(error, ExtractError::NoSymbols));
    }

    #[test]
    fn preserves_first_seen_order() {
        let upload = b"symbol\nGD35\nAL30\nGD35\nAE38\n";
        let symbols = extract_symbols(upload).expect("extraction should succeed");

        let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["GD35", "AL30", "AE38"]);
    }
}
