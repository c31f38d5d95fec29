//! Delimited-text rendering of collected records.
//!
//! Headers are fixed per export and match the files the historical backend
//! produced, so downstream spreadsheet tooling keeps working unchanged.

use crate::domain::{BondRecord, IntradayRow, ListedBond};
use crate::error::TabularError;

/// Column header of the exchange export.
pub const BOND_HEADER: [&str; 6] = [
    "fecha",
    "symbol",
    "formaAmortizacion",
    "interes",
    "fechaEmision",
    "trade",
];

/// Column header of the intraday export.
pub const INTRADAY_HEADER: [&str; 7] =
    ["Symbol", "Fecha", "Hora", "Open", "High", "Low", "Volume"];

/// Column header of the public-bonds listing export.
pub const LISTING_HEADER: [&str; 3] = ["symbol", "trade", "date"];

/// Render the exchange export. An empty batch is a hard error: zero rows
/// means no symbol produced any data.
pub fn render_bonds(records: &[BondRecord]) -> Result<Vec<u8>, TabularError> {
    if records.is_empty() {
        return Err(TabularError::EmptyResult);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(BOND_HEADER)?;
    for record in records {
        writer.write_record([
            record.report_date().as_str(),
            record.symbol.as_str(),
            record.amortization.as_str(),
            record.interest.as_str(),
            record.issue_date.as_str(),
            record.trade.render().as_str(),
        ])?;
    }

    finish(writer)
}

/// Render the intraday export. Same empty-batch policy as the exchange
/// export.
pub fn render_intraday(rows: &[IntradayRow]) -> Result<Vec<u8>, TabularError> {
    if rows.is_empty() {
        return Err(TabularError::EmptyResult);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(INTRADAY_HEADER)?;
    for row in rows {
        writer.write_record([
            row.symbol.as_str(),
            row.date.as_str(),
            row.time.as_str(),
            row.open.as_str(),
            row.high.as_str(),
            row.low.as_str(),
            row.volume.as_str(),
        ])?;
    }

    finish(writer)
}

/// Render the public-bonds listing. Trade cells are written verbatim, a
/// bond the exchange lists without a printed trade gets a blank cell.
pub fn render_listing(bonds: &[ListedBond]) -> Result<Vec<u8>, TabularError> {
    if bonds.is_empty() {
        return Err(TabularError::EmptyResult);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(LISTING_HEADER)?;
    for bond in bonds {
        writer.write_record([
            bond.symbol.as_str(),
            bond.trade.as_str(),
            bond.report_date().as_str(),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, TabularError> {
    writer
        .into_inner()
        .map_err(|error| TabularError::Io(error.into_error()))
}
