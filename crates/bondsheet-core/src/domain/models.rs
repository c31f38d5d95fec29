use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::Symbol;

/// Settlement trade price, or an explicit marker when the upstream quote
/// never materialized. A symbol whose quote call exhausted its retries still
/// produces a row; the marker is what distinguishes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TradeValue {
    Price(f64),
    Unavailable,
}

impl TradeValue {
    /// Rendering used in the delimited output.
    pub fn render(&self) -> String {
        match self {
            Self::Price(value) => format!("{value}"),
            Self::Unavailable => String::from("N/A"),
        }
    }

    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Price(_))
    }
}

/// One output row of the exchange export: reference data plus the settlement
/// trade price for a single symbol. Reference fields stay blank when the
/// reference call failed; that failure never suppresses the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondRecord {
    /// Report date (UTC day the fetch ran).
    pub date: Date,
    pub symbol: Symbol,
    pub amortization: String,
    pub interest: String,
    pub issue_date: String,
    pub trade: TradeValue,
}

impl BondRecord {
    /// A row carrying nothing but the symbol. Used as the starting point of
    /// a fetch and as the placeholder when everything upstream failed.
    pub fn placeholder(symbol: Symbol) -> Self {
        Self {
            date: OffsetDateTime::now_utc().date(),
            symbol,
            amortization: String::new(),
            interest: String::new(),
            issue_date: String::new(),
            trade: TradeValue::Unavailable,
        }
    }

    pub fn report_date(&self) -> String {
        format_report_date(self.date)
    }
}

/// One row of the bulk public-bonds listing: whatever symbols the exchange
/// lists right now, with their raw trade field and the day the listing ran.
/// The trade value is carried verbatim; the bulk endpoint reports it
/// unscaled, unlike the per-symbol quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedBond {
    pub date: Date,
    pub symbol: Symbol,
    pub trade: String,
}

impl ListedBond {
    pub fn new(symbol: Symbol, trade: String) -> Self {
        Self {
            date: OffsetDateTime::now_utc().date(),
            symbol,
            trade,
        }
    }

    pub fn report_date(&self) -> String {
        format_report_date(self.date)
    }
}

fn format_report_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(format).unwrap_or_else(|_| date.to_string())
}

/// One minute bar of the intraday export. Numeric fields are kept exactly as
/// the provider delivered them (strings), so the output never reformats a
/// price the provider already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntradayRow {
    pub symbol: Symbol,
    pub date: String,
    pub time: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub volume: String,
}
