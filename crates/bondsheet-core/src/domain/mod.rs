//! Domain types shared by the providers and the tabular layer.

mod models;
mod symbol;

pub use models::{BondRecord, IntradayRow, ListedBond, TradeValue};
pub use symbol::Symbol;
