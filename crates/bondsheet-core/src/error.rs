use thiserror::Error;

/// Validation errors exposed by `bondsheet-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
}

/// Errors raised while extracting the symbol list from an uploaded file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("uploaded file is not valid UTF-8")]
    NotUtf8,
    #[error("uploaded file has no 'symbol' column")]
    MissingSymbolColumn,
    #[error("uploaded file contains no usable symbols")]
    NoSymbols,
    #[error("failed to read uploaded file: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised while rendering collected records as delimited text.
#[derive(Debug, Error)]
pub enum TabularError {
    #[error("no data could be retrieved")]
    EmptyResult,
    #[error("failed to render output: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finish output: {0}")]
    Io(#[from] std::io::Error),
}

/// Authentication errors. Both map to 401 at the HTTP surface; the caller
/// never learns which credential component was wrong.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
}
