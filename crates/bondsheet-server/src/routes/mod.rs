pub mod export;
pub mod token;
