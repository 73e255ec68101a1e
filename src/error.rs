use thiserror::Error;

#[derive(Error, Debug)]
pub enum WardrobeError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("{kind} already exists: {name}")]
    Conflict { kind: &'static str, name: String },

    #[error("Unknown brand: {0}")]
    UnknownBrand(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl From<calamine::Error> for WardrobeError {
    fn from(e: calamine::Error) -> Self {
        WardrobeError::Spreadsheet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WardrobeError>;
