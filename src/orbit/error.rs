use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("invalid tle format: expected 2 or 3 non-empty lines, got {0}")]
    InvalidTleFormat(usize),
    #[error("invalid tle: {0}")]
    InvalidTle(#[from] sgp4::TleError),
    #[error("elements error: {0}")]
    Elements(#[from] sgp4::ElementsError),
    #[error("propagation error: {0}")]
    Propagation(String),
    #[error("tle catalog not found: {0}")]
    CatalogNotFound(String),
    #[error("tle file read error: {0}")]
    CatalogRead(#[from] std::io::Error),
    #[error("invalid tle in {file}: {message}")]
    CatalogEntry { file: String, message: String },
    #[error("norad id {0} not present in tle catalog")]
    UnknownSatellite(u64),
}

impl From<sgp4::Error> for OrbitError {
    fn from(err: sgp4::Error) -> Self {
        OrbitError::Propagation(err.to_string())
    }
}
