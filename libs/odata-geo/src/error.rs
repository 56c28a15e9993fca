use thiserror::Error;

use crate::crs::Srid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// The SRID is not in the registry.
    #[error("coordinate reference system EPSG:{0} is not supported")]
    NotSupported(Srid),

    #[error("geometry type '{0}' is not supported for coordinate transformation")]
    UnsupportedGeometry(&'static str),

    #[error("invalid WKT geometry: {0}")]
    InvalidWkt(String),

    #[error("coordinate transformation failed: {0}")]
    Projection(String),
}

impl From<proj4rs::errors::Error> for GeoError {
    fn from(e: proj4rs::errors::Error) -> Self {
        GeoError::Projection(e.to_string())
    }
}
