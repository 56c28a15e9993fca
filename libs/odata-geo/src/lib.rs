#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Coordinate reference system handling for spatial filter literals.
//!
//! Holds a closed registry of supported SRIDs and rewrites WKT geometries
//! between them. The projection math itself is done by `proj4rs`; this crate
//! picks the coordinate systems and walks the geometry structure.

pub mod crs;
mod error;
mod transform;

pub use crs::{
    CrsDefinition, STORAGE_SRID, Srid, WGS84_SRID, is_supported, lookup, registry,
    resolve_content_crs,
};
pub use error::GeoError;
pub use geo_types::Geometry;
pub use transform::{looks_like_wkt, parse_wkt, transform, transform_wkt};
