//! Reprojection of geometries between registered coordinate systems.
//!
//! Only points, line strings, polygons and multi-polygons are rewritten;
//! every other shape is rejected with [`GeoError::UnsupportedGeometry`].

use geo_types::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use proj4rs::proj::Proj;
use tracing::trace;
use wkt::{ToWkt, TryFromWkt};

use crate::crs::{CrsDefinition, Srid, lookup};
use crate::error::GeoError;

struct Reprojection {
    src: Proj,
    dst: Proj,
    src_geographic: bool,
    dst_geographic: bool,
}

impl Reprojection {
    fn new(from: &CrsDefinition, to: &CrsDefinition) -> Result<Self, GeoError> {
        Ok(Self {
            src: Proj::from_proj_string(from.proj)?,
            dst: Proj::from_proj_string(to.proj)?,
            src_geographic: from.geographic,
            dst_geographic: to.geographic,
        })
    }

    fn coord(&self, c: Coord<f64>) -> Result<Coord<f64>, GeoError> {
        // proj4rs works in radians for geographic systems.
        let mut point = if self.src_geographic {
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };
        proj4rs::transform::transform(&self.src, &self.dst, &mut point)?;
        let (x, y, _) = point;
        Ok(if self.dst_geographic {
            Coord {
                x: x.to_degrees(),
                y: y.to_degrees(),
            }
        } else {
            Coord { x, y }
        })
    }
}

/// Reproject `geometry` from `from` to `to`.
///
/// # Errors
/// - [`GeoError::NotSupported`] if either SRID is not registered (the target
///   is checked first).
/// - [`GeoError::UnsupportedGeometry`] for shapes other than point, line
///   string, polygon and multi-polygon.
/// - [`GeoError::Projection`] if a coordinate cannot be projected.
pub fn transform(
    from: Srid,
    to: Srid,
    geometry: &Geometry<f64>,
) -> Result<Geometry<f64>, GeoError> {
    let target = lookup(to).ok_or(GeoError::NotSupported(to))?;
    let source = lookup(from).ok_or(GeoError::NotSupported(from))?;

    if from == to {
        return rewrite(geometry, &|c| Ok(c));
    }

    trace!(from, to, "reprojecting geometry");
    let reprojection = Reprojection::new(source, target)?;
    rewrite(geometry, &|c| reprojection.coord(c))
}

/// Parse a WKT literal. Keywords are accepted in any case.
///
/// # Errors
/// [`GeoError::InvalidWkt`] when the text is not valid WKT.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>, GeoError> {
    let normalized = text.trim().to_ascii_uppercase();
    Geometry::<f64>::try_from_wkt_str(&normalized).map_err(|e| GeoError::InvalidWkt(e.to_string()))
}

/// Parse `text`, reproject it and serialize it back to WKT.
///
/// # Errors
/// Anything [`parse_wkt`] or [`transform`] reports.
pub fn transform_wkt(from: Srid, to: Srid, text: &str) -> Result<String, GeoError> {
    let geometry = parse_wkt(text)?;
    Ok(transform(from, to, &geometry)?.wkt_string())
}

/// Whether `text` (already unquoted) is shaped like a WKT geometry: a
/// geometry keyword followed by an optional `Z`/`M`/`ZM` tag and then either
/// a parenthesized body or `EMPTY`.
#[must_use]
pub fn looks_like_wkt(text: &str) -> bool {
    const KEYWORDS: [&str; 7] = [
        "GEOMETRYCOLLECTION",
        "MULTILINESTRING",
        "MULTIPOLYGON",
        "MULTIPOINT",
        "LINESTRING",
        "POLYGON",
        "POINT",
    ];
    let upper = text.trim_start().to_ascii_uppercase();
    let Some(rest) = KEYWORDS.iter().find_map(|k| upper.strip_prefix(k)) else {
        return false;
    };
    let mut rest = rest.trim_start();
    for tag in ["ZM", "Z", "M"] {
        if let Some(r) = rest.strip_prefix(tag) {
            rest = r.trim_start();
            break;
        }
    }
    rest.starts_with('(') || rest.starts_with("EMPTY")
}

type CoordFn<'a> = dyn Fn(Coord<f64>) -> Result<Coord<f64>, GeoError> + 'a;

fn rewrite(geometry: &Geometry<f64>, f: &CoordFn<'_>) -> Result<Geometry<f64>, GeoError> {
    match geometry {
        Geometry::Point(p) => Ok(Geometry::Point(Point::from(f(p.0)?))),
        Geometry::LineString(ls) => Ok(Geometry::LineString(line(ls, f)?)),
        Geometry::Polygon(p) => Ok(Geometry::Polygon(polygon(p, f)?)),
        Geometry::MultiPolygon(mp) => {
            let polygons = mp
                .0
                .iter()
                .map(|p| polygon(p, f))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        other => Err(GeoError::UnsupportedGeometry(shape_name(other))),
    }
}

fn line(ls: &LineString<f64>, f: &CoordFn<'_>) -> Result<LineString<f64>, GeoError> {
    ls.0.iter()
        .map(|c| f(*c))
        .collect::<Result<Vec<_>, _>>()
        .map(LineString)
}

fn polygon(p: &Polygon<f64>, f: &CoordFn<'_>) -> Result<Polygon<f64>, GeoError> {
    let exterior = line(p.exterior(), f)?;
    let interiors = p
        .interiors()
        .iter()
        .map(|ring| line(ring, f))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn shape_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Line(_) => "Line",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        _ => "Geometry",
    }
}
