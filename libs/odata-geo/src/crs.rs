//! Closed registry of supported coordinate reference systems.

/// EPSG spatial reference identifier.
pub type Srid = i32;

/// ETRS89, the CRS spatial columns are stored in.
pub const STORAGE_SRID: Srid = 4258;

/// WGS 84.
pub const WGS84_SRID: Srid = 4326;

/// A supported CRS and its proj definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrsDefinition {
    pub srid: Srid,
    pub name: &'static str,
    /// proj4 parameter string understood by `proj4rs`.
    pub proj: &'static str,
    /// Geographic systems take and yield degrees (lon, lat).
    pub geographic: bool,
}

const REGISTRY: [CrsDefinition; 6] = [
    CrsDefinition {
        srid: 4326,
        name: "WGS 84",
        proj: "+proj=longlat +datum=WGS84 +no_defs",
        geographic: true,
    },
    CrsDefinition {
        srid: 4258,
        name: "ETRS89",
        proj: "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs",
        geographic: true,
    },
    CrsDefinition {
        srid: 28992,
        name: "Amersfoort / RD New",
        proj: "+proj=sterea +lat_0=52.15616055555555 +lon_0=5.38763888888889 +k=0.9999079 \
               +x_0=155000 +y_0=463000 +ellps=bessel \
               +towgs84=565.4171,50.3319,465.5524,1.9342,-1.6677,9.1019,4.0725 +units=m +no_defs",
        geographic: false,
    },
    CrsDefinition {
        srid: 3857,
        name: "WGS 84 / Pseudo-Mercator",
        proj: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
               +units=m +towgs84=0,0,0,0,0,0,0 +no_defs",
        geographic: false,
    },
    CrsDefinition {
        srid: 25831,
        name: "ETRS89 / UTM zone 31N",
        proj: "+proj=utm +zone=31 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        geographic: false,
    },
    CrsDefinition {
        srid: 25832,
        name: "ETRS89 / UTM zone 32N",
        proj: "+proj=utm +zone=32 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        geographic: false,
    },
];

#[must_use]
pub fn registry() -> &'static [CrsDefinition] {
    &REGISTRY
}

#[must_use]
pub fn lookup(srid: Srid) -> Option<&'static CrsDefinition> {
    REGISTRY.iter().find(|d| d.srid == srid)
}

#[must_use]
pub fn is_supported(srid: Srid) -> bool {
    lookup(srid).is_some()
}

/// Resolve the CRS a client declared for request or response content.
///
/// No value means ETRS89, `CRS84` means WGS 84, `EPSG:<n>` is accepted when
/// `n` is registered. Anything else yields `None`.
#[must_use]
pub fn resolve_content_crs(value: Option<&str>) -> Option<Srid> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Some(STORAGE_SRID);
    }
    if value.eq_ignore_ascii_case("CRS84") {
        return Some(WGS84_SRID);
    }
    let (authority, code) = value.split_once(':')?;
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    code.trim()
        .parse::<Srid>()
        .ok()
        .filter(|srid| is_supported(*srid))
}
