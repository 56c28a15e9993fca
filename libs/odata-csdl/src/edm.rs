//! EDM primitive and spatial type kinds.
//!
//! `EdmKind` is the closed set of `Edm.*` type names a property or a
//! literal can carry. Anything else (complex types, collections, typos)
//! maps to [`EdmKind::Unknown`].
//!
//! `EdmFamily` folds synonyms together (all integer widths, all string-like
//! types, ...). Function-argument checks compare families, not kinds.

use std::fmt;

/// Name used when a type cannot be resolved.
pub const EDM_UNKNOWN: &str = "Edm.Unknown";

/// Name given to the `null` literal during type inference.
pub const EDM_NULL: &str = "Edm.Null";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EdmKind {
    String,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    Boolean,
    Guid,
    Binary,
    DateTimeOffset,
    Date,
    TimeOfDay,
    Duration,
    Geography,
    GeographyPoint,
    GeographyLineString,
    GeographyPolygon,
    GeographyMultiPoint,
    GeographyMultiLineString,
    GeographyMultiPolygon,
    Geometry,
    GeometryPoint,
    GeometryLineString,
    GeometryPolygon,
    GeometryMultiPoint,
    GeometryMultiLineString,
    GeometryMultiPolygon,
    #[default]
    Unknown,
}

const KINDS: [(EdmKind, &str); 30] = [
    (EdmKind::String, "Edm.String"),
    (EdmKind::Byte, "Edm.Byte"),
    (EdmKind::SByte, "Edm.SByte"),
    (EdmKind::Int16, "Edm.Int16"),
    (EdmKind::Int32, "Edm.Int32"),
    (EdmKind::Int64, "Edm.Int64"),
    (EdmKind::Single, "Edm.Single"),
    (EdmKind::Double, "Edm.Double"),
    (EdmKind::Decimal, "Edm.Decimal"),
    (EdmKind::Boolean, "Edm.Boolean"),
    (EdmKind::Guid, "Edm.Guid"),
    (EdmKind::Binary, "Edm.Binary"),
    (EdmKind::DateTimeOffset, "Edm.DateTimeOffset"),
    (EdmKind::Date, "Edm.Date"),
    (EdmKind::TimeOfDay, "Edm.TimeOfDay"),
    (EdmKind::Duration, "Edm.Duration"),
    (EdmKind::Geography, "Edm.Geography"),
    (EdmKind::GeographyPoint, "Edm.GeographyPoint"),
    (EdmKind::GeographyLineString, "Edm.GeographyLineString"),
    (EdmKind::GeographyPolygon, "Edm.GeographyPolygon"),
    (EdmKind::GeographyMultiPoint, "Edm.GeographyMultiPoint"),
    (EdmKind::GeographyMultiLineString, "Edm.GeographyMultiLineString"),
    (EdmKind::GeographyMultiPolygon, "Edm.GeographyMultiPolygon"),
    (EdmKind::Geometry, "Edm.Geometry"),
    (EdmKind::GeometryPoint, "Edm.GeometryPoint"),
    (EdmKind::GeometryLineString, "Edm.GeometryLineString"),
    (EdmKind::GeometryPolygon, "Edm.GeometryPolygon"),
    (EdmKind::GeometryMultiPoint, "Edm.GeometryMultiPoint"),
    (EdmKind::GeometryMultiLineString, "Edm.GeometryMultiLineString"),
    (EdmKind::GeometryMultiPolygon, "Edm.GeometryMultiPolygon"),
];

impl EdmKind {
    /// Map a raw `Type` attribute to its kind. Matching is exact, the way
    /// CSDL spells primitive names.
    #[must_use]
    pub fn from_type_name(raw: &str) -> Self {
        KINDS
            .iter()
            .find(|(_, name)| *name == raw)
            .map_or(EdmKind::Unknown, |(kind, _)| *kind)
    }

    /// Canonical `Edm.*` spelling.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        KINDS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or(EDM_UNKNOWN, |(_, name)| *name)
    }

    #[must_use]
    pub fn family(self) -> EdmFamily {
        match self {
            EdmKind::String | EdmKind::Guid | EdmKind::Binary => EdmFamily::String,
            EdmKind::Byte | EdmKind::SByte | EdmKind::Int16 | EdmKind::Int32 | EdmKind::Int64 => {
                EdmFamily::Integer
            }
            EdmKind::Single | EdmKind::Double | EdmKind::Decimal => EdmFamily::Decimal,
            EdmKind::Boolean => EdmFamily::Boolean,
            EdmKind::DateTimeOffset | EdmKind::Date | EdmKind::TimeOfDay | EdmKind::Duration => {
                EdmFamily::DateTime
            }
            EdmKind::Geography
            | EdmKind::GeographyPoint
            | EdmKind::GeographyLineString
            | EdmKind::GeographyPolygon
            | EdmKind::GeographyMultiPoint
            | EdmKind::GeographyMultiLineString
            | EdmKind::GeographyMultiPolygon
            | EdmKind::Geometry
            | EdmKind::GeometryPoint
            | EdmKind::GeometryLineString
            | EdmKind::GeometryPolygon
            | EdmKind::GeometryMultiPoint
            | EdmKind::GeometryMultiLineString
            | EdmKind::GeometryMultiPolygon => EdmFamily::Geography,
            EdmKind::Unknown => EdmFamily::Unknown,
        }
    }

    #[must_use]
    pub fn is_geography(self) -> bool {
        matches!(
            self,
            EdmKind::Geography
                | EdmKind::GeographyPoint
                | EdmKind::GeographyLineString
                | EdmKind::GeographyPolygon
                | EdmKind::GeographyMultiPoint
                | EdmKind::GeographyMultiLineString
                | EdmKind::GeographyMultiPolygon
        )
    }

    #[must_use]
    pub fn is_geometry(self) -> bool {
        matches!(
            self,
            EdmKind::Geometry
                | EdmKind::GeometryPoint
                | EdmKind::GeometryLineString
                | EdmKind::GeometryPolygon
                | EdmKind::GeometryMultiPoint
                | EdmKind::GeometryMultiLineString
                | EdmKind::GeometryMultiPolygon
        )
    }

    /// Whether a value of kind `actual` may be stored in a slot declared as
    /// `self`. Used for IN-list checks.
    ///
    /// Kinds are compared by family, so integer widths, string and guid,
    /// the date and time kinds, and all spatial kinds fold together. Decimal
    /// slots also take integers. `Unknown` accepts nothing but itself.
    #[must_use]
    pub fn accepts(self, actual: EdmKind) -> bool {
        if self == actual {
            return true;
        }
        match (self.family(), actual.family()) {
            (EdmFamily::Unknown, _) | (_, EdmFamily::Unknown) => false,
            (EdmFamily::Decimal, EdmFamily::Integer) => true,
            (want, have) => want == have,
        }
    }
}

impl fmt::Display for EdmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Canonical type family used when comparing EDM names loosely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdmFamily {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    Geography,
    Unknown,
}

impl EdmFamily {
    /// Family of either an `Edm.*` name or a bare family name such as
    /// `string` or `datetime`.
    #[must_use]
    pub fn from_type_name(raw: &str) -> Self {
        let kind = EdmKind::from_type_name(raw);
        if kind != EdmKind::Unknown {
            return kind.family();
        }
        let lower = raw.trim().to_ascii_lowercase();
        match lower.as_str() {
            "string" | "guid" | "binary" => EdmFamily::String,
            "integer" | "int" | "int32" | "int64" => EdmFamily::Integer,
            "decimal" | "double" | "float" | "single" => EdmFamily::Decimal,
            "boolean" | "bool" => EdmFamily::Boolean,
            "datetime" | "datetimeoffset" | "date" | "time" => EdmFamily::DateTime,
            "geography" | "geometry" => EdmFamily::Geography,
            _ => EdmFamily::Unknown,
        }
    }
}

impl fmt::Display for EdmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdmFamily::String => "string",
            EdmFamily::Integer => "integer",
            EdmFamily::Decimal => "decimal",
            EdmFamily::Boolean => "boolean",
            EdmFamily::DateTime => "datetime",
            EdmFamily::Geography => "geography",
            EdmFamily::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
