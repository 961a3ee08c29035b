// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format tag (§3) and array ordering.

/// Format tag for a product. The core implements `Binary`, `Cdf`, and
/// `Grib` fully; the others are shape-only, carried so the dynamic-type
/// abstractions (and any future backend) have somewhere to plug in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Plain ASCII text product (shape-only).
    Ascii,
    /// Binary product described entirely by a codadef (no self-describing
    /// container format).
    Binary,
    /// XML product (shape-only).
    Xml,
    /// NetCDF product (shape-only).
    NetCdf,
    /// NASA Common Data Format.
    Cdf,
    /// WMO GRIB edition 1 or 2.
    Grib,
    /// HDF4 (shape-only).
    Hdf4,
    /// HDF5 (shape-only).
    Hdf5,
}

impl Format {
    /// Name as it appears in codadef XML (`format="..."` attributes).
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Ascii => "ascii",
            Format::Binary => "binary",
            Format::Xml => "xml",
            Format::NetCdf => "netcdf",
            Format::Cdf => "cdf",
            Format::Grib => "grib",
            Format::Hdf4 => "hdf4",
            Format::Hdf5 => "hdf5",
        }
    }

    /// Parse a format tag from its codadef string form.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "ascii" => Some(Format::Ascii),
            "binary" => Some(Format::Binary),
            "xml" => Some(Format::Xml),
            "netcdf" => Some(Format::NetCdf),
            "cdf" => Some(Format::Cdf),
            "grib" => Some(Format::Grib),
            "hdf4" => Some(Format::Hdf4),
            "hdf5" => Some(Format::Hdf5),
            _ => None,
        }
    }

    /// True for the formats whose backend is fully implemented in this crate.
    pub fn is_implemented(&self) -> bool {
        matches!(self, Format::Binary | Format::Cdf | Format::Grib)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse type-class tag returned by `get_type_class` (§4.8), one per
/// [`StaticType`](crate::types::StaticType) variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Number,
    Text,
    Raw,
    Array,
    Record,
    Special,
}

impl TypeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeClass::Number => "number",
            TypeClass::Text => "text",
            TypeClass::Raw => "raw",
            TypeClass::Array => "array",
            TypeClass::Record => "record",
            TypeClass::Special => "special",
        }
    }
}

impl std::fmt::Display for TypeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Array element ordering (§3 Array).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArrayOrdering {
    /// Row-major: the last dimension varies fastest.
    #[default]
    C,
    /// Column-major: the first dimension varies fastest.
    Fortran,
}
