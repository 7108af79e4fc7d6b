//! # landcover
//!
//! Catalogue des classes d'occupation du sol et helpers géométriques pour
//! l'analyse de parcelles sur PostGIS.
//!
//! ## Features
//!
//! - Catalogue des classes (codes, libellés, ensemble forêt)
//! - Encodage EWKB / décodage WKB pour l'échange avec PostGIS
//! - Parsing d'emprises en WKT ou GeoJSON avec EPSG explicite
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//!
//! ## Usage
//!
//! ```rust,ignore
//! use landcover::{Bounds, FOREST_CLASS_CODES};
//!
//! let bounds = Bounds::from_wkt("POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))", 4326)?;
//! println!("forest codes: {:?}", FOREST_CLASS_CODES);
//! ```

pub mod bounds;
pub mod classes;
pub mod error;
pub mod geometry;

pub use bounds::Bounds;
pub use classes::{class_by_code, is_forest, LandcoverClass, CLASSES, FOREST_CLASS_CODES};
pub use error::LandcoverError;
pub use geometry::{
    geometry_from_wkb, geometry_to_ewkb, ok_for_postgis, world_envelope, WGS84_SRID,
};
