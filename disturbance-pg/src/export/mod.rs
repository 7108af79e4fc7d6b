//! Export des résultats (GeoJSON)

pub mod geojson;

pub use geojson::FeatureCollectionWriter;
