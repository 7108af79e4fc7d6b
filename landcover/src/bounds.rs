//! Emprise de requête (géométrie + système de coordonnées)
//!
//! L'emprise est fournie par l'appelant en WKT ou GeoJSON, dans un EPSG
//! quelconque. La reprojection vers le SRID de stockage est faite par le
//! moteur de requête, jamais ici.

use geo::Geometry;
use geojson::GeoJson;
use geozero::wkt::Wkt;
use geozero::ToGeo;
use tracing::debug;

use crate::geometry::{ok_for_postgis, world_envelope, WGS84_SRID};
use crate::LandcoverError;

/// Emprise spatiale d'une requête
#[derive(Debug, Clone)]
pub struct Bounds {
    /// Géométrie de l'emprise
    pub geometry: Geometry,

    /// Code EPSG de la géométrie fournie
    pub epsg: u32,
}

impl Bounds {
    /// Crée une emprise après validation structurelle de la géométrie
    pub fn new(geometry: Geometry, epsg: u32) -> Result<Self, LandcoverError> {
        if !ok_for_postgis(&geometry) {
            return Err(LandcoverError::invalid_geometry(
                "bounds geometry is empty or has malformed rings",
            ));
        }
        Ok(Self { geometry, epsg })
    }

    /// Emprise monde en WGS84 (emprise par défaut)
    pub fn world() -> Self {
        Self {
            geometry: world_envelope(),
            epsg: WGS84_SRID,
        }
    }

    /// Parse une emprise depuis du WKT
    pub fn from_wkt(wkt: &str, epsg: u32) -> Result<Self, LandcoverError> {
        let geometry = Wkt(wkt)
            .to_geo()
            .map_err(|e| LandcoverError::WktParse(e.to_string()))?;
        debug!(epsg = epsg, "Parsed WKT bounds");
        Self::new(geometry, epsg)
    }

    /// Parse une emprise depuis du GeoJSON (géométrie nue ou Feature)
    pub fn from_geojson(raw: &str, epsg: u32) -> Result<Self, LandcoverError> {
        let geojson = raw
            .parse::<GeoJson>()
            .map_err(|e| LandcoverError::GeoJsonParse(e.to_string()))?;

        let geometry = match geojson {
            GeoJson::Geometry(g) => Geometry::try_from(g)
                .map_err(|e| LandcoverError::GeoJsonParse(e.to_string()))?,
            GeoJson::Feature(f) => {
                let g = f.geometry.ok_or_else(|| {
                    LandcoverError::GeoJsonParse("feature has no geometry".into())
                })?;
                Geometry::try_from(g).map_err(|e| LandcoverError::GeoJsonParse(e.to_string()))?
            }
            GeoJson::FeatureCollection(_) => {
                return Err(LandcoverError::GeoJsonParse(
                    "expected a single geometry, got a FeatureCollection".into(),
                ));
            }
        };

        debug!(epsg = epsg, "Parsed GeoJSON bounds");
        Self::new(geometry, epsg)
    }

    /// Vrai si l'emprise est déjà dans le SRID de stockage
    pub fn is_wgs84(&self) -> bool {
        self.epsg == WGS84_SRID
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::world()
    }
}
