//! Conversion des lignes de résultat

use geo::Geometry;
use serde_json::{Map, Value};
use tokio_postgres::Row;

use super::DisturbanceError;

/// Une parcelle perturbée, émise au fil du curseur
///
/// `content` porte les colonnes calculées: surfaces forêt de début et de
/// fin, perte, et la surface de la parcelle quand elle est connue.
#[derive(Debug, Clone)]
pub struct DisturbanceResult {
    /// Identifiant de la parcelle
    pub parcel_id: String,

    /// Géométrie de la parcelle (SRID 4326)
    pub geometry: Geometry,

    /// Colonnes calculées de la requête
    pub content: Map<String, Value>,
}

impl DisturbanceResult {
    /// Convertit une ligne du curseur, juste avant émission
    pub(crate) fn from_row(row: &Row) -> Result<Self, DisturbanceError> {
        let parcel_id: String = row
            .try_get("id")
            .map_err(|e| DisturbanceError::decode("id", e))?;

        let geom_wkb: Vec<u8> = row
            .try_get("geom_wkb")
            .map_err(|e| DisturbanceError::decode("geom_wkb", e))?;
        let geometry = landcover::geometry_from_wkb(&geom_wkb)
            .map_err(|e| DisturbanceError::decode("geom_wkb", e))?;

        let start_forest_area: f64 = row
            .try_get("start_forest_area")
            .map_err(|e| DisturbanceError::decode("start_forest_area", e))?;
        let end_forest_area: f64 = row
            .try_get("end_forest_area")
            .map_err(|e| DisturbanceError::decode("end_forest_area", e))?;
        let area_sq_m: Option<f64> = row
            .try_get("area_sq_m")
            .map_err(|e| DisturbanceError::decode("area_sq_m", e))?;

        Ok(Self {
            parcel_id,
            geometry,
            content: build_content(start_forest_area, end_forest_area, area_sq_m),
        })
    }

    /// Perte de surface forêt (m²) entre les deux années
    pub fn forest_area_loss(&self) -> Option<f64> {
        self.content.get("forest_area_loss").and_then(Value::as_f64)
    }
}

/// Construit la map des colonnes calculées
fn build_content(
    start_forest_area: f64,
    end_forest_area: f64,
    area_sq_m: Option<f64>,
) -> Map<String, Value> {
    let mut content = Map::new();
    content.insert("start_forest_area".into(), start_forest_area.into());
    content.insert("end_forest_area".into(), end_forest_area.into());
    content.insert(
        "forest_area_loss".into(),
        (start_forest_area - end_forest_area).into(),
    );
    if let Some(area) = area_sq_m {
        content.insert("area_sq_m".into(), area.into());
    }
    content
}
