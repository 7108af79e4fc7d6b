//! Types d'erreurs pour le crate landcover

use thiserror::Error;

/// Erreurs pouvant survenir lors de la manipulation des géométries
/// et du catalogue de classes d'occupation du sol
#[derive(Debug, Error)]
pub enum LandcoverError {
    /// Géométrie invalide ou inutilisable
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// Erreur de parsing WKT
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Erreur de parsing GeoJSON
    #[error("GeoJSON parse error: {0}")]
    GeoJsonParse(String),

    /// Erreur d'encodage ou de décodage WKB
    #[error("WKB error: {0}")]
    Wkb(String),

    /// Code de classe d'occupation du sol inconnu
    #[error("Unknown land-cover class code: {0}")]
    UnknownClass(i32),
}

impl LandcoverError {
    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }
}
