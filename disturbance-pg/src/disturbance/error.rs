//! Types d'erreurs du moteur de perturbation

use thiserror::Error;

/// Erreurs pouvant survenir lors d'une requête de perturbation
///
/// Les paramètres invalides sont rejetés avant toute exécution; les erreurs
/// de stockage arrivent comme dernier élément du flux, après fermeture du
/// curseur. Un résultat vide n'est jamais une erreur.
#[derive(Debug, Error)]
pub enum DisturbanceError {
    /// Paramètres malformés ou hors plage
    #[error("Invalid arguments: {reason}")]
    InvalidArguments { reason: String },

    /// Emprise inutilisable (parsing, validation ou encodage)
    #[error("Invalid bounds geometry: {0}")]
    InvalidBounds(#[from] landcover::LandcoverError),

    /// Échec de reprojection de l'emprise vers le SRID de stockage
    #[error("Failed to reproject bounds from EPSG:{epsg}: {reason}")]
    Reprojection { epsg: u32, reason: String },

    /// Impossible d'obtenir une connexion du pool
    #[error("Failed to acquire database connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// Le stockage a rejeté la requête (plan, exécution ou fetch)
    #[error("Query execution failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Ligne de résultat d'une forme inattendue
    #[error("Failed to decode result row ({column}): {reason}")]
    Decode {
        column: &'static str,
        reason: String,
    },
}

impl DisturbanceError {
    /// Crée une erreur de paramètres invalides
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
        }
    }

    /// Crée une erreur de décodage de ligne
    pub fn decode(column: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            column,
            reason: reason.to_string(),
        }
    }
}
