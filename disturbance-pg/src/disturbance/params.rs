//! Paramètres d'une requête de perturbation

use landcover::{ok_for_postgis, Bounds};

use super::DisturbanceError;

/// Seuil de perte par défaut: 200 000 m², soit environ 20 hectares
pub const DEFAULT_AREA_THRESHOLD_SQ_M: f64 = 200_000.0;

/// Paramètres de détection de perturbation forestière
///
/// L'agrégation par année est symétrique: aucun ordre n'est imposé entre
/// `start_year` et `end_year`, mais la sémantique de "perte" suppose
/// `start_year < end_year`.
#[derive(Debug, Clone)]
pub struct DisturbanceParams {
    /// Année de référence
    pub start_year: i32,

    /// Année de comparaison
    pub end_year: i32,

    /// Perte de surface forestière minimale, en m² (borne incluse)
    pub area_threshold: f64,

    /// Emprise spatiale de la recherche (monde entier par défaut)
    pub bounds: Bounds,

    /// Plafond optionnel de lignes retournées; s'il est présent, les
    /// résultats sont triés par id de parcelle pour que la troncature
    /// soit déterministe
    pub limit: Option<i64>,
}

impl DisturbanceParams {
    /// Crée des paramètres avec les défauts (seuil 20 ha, emprise monde)
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
            area_threshold: DEFAULT_AREA_THRESHOLD_SQ_M,
            bounds: Bounds::world(),
            limit: None,
        }
    }

    /// Remplace le seuil de perte (m²)
    pub fn with_area_threshold(mut self, area_threshold: f64) -> Self {
        self.area_threshold = area_threshold;
        self
    }

    /// Remplace l'emprise de recherche
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Plafonne le nombre de lignes retournées
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Valide les paramètres; rien n'est exécuté si la validation échoue
    pub fn validate(&self) -> Result<(), DisturbanceError> {
        if !self.area_threshold.is_finite() {
            return Err(DisturbanceError::invalid_arguments(
                "area_threshold must be a finite number",
            ));
        }
        if self.area_threshold < 0.0 {
            return Err(DisturbanceError::invalid_arguments(format!(
                "area_threshold must be non-negative, got {}",
                self.area_threshold
            )));
        }
        if let Some(limit) = self.limit {
            if limit <= 0 {
                return Err(DisturbanceError::invalid_arguments(format!(
                    "limit must be positive, got {}",
                    limit
                )));
            }
        }
        if !ok_for_postgis(&self.bounds.geometry) {
            return Err(DisturbanceError::invalid_arguments(
                "bounds geometry is empty or has malformed rings",
            ));
        }
        Ok(())
    }
}
