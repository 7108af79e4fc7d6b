//! Catalogue des classes d'occupation du sol
//!
//! Les codes suivent la classification annuelle 10 m (neuf classes plus
//! "no data"). Les surfaces par parcelle et par année sont agrégées sur
//! ces codes; la détection de perturbation forestière ne considère que
//! l'ensemble forêt.

use crate::LandcoverError;

/// Une classe d'occupation du sol du catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandcoverClass {
    /// Code numérique stocké en base
    pub code: i32,

    /// Libellé lisible
    pub label: &'static str,
}

/// Catalogue complet, dans l'ordre des codes
pub const CLASSES: &[LandcoverClass] = &[
    LandcoverClass { code: 0, label: "no data" },
    LandcoverClass { code: 1, label: "water" },
    LandcoverClass { code: 2, label: "trees" },
    LandcoverClass { code: 4, label: "flooded vegetation" },
    LandcoverClass { code: 5, label: "crops" },
    LandcoverClass { code: 7, label: "built area" },
    LandcoverClass { code: 8, label: "bare ground" },
    LandcoverClass { code: 9, label: "snow/ice" },
    LandcoverClass { code: 10, label: "clouds" },
    LandcoverClass { code: 11, label: "rangeland" },
];

/// Codes considérés comme forêt pour l'agrégation de perturbation
/// (arbres + végétation inondée)
pub const FOREST_CLASS_CODES: &[i32] = &[2, 4];

/// Recherche une classe par son code
pub fn class_by_code(code: i32) -> Result<LandcoverClass, LandcoverError> {
    CLASSES
        .iter()
        .copied()
        .find(|c| c.code == code)
        .ok_or(LandcoverError::UnknownClass(code))
}

/// Vérifie si un code appartient à l'ensemble forêt
pub fn is_forest(code: i32) -> bool {
    FOREST_CLASS_CODES.contains(&code)
}
