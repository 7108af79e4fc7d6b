//! Moteur de requête de perturbation forestière
//!
//! Identifie les parcelles dont la surface forêt (classes arbres +
//! végétation inondée) a diminué d'au moins un seuil donné entre deux
//! années, dans une emprise spatiale. Les résultats sont produits
//! paresseusement via un curseur côté serveur.

pub mod error;
pub mod params;
pub mod result;
pub mod sql;
pub mod stream;

pub use error::DisturbanceError;
pub use params::{DisturbanceParams, DEFAULT_AREA_THRESHOLD_SQ_M};
pub use result::DisturbanceResult;
pub use stream::{find_disturbed_parcels, DisturbanceStream};
