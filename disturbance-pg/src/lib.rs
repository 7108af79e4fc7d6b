//! # disturbance-pg
//!
//! Détection de perturbation forestière sur des parcelles PostGIS.
//!
//! ## Features
//!
//! - Requête paramétrée sur les agrégats forêt par parcelle et par année
//! - Résultats en flux via un curseur côté serveur (mémoire bornée)
//! - Reprojection de l'emprise vers le SRID de stockage avant requête
//! - Pool de connexions avec TLS optionnel
//!
//! ## Usage CLI
//!
//! ```bash
//! # Parcelles ayant perdu au moins 20 ha de forêt entre 2018 et 2021
//! disturbance-pg --start-year 2018 --end-year 2021 --output disturbed.geojson
//!
//! # Avec emprise et seuil explicites
//! disturbance-pg --start-year 2018 --end-year 2021 \
//!     --bounds "POLYGON((-122 45, -121 45, -121 46, -122 46, -122 45))" \
//!     --area-threshold 50000
//! ```

pub mod config;
pub mod disturbance;
pub mod export;
pub mod pool;
pub mod reproject;

pub use config::QuerySource;
pub use disturbance::{
    find_disturbed_parcels, DisturbanceError, DisturbanceParams, DisturbanceResult,
    DisturbanceStream, DEFAULT_AREA_THRESHOLD_SQ_M,
};
pub use pool::{create_pool, DatabaseConfig};
