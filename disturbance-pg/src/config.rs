//! Configuration de la source de requête
//!
//! Les références de tables sont toujours qualifiées par le schéma (aucune
//! dépendance au `search_path` de session). Seuls des identifiants validés
//! sont insérés dans le SQL; toutes les valeurs passent en paramètres liés.

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};

/// Source de données pour le moteur de perturbation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuerySource {
    /// Schéma PostgreSQL contenant les tables
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Table des parcelles (id, geometry, area_sq_m)
    #[serde(default = "default_parcel_table")]
    pub parcel_table: String,

    /// Table des surfaces d'occupation du sol par parcelle et par année
    #[serde(default = "default_landcover_table")]
    pub landcover_table: String,

    /// Codes de classes agrégés comme "forêt"
    #[serde(default = "default_forest_classes")]
    pub forest_classes: Vec<i32>,

    /// Nombre de lignes rapatriées par aller-retour sur le curseur
    #[serde(default = "default_fetch_size")]
    pub fetch_size: i32,
}

fn default_schema() -> String {
    "forest".to_string()
}

fn default_parcel_table() -> String {
    "parcels".to_string()
}

fn default_landcover_table() -> String {
    "parcel_landcover".to_string()
}

fn default_forest_classes() -> Vec<i32> {
    landcover::FOREST_CLASS_CODES.to_vec()
}

fn default_fetch_size() -> i32 {
    64
}

impl Default for QuerySource {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            parcel_table: default_parcel_table(),
            landcover_table: default_landcover_table(),
            forest_classes: default_forest_classes(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl QuerySource {
    /// Charge une configuration depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let source: Self =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        source.validate()?;
        Ok(source)
    }

    /// Vérifie que les identifiants sont sûrs et les paramètres cohérents
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("schema", &self.schema),
            ("parcel_table", &self.parcel_table),
            ("landcover_table", &self.landcover_table),
        ] {
            if !is_safe_identifier(value) {
                anyhow::bail!("Invalid SQL identifier for {}: '{}'", name, value);
            }
        }

        if self.forest_classes.is_empty() {
            anyhow::bail!("forest_classes must not be empty");
        }
        if self.fetch_size <= 0 {
            anyhow::bail!("fetch_size must be positive, got {}", self.fetch_size);
        }

        Ok(())
    }

    /// Référence qualifiée de la table des parcelles
    pub fn parcels(&self) -> String {
        format!("{}.{}", self.schema, self.parcel_table)
    }

    /// Référence qualifiée de la table d'occupation du sol
    pub fn landcover(&self) -> String {
        format!("{}.{}", self.schema, self.landcover_table)
    }
}

/// Identifiant SQL non quoté: lettre ou underscore, puis alphanumériques,
/// 63 octets max (limite PostgreSQL)
fn is_safe_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > 63 {
        return false;
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
