//! Construction de la requête de perturbation
//!
//! Une seule requête paramétrée: deux agrégats forêt par année joints aux
//! parcelles, filtre spatial sur l'emprise et seuil de perte inclusif.
//! Les identifiants (schéma, tables) viennent d'une `QuerySource` validée;
//! toutes les valeurs sont des paramètres liés, jamais interpolées.

use tokio_postgres::types::ToSql;

use crate::config::QuerySource;

/// Valeurs liées à la requête, dans l'ordre des placeholders
///
/// $1 année de référence, $2 année de comparaison, $3 codes forêt,
/// $4 emprise EWKB (SRID 4326), $5 seuil de perte (m²), $6 limite (si présente)
#[derive(Debug)]
pub struct BoundValues {
    pub start_year: i32,
    pub end_year: i32,
    pub forest_classes: Vec<i32>,
    pub bounds_ewkb: Vec<u8>,
    pub area_threshold: f64,
    pub limit: Option<i64>,
}

impl BoundValues {
    /// Vue ordonnée des paramètres pour `bind`
    pub fn as_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![
            &self.start_year,
            &self.end_year,
            &self.forest_classes,
            &self.bounds_ewkb,
            &self.area_threshold,
        ];
        if let Some(ref limit) = self.limit {
            params.push(limit);
        }
        params
    }
}

/// Construit la requête de perturbation pour une source donnée
///
/// Jointures internes: une parcelle sans agrégat forêt pour l'une des deux
/// années est exclue. Sans `with_limit`, aucun ordre n'est émis (l'ordre des
/// lignes dépend du plan d'exécution); avec limite, tri par id de parcelle
/// pour une troncature déterministe.
pub fn build_query(source: &QuerySource, with_limit: bool) -> String {
    let parcels = source.parcels();
    let lc = source.landcover();

    let mut sql = format!(
        "SELECT p.id, \
                ST_AsBinary(p.geometry) AS geom_wkb, \
                s.forest_area AS start_forest_area, \
                e.forest_area AS end_forest_area, \
                p.area_sq_m \
         FROM {parcels} p \
         JOIN (SELECT parcel_id, SUM(area_sq_m) AS forest_area \
               FROM {lc} \
               WHERE year = $1 AND class_code = ANY($3) \
               GROUP BY parcel_id) s ON s.parcel_id = p.id \
         JOIN (SELECT parcel_id, SUM(area_sq_m) AS forest_area \
               FROM {lc} \
               WHERE year = $2 AND class_code = ANY($3) \
               GROUP BY parcel_id) e ON e.parcel_id = p.id \
         WHERE ST_Intersects(p.geometry, ST_GeomFromEWKB($4)) \
           AND s.forest_area - e.forest_area >= $5",
        parcels = parcels,
        lc = lc,
    );

    if with_limit {
        sql.push_str(" ORDER BY p.id LIMIT $6");
    }

    sql
}
