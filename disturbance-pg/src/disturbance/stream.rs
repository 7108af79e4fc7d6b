//! Exécution en flux de la requête de perturbation
//!
//! Une tâche pilote possède la connexion pour toute la durée du flux:
//! transaction en lecture seule, statement lié à un portal, fetch
//! incrémental par lots. Les lignes sont converties une à une et envoyées
//! sur un channel borné.
//!
//! Libération des ressources sur chaque chemin de sortie:
//! - épuisement: commit de la transaction, connexion rendue au pool;
//! - abandon du flux par le consommateur: l'envoi échoue, le drop de la
//!   transaction fait le rollback (ce qui ferme le portal), la connexion
//!   revient au pool;
//! - erreur de stockage: même démontage, puis l'erreur est émise comme
//!   dernier élément du flux.
//!
//! Aucune responsabilité de nettoyage ne fuit vers l'appelant.

use std::pin::Pin;
use std::task::{Context, Poll};

use deadpool_postgres::Pool;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use landcover::{geometry_to_ewkb, WGS84_SRID};

use crate::config::QuerySource;
use crate::reproject::Reprojector;

use super::sql::{build_query, BoundValues};
use super::{DisturbanceError, DisturbanceParams, DisturbanceResult};

/// Flux paresseux de parcelles perturbées
///
/// Implémente `futures::Stream`; `next_result` est fourni pour une
/// consommation directe sans `StreamExt`.
pub struct DisturbanceStream {
    rx: mpsc::Receiver<Result<DisturbanceResult, DisturbanceError>>,
}

impl DisturbanceStream {
    /// Prochaine parcelle, ou `None` à l'épuisement du curseur
    pub async fn next_result(&mut self) -> Option<Result<DisturbanceResult, DisturbanceError>> {
        self.rx.recv().await
    }
}

impl Stream for DisturbanceStream {
    type Item = Result<DisturbanceResult, DisturbanceError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Recherche les parcelles dont la surface forêt a diminué d'au moins
/// `area_threshold` m² entre `start_year` et `end_year`, dans l'emprise
///
/// Les paramètres sont validés avant toute exécution; l'emprise est
/// reprojetée vers le SRID de stockage avant la construction de la
/// requête. Les résultats arrivent au fil du curseur, sans
/// matérialisation complète. Zéro résultat est un succès (flux vide).
pub async fn find_disturbed_parcels(
    pool: &Pool,
    source: &QuerySource,
    params: DisturbanceParams,
) -> Result<DisturbanceStream, DisturbanceError> {
    source
        .validate()
        .map_err(|e| DisturbanceError::invalid_arguments(e.to_string()))?;
    params.validate()?;

    // Reprojection AVANT toute construction de requête: le SQL ne voit
    // jamais autre chose que du 4326
    let bounds_epsg = params.bounds.epsg;
    let bounds_4326 = if params.bounds.is_wgs84() {
        params.bounds.geometry.clone()
    } else {
        let reprojector = Reprojector::new(bounds_epsg, WGS84_SRID).map_err(|e| {
            DisturbanceError::Reprojection {
                epsg: bounds_epsg,
                reason: e.to_string(),
            }
        })?;
        reprojector
            .transform_geometry(&params.bounds.geometry)
            .map_err(|e| DisturbanceError::Reprojection {
                epsg: bounds_epsg,
                reason: e.to_string(),
            })?
    };

    let bounds_ewkb = geometry_to_ewkb(&bounds_4326, WGS84_SRID)?;

    let sql = build_query(source, params.limit.is_some());
    let values = BoundValues {
        start_year: params.start_year,
        end_year: params.end_year,
        forest_classes: source.forest_classes.clone(),
        bounds_ewkb,
        area_threshold: params.area_threshold,
        limit: params.limit,
    };

    debug!(
        start_year = params.start_year,
        end_year = params.end_year,
        area_threshold = params.area_threshold,
        bounds_epsg = bounds_epsg,
        limit = ?params.limit,
        "Starting disturbance query"
    );

    let fetch_size = source.fetch_size;
    let (tx, rx) = mpsc::channel(fetch_size.max(1) as usize);

    let pool = pool.clone();
    tokio::spawn(drive_query(pool, sql, values, fetch_size, tx));

    Ok(DisturbanceStream { rx })
}

/// Tâche pilote: possède la connexion et le curseur jusqu'à la fin du flux
async fn drive_query(
    pool: Pool,
    sql: String,
    values: BoundValues,
    fetch_size: i32,
    tx: mpsc::Sender<Result<DisturbanceResult, DisturbanceError>>,
) {
    let outcome: Result<Option<u64>, DisturbanceError> = async {
        let mut client = pool.get().await?;
        let transaction = client.build_transaction().read_only(true).start().await?;

        let statement = transaction.prepare(&sql).await?;
        let portal = transaction.bind(&statement, &values.as_params()).await?;

        let mut yielded: u64 = 0;
        loop {
            let rows = transaction.query_portal(&portal, fetch_size).await?;
            let exhausted = rows.len() < fetch_size as usize;

            for row in rows {
                let record = DisturbanceResult::from_row(&row)?;
                if tx.send(Ok(record)).await.is_err() {
                    // Consommateur parti: le drop de la transaction fait le
                    // rollback et ferme le portal
                    debug!(yielded = yielded, "Consumer dropped, closing cursor");
                    return Ok(None);
                }
                yielded += 1;
            }

            if exhausted {
                break;
            }
        }

        transaction.commit().await?;
        Ok(Some(yielded))
    }
    .await;

    match outcome {
        Ok(Some(yielded)) => debug!(yielded = yielded, "Disturbance query complete"),
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, "Disturbance query failed");
            // Le consommateur peut déjà être parti; dans ce cas l'erreur
            // n'intéresse plus personne
            let _ = tx.send(Err(e)).await;
        }
    }
}
