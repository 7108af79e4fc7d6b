//! Tests d'intégration PostgreSQL/PostGIS
//!
//! Ces tests nécessitent une base PostgreSQL avec PostGIS.
//! Configuration via variables d'environnement:
//! - PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE
//!
//! Exécution:
//! ```bash
//! # Avec PostgreSQL local
//! cargo test --test postgres_integration -- --ignored
//!
//! # Avec Docker
//! docker run -d --name postgres-test -e POSTGRES_PASSWORD=test -p 5432:5432 postgis/postgis
//! PGPASSWORD=test cargo test --test postgres_integration -- --ignored
//! ```
//!
//! Chaque test utilise son propre schéma pour pouvoir tourner en parallèle.
//! Le schéma appartient à la couche de stockage: le DDL n'existe que dans
//! ce harnais de test.

use anyhow::Result;
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use tokio_postgres::NoTls;

use disturbance_pg::disturbance::DisturbanceError;
use disturbance_pg::{find_disturbed_parcels, DisturbanceParams, DisturbanceResult, QuerySource};
use landcover::Bounds;

/// Configuration de test
fn test_config() -> Config {
    let mut cfg = Config::new();
    cfg.host = Some(std::env::var("PGHOST").unwrap_or_else(|_| "localhost".into()));
    cfg.port = Some(
        std::env::var("PGPORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432),
    );
    cfg.dbname = Some(std::env::var("PGDATABASE").unwrap_or_else(|_| "forest_test".into()));
    cfg.user = Some(std::env::var("PGUSER").unwrap_or_else(|_| "postgres".into()));
    cfg.password = std::env::var("PGPASSWORD").ok();
    cfg
}

/// Crée un pool de connexions de test
async fn create_test_pool() -> Result<Pool> {
    let cfg = test_config();
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
    Ok(pool)
}

/// Pool limité à une seule connexion (tests de libération de ressources)
async fn create_single_connection_pool() -> Result<Pool> {
    let mut cfg = test_config();
    cfg.pool = Some(PoolConfig {
        max_size: 1,
        ..Default::default()
    });
    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
    Ok(pool)
}

/// Crée le schéma de test avec les tables parcelles + occupation du sol
async fn setup_test_schema(pool: &Pool, schema: &str) -> Result<()> {
    let client = pool.get().await?;

    client
        .batch_execute(&format!(
            r#"
            DROP SCHEMA IF EXISTS {schema} CASCADE;
            CREATE SCHEMA {schema};

            CREATE EXTENSION IF NOT EXISTS postgis;

            CREATE TABLE {schema}.parcels (
                id TEXT PRIMARY KEY,
                geometry geometry(Geometry, 4326),
                area_sq_m DOUBLE PRECISION
            );

            CREATE TABLE {schema}.parcel_landcover (
                id BIGSERIAL PRIMARY KEY,
                parcel_id TEXT NOT NULL REFERENCES {schema}.parcels(id),
                class_code INTEGER NOT NULL,
                year INTEGER NOT NULL,
                area_sq_m DOUBLE PRECISION NOT NULL,
                UNIQUE (parcel_id, year, class_code)
            );

            CREATE INDEX idx_{schema}_parcels_geom ON {schema}.parcels USING GIST (geometry);
            CREATE INDEX idx_{schema}_landcover_year ON {schema}.parcel_landcover (year, class_code);
            "#,
        ))
        .await?;

    Ok(())
}

/// Insère une parcelle carrée de 0.01 degré de côté
async fn insert_parcel(pool: &Pool, schema: &str, id: &str, x: f64, y: f64) -> Result<()> {
    let client = pool.get().await?;
    let wkt = format!(
        "POLYGON(({x} {y}, {x2} {y}, {x2} {y2}, {x} {y2}, {x} {y}))",
        x = x,
        y = y,
        x2 = x + 0.01,
        y2 = y + 0.01,
    );
    client
        .execute(
            &format!(
                "INSERT INTO {}.parcels (id, geometry, area_sq_m) VALUES ($1, ST_GeomFromText($2, 4326), $3)",
                schema
            ),
            &[&id, &wkt, &600_000.0_f64],
        )
        .await?;
    Ok(())
}

/// Insère un fait d'occupation du sol
async fn insert_landcover(
    pool: &Pool,
    schema: &str,
    parcel_id: &str,
    class_code: i32,
    year: i32,
    area_sq_m: f64,
) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute(
            &format!(
                "INSERT INTO {}.parcel_landcover (parcel_id, class_code, year, area_sq_m) VALUES ($1, $2, $3, $4)",
                schema
            ),
            &[&parcel_id, &class_code, &year, &area_sq_m],
        )
        .await?;
    Ok(())
}

/// Scénario de référence:
/// - P1: forêt 500 000 m² en 2018, 250 000 en 2021 (perte 250 000) — retenue
/// - P2: 300 000 -> 295 000 (perte 5 000) — exclue; ses surfaces non-forêt
///   (classe 5) chutent fortement et ne doivent PAS compter
/// - P3: loin du cluster, perte 900 000 — retenue monde, exclue sur emprise
/// - P4: pas d'agrégat 2021 — exclue (jointure interne)
/// - P5: 350 000 -> 150 000 (perte exactement 200 000) — retenue (borne incluse)
async fn seed_scenario(pool: &Pool, schema: &str) -> Result<()> {
    insert_parcel(pool, schema, "P1", 10.00, 45.00).await?;
    insert_parcel(pool, schema, "P2", 10.02, 45.00).await?;
    insert_parcel(pool, schema, "P3", 50.00, 20.00).await?;
    insert_parcel(pool, schema, "P4", 10.06, 45.00).await?;
    insert_parcel(pool, schema, "P5", 10.04, 45.00).await?;

    insert_landcover(pool, schema, "P1", 2, 2018, 400_000.0).await?;
    insert_landcover(pool, schema, "P1", 4, 2018, 100_000.0).await?;
    insert_landcover(pool, schema, "P1", 2, 2021, 250_000.0).await?;

    insert_landcover(pool, schema, "P2", 2, 2018, 300_000.0).await?;
    insert_landcover(pool, schema, "P2", 2, 2021, 295_000.0).await?;
    insert_landcover(pool, schema, "P2", 5, 2018, 1_000_000.0).await?;
    insert_landcover(pool, schema, "P2", 5, 2021, 0.0).await?;

    insert_landcover(pool, schema, "P3", 2, 2018, 1_000_000.0).await?;
    insert_landcover(pool, schema, "P3", 2, 2021, 100_000.0).await?;

    insert_landcover(pool, schema, "P4", 2, 2018, 500_000.0).await?;

    insert_landcover(pool, schema, "P5", 2, 2018, 350_000.0).await?;
    insert_landcover(pool, schema, "P5", 2, 2021, 150_000.0).await?;

    Ok(())
}

fn source_for(schema: &str) -> QuerySource {
    let mut source = QuerySource::default();
    source.schema = schema.to_string();
    source
}

/// Emprise couvrant le cluster P1/P2/P4/P5 mais pas P3
fn cluster_bounds() -> Bounds {
    Bounds::from_wkt(
        "POLYGON((9.9 44.9, 10.1 44.9, 10.1 45.1, 9.9 45.1, 9.9 44.9))",
        4326,
    )
    .unwrap()
}

/// Consomme tout le flux et retourne les résultats
async fn collect_results(
    pool: &Pool,
    source: &QuerySource,
    params: DisturbanceParams,
) -> Result<Vec<DisturbanceResult>, DisturbanceError> {
    let mut stream = find_disturbed_parcels(pool, source, params).await?;
    let mut results = Vec::new();
    while let Some(item) = stream.next_result().await {
        results.push(item?);
    }
    Ok(results)
}

fn sorted_ids(results: &[DisturbanceResult]) -> Vec<String> {
    let mut ids: Vec<String> = results.iter().map(|r| r.parcel_id.clone()).collect();
    ids.sort();
    ids
}

/// Test de connexion basique
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_database_connection() {
    let pool = create_test_pool().await.expect("Failed to create pool");
    let client = pool.get().await.expect("Failed to get client");

    let row = client
        .query_one("SELECT 1 as test", &[])
        .await
        .expect("Query failed");
    let value: i32 = row.get("test");
    assert_eq!(value, 1);
}

/// Scénario de référence sur l'emprise monde
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_disturbance_scenario() {
    let schema = "forest_it_scenario";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    let params = DisturbanceParams::new(2018, 2021);
    let results = collect_results(&pool, &source_for(schema), params)
        .await
        .expect("Query failed");

    assert_eq!(sorted_ids(&results), vec!["P1", "P3", "P5"]);

    let p1 = results.iter().find(|r| r.parcel_id == "P1").unwrap();
    assert_eq!(p1.content["start_forest_area"], 500_000.0);
    assert_eq!(p1.content["end_forest_area"], 250_000.0);
    assert_eq!(p1.forest_area_loss(), Some(250_000.0));
    assert_eq!(p1.content["area_sq_m"], 600_000.0);

    // La géométrie est décodée en type geo
    assert!(matches!(p1.geometry, geo::Geometry::Polygon(_)));
}

/// La borne du seuil est incluse; au-delà, la parcelle limite disparaît
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_threshold_boundary() {
    let schema = "forest_it_threshold";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    // P5 a perdu exactement 200 000 m²
    let at_boundary = collect_results(
        &pool,
        &source_for(schema),
        DisturbanceParams::new(2018, 2021).with_area_threshold(200_000.0),
    )
    .await
    .expect("Query failed");
    assert!(sorted_ids(&at_boundary).contains(&"P5".to_string()));

    let above_boundary = collect_results(
        &pool,
        &source_for(schema),
        DisturbanceParams::new(2018, 2021).with_area_threshold(200_001.0),
    )
    .await
    .expect("Query failed");
    assert_eq!(sorted_ids(&above_boundary), vec!["P1", "P3"]);
}

/// Filtre spatial: seules les parcelles intersectant l'emprise sortent
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_bounds_filter() {
    let schema = "forest_it_bounds";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    let params = DisturbanceParams::new(2018, 2021).with_bounds(cluster_bounds());
    let results = collect_results(&pool, &source_for(schema), params)
        .await
        .expect("Query failed");

    // P3 est hors de l'emprise malgré sa perte importante
    assert_eq!(sorted_ids(&results), vec!["P1", "P5"]);
}

/// Emprise disjointe: flux vide, pas une erreur
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_disjoint_bounds_empty() {
    let schema = "forest_it_disjoint";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    let bounds = Bounds::from_wkt(
        "POLYGON((-150 -10, -149 -10, -149 -9, -150 -9, -150 -10))",
        4326,
    )
    .unwrap();
    let params = DisturbanceParams::new(2018, 2021).with_bounds(bounds);
    let results = collect_results(&pool, &source_for(schema), params)
        .await
        .expect("Empty result should not be an error");

    assert!(results.is_empty());
}

/// Invocations répétées avec paramètres identiques: même ensemble d'ids
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_idempotent_result_set() {
    let schema = "forest_it_idempotent";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    let source = source_for(schema);
    let first = collect_results(&pool, &source, DisturbanceParams::new(2018, 2021))
        .await
        .expect("Query failed");
    let second = collect_results(&pool, &source, DisturbanceParams::new(2018, 2021))
        .await
        .expect("Query failed");

    assert_eq!(sorted_ids(&first), sorted_ids(&second));
}

/// Avec une limite, la troncature est déterministe (tri par id)
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_limit_is_deterministic() {
    let schema = "forest_it_limit";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    let params = DisturbanceParams::new(2018, 2021).with_limit(2);
    let results = collect_results(&pool, &source_for(schema), params)
        .await
        .expect("Query failed");

    // P1 < P3 < P5 par ordre lexicographique
    let ids: Vec<String> = results.iter().map(|r| r.parcel_id.clone()).collect();
    assert_eq!(ids, vec!["P1", "P3"]);
}

/// Emprise fournie en EPSG:3857: même ensemble qu'en 4326
#[cfg(feature = "reproject")]
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_reprojected_bounds_equivalence() {
    use disturbance_pg::reproject::Reprojector;

    let schema = "forest_it_reproject";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    let source = source_for(schema);
    let bounds_4326 = cluster_bounds();

    let to_mercator = Reprojector::new(4326, 3857).expect("Failed to create reprojector");
    let mercator_geom = to_mercator
        .transform_geometry(&bounds_4326.geometry)
        .expect("Failed to reproject");
    let bounds_3857 = Bounds::new(mercator_geom, 3857).unwrap();

    let with_4326 = collect_results(
        &pool,
        &source,
        DisturbanceParams::new(2018, 2021).with_bounds(bounds_4326),
    )
    .await
    .expect("Query failed");
    let with_3857 = collect_results(
        &pool,
        &source,
        DisturbanceParams::new(2018, 2021).with_bounds(bounds_3857),
    )
    .await
    .expect("Query failed");

    assert_eq!(sorted_ids(&with_4326), sorted_ids(&with_3857));
    assert_eq!(sorted_ids(&with_4326), vec!["P1", "P5"]);
}

/// Abandon du flux avant épuisement: la connexion revient au pool
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_early_drop_releases_connection() {
    let schema = "forest_it_early_drop";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");
    seed_scenario(&pool, schema).await.expect("Failed to seed");

    // Pool à une seule connexion: toute fuite bloquerait la suite
    let pool = create_single_connection_pool()
        .await
        .expect("Failed to create pool");
    let source = source_for(schema);

    {
        let mut stream = find_disturbed_parcels(&pool, &source, DisturbanceParams::new(2018, 2021))
            .await
            .expect("Failed to start stream");

        // Consommer une seule ligne puis abandonner
        let first = stream.next_result().await;
        assert!(first.is_some());
        // stream droppé ici
    }

    // La connexion doit être rendue rapidement au pool
    let client = tokio::time::timeout(std::time::Duration::from_secs(5), pool.get())
        .await
        .expect("Connection was not returned to the pool")
        .expect("Failed to get client");

    let row = client
        .query_one("SELECT 1 as test", &[])
        .await
        .expect("Pool connection unusable after early drop");
    let value: i32 = row.get("test");
    assert_eq!(value, 1);
}

/// Erreur de stockage: émise comme dernier élément, ressources libérées
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_storage_error_surfaces_and_cleans_up() {
    let schema = "forest_it_error";
    let pool = create_test_pool().await.expect("Failed to create pool");
    setup_test_schema(&pool, schema).await.expect("Failed to setup schema");

    let pool = create_single_connection_pool()
        .await
        .expect("Failed to create pool");

    let mut source = source_for(schema);
    source.landcover_table = "missing_table".to_string();

    let mut stream = find_disturbed_parcels(&pool, &source, DisturbanceParams::new(2018, 2021))
        .await
        .expect("Stream creation should succeed before execution");

    let first = stream.next_result().await;
    match first {
        Some(Err(DisturbanceError::Query(_))) => {}
        other => panic!("Expected a query error, got {:?}", other.map(|r| r.is_ok())),
    }
    assert!(stream.next_result().await.is_none());

    // Le pool reste utilisable après l'erreur
    let client = tokio::time::timeout(std::time::Duration::from_secs(5), pool.get())
        .await
        .expect("Connection was not returned to the pool")
        .expect("Failed to get client");
    client
        .query_one("SELECT 1", &[])
        .await
        .expect("Pool connection unusable after query error");
}

/// Paramètres invalides: rejet immédiat, aucune requête exécutée
#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_invalid_params_rejected_before_query() {
    let pool = create_test_pool().await.expect("Failed to create pool");

    let result = find_disturbed_parcels(
        &pool,
        &QuerySource::default(),
        DisturbanceParams::new(2018, 2021).with_area_threshold(-5.0),
    )
    .await;

    assert!(matches!(
        result,
        Err(DisturbanceError::InvalidArguments { .. })
    ));
}
