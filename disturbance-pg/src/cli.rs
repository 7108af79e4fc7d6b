//! Définition et implémentation des commandes CLI
//!
//! CLI simplifiée:
//! - défaut: requête de perturbation forestière, sortie GeoJSON ou résumé
//! - `classes`: affiche le catalogue des classes d'occupation du sol

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use landcover::Bounds;

use crate::config::QuerySource;
use crate::disturbance::{find_disturbed_parcels, DisturbanceParams, DEFAULT_AREA_THRESHOLD_SQ_M};
use crate::export::FeatureCollectionWriter;
use crate::pool::{create_pool, test_connection, DatabaseConfig};

#[derive(Subcommand)]
pub enum Commands {
    /// Print the land-cover class catalog
    Classes,
}

/// Arguments de la requête de perturbation (commande par défaut)
#[derive(clap::Args)]
pub struct QueryArgs {
    /// Reference year for the forest aggregate
    #[arg(long)]
    pub start_year: i32,

    /// Comparison year for the forest aggregate
    #[arg(long)]
    pub end_year: i32,

    /// Minimum forest area loss in square meters (default: 20 hectares)
    #[arg(long, default_value_t = DEFAULT_AREA_THRESHOLD_SQ_M)]
    pub area_threshold: f64,

    /// Query bounds as WKT (défaut : monde entier)
    #[arg(long)]
    pub bounds: Option<String>,

    /// Path to a GeoJSON file holding the query bounds
    #[arg(long, conflicts_with = "bounds")]
    pub bounds_file: Option<PathBuf>,

    /// EPSG code of the provided bounds
    #[arg(long, default_value_t = 4326)]
    pub bounds_epsg: u32,

    /// Cap the number of returned parcels (sorted by parcel id)
    #[arg(long)]
    pub limit: Option<i64>,

    /// PostgreSQL schema holding the parcel tables
    #[arg(long)]
    pub schema: Option<String>,

    /// Path to a JSON query-source config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write results as a GeoJSON FeatureCollection to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL database name (défaut : env PGDATABASE / forest)
    #[arg(long)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long)]
    pub ssl: Option<String>,
}

/// Exécute la requête de perturbation
pub async fn cmd_query(args: QueryArgs) -> Result<()> {
    // Source de requête (config JSON ou défauts), schéma surchargé en CLI
    let mut source = match &args.config {
        Some(path) => QuerySource::load(path)?,
        None => QuerySource::default(),
    };
    if let Some(schema) = &args.schema {
        source.schema = schema.clone();
    }
    source.validate()?;

    let bounds = resolve_bounds(&args)?;
    let bounds_epsg = bounds.epsg;

    let mut params = DisturbanceParams::new(args.start_year, args.end_year)
        .with_area_threshold(args.area_threshold)
        .with_bounds(bounds);
    if let Some(limit) = args.limit {
        params = params.with_limit(limit);
    }

    println!("=== Forest disturbance query ===");
    println!("Years: {} -> {}", args.start_year, args.end_year);
    println!("Threshold: {} sq m", args.area_threshold);
    println!(
        "Bounds: {} (EPSG:{})",
        if args.bounds.is_some() || args.bounds_file.is_some() {
            "custom"
        } else {
            "world"
        },
        bounds_epsg
    );
    println!("Source: {} / {}", source.parcels(), source.landcover());
    if let Some(limit) = args.limit {
        println!("Limit: {}", limit);
    }

    // Connecter à PostgreSQL
    let mut db_config = DatabaseConfig::from_env();
    apply_database_overrides(
        &mut db_config,
        args.host,
        args.database,
        args.user,
        args.password,
        args.port,
        args.ssl,
    );
    println!(
        "Database: {}@{}:{}/{} (SSL: {:?})",
        db_config.user, db_config.host, db_config.port, db_config.dbname, db_config.ssl_mode
    );

    let pool = create_pool(&db_config).await?;
    test_connection(&pool).await?;
    println!("Connected to PostgreSQL");

    let started_at = std::time::Instant::now();
    let mut stream = find_disturbed_parcels(&pool, &source, params).await?;

    // Consommation incrémentale: chaque ligne est écrite dès réception
    let count = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = FeatureCollectionWriter::new(BufWriter::new(file))?;

            while let Some(item) = stream.next_result().await {
                let result = item?;
                writer.write_result(&result)?;
            }
            writer.finish()?
        }
        None => {
            let mut count = 0usize;
            while let Some(item) = stream.next_result().await {
                let result = item?;
                let loss = result.forest_area_loss().unwrap_or(0.0);
                println!("{}  loss {:.0} sq m", result.parcel_id, loss);
                count += 1;
            }
            count
        }
    };

    let duration = started_at.elapsed();

    println!("\n=== Summary ===");
    println!("Disturbed parcels: {}", count);
    if let Some(path) = &args.output {
        println!("Output: {}", path.display());
    }
    println!("Duration: {:.2?}", duration);

    info!(count = count, "Disturbance query finished");

    Ok(())
}

/// Affiche le catalogue des classes
pub fn cmd_classes() {
    println!("code  label               forest");
    for class in landcover::CLASSES {
        println!(
            "{:>4}  {:<18}  {}",
            class.code,
            class.label,
            if landcover::is_forest(class.code) {
                "yes"
            } else {
                ""
            }
        );
    }
}

/// Résout l'emprise depuis les arguments (WKT, fichier GeoJSON ou monde)
fn resolve_bounds(args: &QueryArgs) -> Result<Bounds> {
    if let Some(wkt) = &args.bounds {
        return Ok(Bounds::from_wkt(wkt, args.bounds_epsg)?);
    }
    if let Some(path) = &args.bounds_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bounds file {}", path.display()))?;
        return Ok(Bounds::from_geojson(&raw, args.bounds_epsg)?);
    }
    Ok(Bounds::world())
}

fn apply_database_overrides(
    config: &mut DatabaseConfig,
    host: Option<String>,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
    port: Option<u16>,
    ssl: Option<String>,
) {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(database) = database {
        config.dbname = database;
    }
    if let Some(user) = user {
        config.user = user;
    }
    if let Some(password) = password {
        config.password = Some(password);
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(ssl) = ssl {
        if let Ok(mode) = ssl.parse() {
            config.ssl_mode = mode;
        }
    }
}
