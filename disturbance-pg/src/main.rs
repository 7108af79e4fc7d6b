//! Point d'entrée CLI pour disturbance-pg

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;
mod config;
mod disturbance;
mod export;
mod pool;
mod reproject;

use cli::{Commands, QueryArgs};

/// Détection de perturbation forestière sur des parcelles PostGIS
#[derive(Parser)]
#[command(name = "disturbance-pg")]
#[command(author, version)]
#[command(about = "Rechercher les parcelles ayant perdu de la surface forestière entre deux années")]
#[command(long_about = "Interroge les agrégats d'occupation du sol par parcelle dans PostGIS et \
retourne, en flux, les parcelles dont la surface forêt a diminué d'au moins un seuil donné \
entre deux années, dans une emprise spatiale.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: requête de perturbation)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments de la requête (commande par défaut)
    #[command(flatten)]
    query: Option<QueryArgs>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Classes) => {
            cli::cmd_classes();
        }
        None => {
            // Commande par défaut: requête de perturbation
            let args = cli
                .query
                .expect("Arguments de requête requis (--start-year et --end-year)");
            info!(
                start_year = args.start_year,
                end_year = args.end_year,
                "Disturbance query"
            );
            cli::cmd_query(args).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
