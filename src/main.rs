//! sqlbot CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use serde::Serialize;
use sqlbot::{
    commands::{
        cmd_delete_table, cmd_generate, cmd_ingest, cmd_init, cmd_list_queries, cmd_list_tables,
        cmd_reindex, cmd_search_tables, cmd_show_query, cmd_show_table, cmd_status,
        print_generation, print_ingest_stats, print_queries, print_query, print_reindex_stats,
        print_search_results, print_status, print_table, print_tables, IngestFormat, InitOptions,
    },
    config::Config,
    error::{Error, Result},
    meta::{MetaDb, DEFAULT_PAGE_SIZE},
    store::QdrantStore,
    AppContext,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sqlbot")]
#[command(version, about = "Generate SQL from natural language using your schema as context", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "SQLBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize sqlbot configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Ingest table definitions from a DDL or JSON file
    Ingest {
        /// File containing CREATE TABLE statements or a JSON array of tables
        path: PathBuf,

        /// Input format (detected from the extension when omitted)
        #[arg(long, value_enum)]
        format: Option<IngestFormat>,

        /// Update tables that already exist instead of failing them
        #[arg(long)]
        replace: bool,
    },

    /// Inspect and manage the table catalog
    Tables {
        #[command(subcommand)]
        action: TablesAction,
    },

    /// Generate SQL from a natural-language description
    Generate {
        /// What the query should do
        description: String,

        /// Use these tables instead of retrieving them (repeatable)
        #[arg(short, long = "table")]
        tables: Vec<String>,
    },

    /// Browse previously generated queries
    Queries {
        #[command(subcommand)]
        action: QueriesAction,
    },

    /// Re-embed every stored table into the vector index
    Reindex,

    /// Show system status
    Status,

    /// Manage Qdrant vector database
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum TablesAction {
    /// List stored tables
    List {
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show one table
    Show {
        name: String,

        /// Render as a CREATE TABLE statement
        #[arg(long)]
        ddl: bool,
    },

    /// Find tables relevant to a phrase
    Search {
        phrase: String,

        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
    },

    /// Delete a table and its vectors
    Delete { name: String },
}

#[derive(Subcommand)]
enum QueriesAction {
    /// List generated queries, newest first
    List {
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show one query
    Show { id: String },
}

/// Database management actions
#[derive(Subcommand)]
enum DbAction {
    /// Initialize/create the Qdrant collection
    Init,

    /// Show Qdrant collection status
    Status,

    /// Reset the collection (delete all vectors and recreate)
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,

        /// Also delete every stored table and query
        #[arg(long)]
        catalog: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config, force).await;
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "sqlbot", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    let db = MetaDb::connect(&config).await?;
    db.init_schema().await?;
    let qdrant = Arc::new(QdrantStore::connect(&config)?);

    let json = cli.json;
    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Status => {
            let status = cmd_status(&config, &db, &qdrant).await?;
            if json {
                print_json(&status)?;
            } else {
                print_status(&status);
            }
        }

        Commands::Db { action } => {
            handle_db_action(&db, &qdrant, action, json).await?;
        }

        command => {
            let ctx = AppContext::with_stores(config, Arc::new(db), qdrant.clone())?;
            handle_catalog_command(&ctx, &qdrant, command, json).await?;
        }
    }

    Ok(())
}

async fn handle_catalog_command(
    ctx: &AppContext,
    qdrant: &QdrantStore,
    command: Commands,
    json: bool,
) -> Result<()> {
    match command {
        Commands::Ingest {
            path,
            format,
            replace,
        } => {
            let stats = cmd_ingest(ctx, &path, format, replace).await?;
            if json {
                print_json(&stats)?;
            } else {
                print_ingest_stats(&stats);
            }
        }

        Commands::Tables { action } => match action {
            TablesAction::List { limit, offset } => {
                let tables = cmd_list_tables(ctx, limit, offset).await?;
                if json {
                    print_json(&tables)?;
                } else {
                    print_tables(&tables);
                }
            }
            TablesAction::Show { name, ddl } => {
                let table = cmd_show_table(ctx, &name).await?;
                if json {
                    print_json(&table)?;
                } else {
                    print_table(&table, ddl);
                }
            }
            TablesAction::Search { phrase, limit } => {
                let result = cmd_search_tables(ctx, &phrase, limit).await?;
                if json {
                    print_json(&result)?;
                } else {
                    print_search_results(&result);
                }
            }
            TablesAction::Delete { name } => {
                cmd_delete_table(ctx, &name).await?;
                if json {
                    println!(r#"{{"status": "ok", "deleted": {}}}"#, serde_json::to_string(&name)?);
                } else {
                    println!("✓ Table '{}' deleted", name);
                }
            }
        },

        Commands::Generate {
            description,
            tables,
        } => {
            let generation = cmd_generate(ctx, &description, &tables).await?;
            if json {
                print_json(&generation)?;
            } else {
                print_generation(&generation);
            }
        }

        Commands::Queries { action } => match action {
            QueriesAction::List { limit, offset } => {
                let queries = cmd_list_queries(ctx, limit, offset).await?;
                if json {
                    print_json(&queries)?;
                } else {
                    print_queries(&queries);
                }
            }
            QueriesAction::Show { id } => {
                let query = cmd_show_query(ctx, &id).await?;
                if json {
                    print_json(&query)?;
                } else {
                    print_query(&query);
                }
            }
        },

        Commands::Reindex => {
            qdrant.ensure_collection().await?;
            let stats = cmd_reindex(ctx).await?;
            if json {
                print_json(&stats)?;
            } else {
                print_reindex_stats(&stats);
            }
        }

        Commands::Init { .. }
        | Commands::Completions { .. }
        | Commands::Status
        | Commands::Db { .. } => unreachable!(),
    }

    Ok(())
}

async fn handle_init(config: Option<PathBuf>, force: bool) -> Result<()> {
    // A .toml path names the file, anything else names the directory
    let (base_dir, config_path) = match config {
        Some(path) if path.extension().map_or(false, |e| e == "toml") => {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir);
            (base, path)
        }
        Some(dir) => (dir.clone(), dir.join("config.toml")),
        None => {
            let base = Config::default_base_dir();
            (base.clone(), base.join("config.toml"))
        }
    };

    let config = cmd_init(InitOptions {
        base_dir,
        config_path,
        force,
    })
    .await?;

    println!("✓ sqlbot initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("  Database: {}", config.paths.db_file.display());
    println!("\nNext steps:");
    println!("  1. Export {} and {}", config.embedding.api_key_env, config.llm.api_key_env);
    println!("  2. Start Qdrant: docker run -p 6333:6333 -p 6334:6334 qdrant/qdrant");
    println!("  3. Ingest a schema: sqlbot ingest schema.sql");
    println!("  4. Generate SQL: sqlbot generate \"monthly revenue per customer\"");

    Ok(())
}

async fn handle_db_action(db: &MetaDb, store: &QdrantStore, action: DbAction, json: bool) -> Result<()> {
    match action {
        DbAction::Init => {
            store.ensure_collection().await?;
            if json {
                println!(r#"{{"status": "ok", "message": "Collection initialized"}}"#);
            } else {
                println!("✓ Qdrant collection '{}' initialized", store.collection());
            }
        }
        DbAction::Status => match store.get_collection_info().await? {
            Some(info) => {
                if json {
                    println!(
                        r#"{{"exists": true, "points_count": {}, "indexed_vectors_count": {}, "status": "{}"}}"#,
                        info.points_count, info.indexed_vectors_count, info.status
                    );
                } else {
                    println!("Qdrant Collection Status:");
                    println!("  Status: {}", info.status);
                    println!("  Points: {}", info.points_count);
                    println!("  Indexed Vectors: {}", info.indexed_vectors_count);
                }
            }
            None => {
                if json {
                    println!(r#"{{"exists": false}}"#);
                } else {
                    println!("Collection does not exist. Run 'sqlbot db init' to create it.");
                }
            }
        },
        DbAction::Reset { yes, catalog } => {
            if !yes {
                return Err(Error::InvalidInput(
                    "this deletes all indexed vectors; run with --yes to confirm".to_string(),
                ));
            }
            store.reset_collection().await?;
            if catalog {
                db.clear().await?;
            }
            if json {
                println!(r#"{{"status": "ok", "message": "Collection reset"}}"#);
            } else {
                println!("✓ Qdrant collection reset (all vectors deleted and collection recreated)");
                if catalog {
                    println!("✓ Catalog cleared");
                } else {
                    println!("  Run 'sqlbot reindex' to rebuild vectors from the catalog");
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(file) if file.extension().map_or(false, |e| e == "toml") => {
            if !file.exists() {
                return Err(Error::NotInitialized);
            }
            Config::load(file)
        }
        dir => {
            let config = Config::load_from(dir.map(Path::to_path_buf))?;
            if !config.paths.config_file.exists() {
                return Err(Error::NotInitialized);
            }
            Ok(config)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
