mod config;
mod program_cmds;
mod serve_cmd;
#[cfg(test)]
mod test_util;
mod workout_cmds;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use ironplan_core::identity::generate_user_token;
use ironplan_db::pool;

use config::IronplanConfig;

#[derive(Parser)]
#[command(name = "ironplan", about = "Progressive-overload workout programs")]
struct Cli {
    /// Database URL (overrides IRONPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an ironplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/ironplan")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create and migrate the ironplan database
    DbInit,
    /// Issue an API bearer token for a user
    Token {
        /// User ID the token identifies
        user_id: Uuid,
    },
    /// Show how to load a barbell for a target weight (no database required)
    Plates {
        /// Target weight in pounds, bar included
        weight: f64,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Program management
    Program {
        #[command(subcommand)]
        command: ProgramCommands,
    },
    /// Start a program at week 1, day 1
    Start {
        /// Program ID to start
        program_id: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
    },
    /// Show today's workout for a running program
    Today {
        /// User program ID (returned by `start`)
        user_program_id: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record today's workout and move to the next one
    Complete {
        /// User program ID (returned by `start`)
        user_program_id: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
        /// JSON file with an array of completed sets
        #[arg(long)]
        file: String,
    },
    /// Stop a running program without completing it
    Stop {
        /// User program ID (returned by `start`)
        user_program_id: Uuid,
        /// Acting user
        #[arg(long)]
        user: Uuid,
    },
    /// Serve the JSON API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Upper bound on pooled database connections
        #[arg(long, default_value_t = 10)]
        max_connections: u32,
    },
}

#[derive(Subcommand)]
pub enum ProgramCommands {
    /// Create a program from a TOML (or .json) file
    Create {
        /// Path to the program file
        file: String,
        /// Creating user
        #[arg(long)]
        user: Uuid,
    },
    /// Show a program with its workouts and exercises
    Show {
        /// Program ID to show
        program_id: Uuid,
        /// Viewing user
        #[arg(long)]
        user: Uuid,
    },
    /// List programs visible to a user
    List {
        /// Viewing user
        #[arg(long)]
        user: Uuid,
    },
}

/// Execute the `ironplan init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let token_secret = config::generate_token_secret();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            token_secret: token_secret.clone(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!(
        "  auth.token_secret = {}...{}",
        &token_secret[..8],
        &token_secret[56..]
    );
    println!();
    println!("Next: run `ironplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `ironplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let db_config = config::resolve_db_config(cli_db_url);

    println!("Initializing ironplan database...");

    pool::ensure_database_exists(&db_config).await?;
    let db_pool = pool::create_pool(&db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("ironplan db-init complete.");
    Ok(())
}

/// Execute the `ironplan token` command: print a bearer token for a user.
fn cmd_token(cli_db_url: Option<&str>, user_id: Uuid) -> anyhow::Result<()> {
    let resolved = IronplanConfig::resolve(cli_db_url)?;
    let token = generate_user_token(&resolved.token_config, user_id)?;
    println!("{token}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Token { user_id } => {
            cmd_token(cli.database_url.as_deref(), user_id)?;
        }
        Commands::Plates { weight, json } => {
            workout_cmds::cmd_plates(weight, json)?;
        }
        Commands::Program { command } => {
            let db_config = config::resolve_db_config(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&db_config).await?;
            let result = program_cmds::run_program_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Start { program_id, user } => {
            let db_config = config::resolve_db_config(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&db_config).await?;
            let result = workout_cmds::cmd_start(&db_pool, user, program_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Today {
            user_program_id,
            user,
            json,
        } => {
            let db_config = config::resolve_db_config(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&db_config).await?;
            let result = workout_cmds::cmd_today(&db_pool, user, user_program_id, json).await;
            db_pool.close().await;
            result?;
        }
        Commands::Complete {
            user_program_id,
            user,
            file,
        } => {
            let db_config = config::resolve_db_config(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&db_config).await?;
            let result = workout_cmds::cmd_complete(&db_pool, user, user_program_id, &file).await;
            db_pool.close().await;
            result?;
        }
        Commands::Stop {
            user_program_id,
            user,
        } => {
            let db_config = config::resolve_db_config(cli.database_url.as_deref());
            let db_pool = pool::create_pool(&db_config).await?;
            let result = workout_cmds::cmd_stop(&db_pool, user, user_program_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve {
            bind,
            port,
            max_connections,
        } => {
            let resolved = IronplanConfig::resolve(cli.database_url.as_deref())?;
            let db_config = resolved.db_config.with_max_connections(max_connections);
            let db_pool = pool::create_pool(&db_config).await?;
            let state = serve_cmd::AppState {
                pool: db_pool.clone(),
                tokens: resolved.token_config,
            };
            let result = serve_cmd::run_serve(state, &bind, port).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
