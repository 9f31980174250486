//! Blog store command-line tool
//!
//! Connects to the store, brings the schema up to date and runs one
//! operation. Results go to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use blog_core::config::{AppConfig, LoggingConfig};
use blog_db::{auto_migrate, seed_demo, Database, MigrationReport};

#[derive(Parser, Debug)]
#[command(name = "blog", author, version, about = "Blog store maintenance and queries")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bring the schema up to date and print what changed
    Migrate,
    /// Insert a demo user with two commented posts
    Seed {
        /// Username of the demo user
        #[arg(long, default_value = "demo")]
        username: String,
    },
    /// Show a user with every post and each post's comments
    UserPosts {
        user_id: i64,
    },
    /// Show the post with the most comments
    MostCommented {
        /// List every post tied at the top instead of one
        #[arg(long)]
        all: bool,
    },
    /// Soft-delete every comment of a post
    DeleteComments {
        post_id: i64,
    },
    /// Restore the soft-deleted comments of a post
    RestoreComments {
        post_id: i64,
    },
    /// Permanently remove the soft-deleted comments of a post
    PurgeComments {
        post_id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database.display_target(),
        "Starting blog"
    );

    let db = Database::connect(&config.database, &config.logging)
        .await
        .context("Failed to connect to database")?;
    let report = auto_migrate(db.pool(), config.database.schema.as_deref())
        .await
        .context("Failed to migrate schema")?;

    let result = run(&db, cli.command, report).await;
    db.close().await;

    match result? {
        Some(output) => print_json(&output),
        None => Ok(()),
    }
}

/// Run one command; `None` means nothing to print
async fn run(
    db: &Database,
    command: Option<Command>,
    migration: MigrationReport,
) -> Result<Option<serde_json::Value>> {
    let Some(command) = command else {
        return Ok(None);
    };

    let output = match command {
        // already migrated at startup
        Command::Migrate => to_value(&migration)?,
        Command::Seed { username } => {
            let report = seed_demo(db.pool(), &username)
                .await
                .context("Failed to seed demo data")?;
            to_value(&report)?
        }
        Command::UserPosts { user_id } => {
            let tree = db
                .users()
                .find_with_posts_and_comments(user_id)
                .await
                .with_context(|| format!("Failed to load posts of user {}", user_id))?;
            to_value(&tree)?
        }
        Command::MostCommented { all: false } => {
            let top = db
                .posts()
                .most_commented()
                .await
                .context("Failed to find the most commented post")?;
            to_value(&top)?
        }
        Command::MostCommented { all: true } => {
            let top = db
                .posts()
                .most_commented_all()
                .await
                .context("Failed to find the most commented posts")?;
            to_value(&top)?
        }
        Command::DeleteComments { post_id } => {
            let deleted = db
                .comments()
                .delete_by_post(post_id)
                .await
                .with_context(|| format!("Failed to delete comments of post {}", post_id))?;
            json!({ "post_id": post_id, "deleted": deleted })
        }
        Command::RestoreComments { post_id } => {
            let restored = db
                .comments()
                .restore_by_post(post_id)
                .await
                .with_context(|| format!("Failed to restore comments of post {}", post_id))?;
            json!({ "post_id": post_id, "restored": restored })
        }
        Command::PurgeComments { post_id } => {
            let purged = db
                .comments()
                .purge_deleted(post_id)
                .await
                .with_context(|| format!("Failed to purge comments of post {}", post_id))?;
            json!({ "post_id": post_id, "purged": purged })
        }
    };

    Ok(Some(output))
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).context("Failed to serialize result")
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", text);
    Ok(())
}

/// Initialize tracing/logging.
///
/// `RUST_LOG` wins over the configured filter. sqlx statement logs arrive
/// through the `log` bridge installed by `init`.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
