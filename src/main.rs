// Wiki bingo entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not the terminal, which hosts the REPL)
// 2. Load config
// 3. Open database, optionally seed demo data (--seed-demo)
// 4. Build the wiki client and the command dispatcher
// 5. Read commands from stdin until EOF

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use wiki_bingo::app::App;
use wiki_bingo::config;
use wiki_bingo::db::Database;
use wiki_bingo::protocol::{render, tokenize, Command};
use wiki_bingo::wiki::client::WikiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Wiki bingo starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: wiki={}, board size {}",
        config.wiki.api_url, config.board.sample_size
    );

    let db = Arc::new(Database::open(&config.database.path).context("failed to open database")?);
    info!("Database opened at {}", config.database.path);

    if std::env::args().any(|a| a == "--seed-demo") {
        db.seed_demo_data().context("failed to seed demo data")?;
        info!("Demo presets seeded");
    }

    let wiki = Arc::new(
        WikiClient::new(
            &config.wiki.api_url,
            Duration::from_secs(config.wiki.request_timeout_secs),
        )
        .context("failed to build wiki client")?,
    );

    let app = App::new(
        db,
        wiki,
        config.board.sample_size,
        config.wiki.category_page_limit,
    );

    println!("wiki bingo ready. Commands: preset | preset <name> | preset create|update|append|remove <name> <entries...> | preset delete <name> | start <game> <preset> | cache refresh <category>");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let args = tokenize(&line);
        if args.is_empty() {
            continue;
        }

        match Command::parse(&args) {
            Some(command) => {
                let reply = app.handle(command).await;
                println!("{}", render(&reply));
            }
            None => println!("Unrecognized command."),
        }
    }

    info!("Wiki bingo shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by
/// the REPL).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("wikibingo.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wiki_bingo=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
