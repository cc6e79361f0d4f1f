//! Kanban Board CLI
//!
//! Drives the ordering engine against a board server.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use kanban_board::{
    BoardConfig, BoardError, BoardResult, BoardSession, Bucket, CommitOutcome, GestureEnd,
    HoverTarget, HttpAuthority, ItemId, PromotionOutcome, RemoteAuthority,
};

#[derive(Parser)]
#[command(name = "kanban-board", version, about = "Optimistic kanban board client")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file
    #[arg(long, value_name = "PATH", env = "KANBAN_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Board server base URL (overrides config and KANBAN_API_URL)
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true)]
    token: Option<String>,

    /// Only show and touch items of this project
    #[arg(long, value_name = "ID", global = true)]
    project: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Print every column in display order
    List,

    /// Drag an item into a column, optionally in front of another item
    Move {
        id: ItemId,
        #[arg(value_parser = parse_bucket)]
        bucket: Bucket,
        /// Drop in front of this item instead of at the end
        #[arg(long, value_name = "ID")]
        before: Option<ItemId>,
    },

    /// Toggle the important flag
    Star { id: ItemId },
}

fn parse_bucket(s: &str) -> Result<Bucket, String> {
    Bucket::from_name(s).ok_or_else(|| format!("unknown column '{}', expected new, working or complete", s))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(hint) = hint(&e) {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn hint(err: &BoardError) -> Option<&'static str> {
    if err.is_unauthorized() {
        Some("pass a valid token with --token or KANBAN_TOKEN")
    } else {
        None
    }
}

async fn run(cli: Cli) -> BoardResult<()> {
    let mut config = match &cli.config {
        Some(path) => BoardConfig::load(path)?,
        None => BoardConfig::default(),
    }
    .with_env();
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(token) = cli.token {
        config.token = Some(token);
    }
    if cli.project.is_some() {
        config.project_id = cli.project;
    }

    if let Some(dir) = &config.log_dir {
        let logger = rolling_logger::init(rolling_logger::LoggerConfig::new(dir))
            .map_err(|e| BoardError::Internal(format!("logger: {}", e)))?;
        log::info!("[BOARD] logging to {}", logger.dir().display());
    }

    let session = BoardSession::new(HttpAuthority::from_config(&config), config);
    session.load().await?;

    match cli.command {
        Command::List => print_board(&session),
        Command::Move { id, bucket, before } => move_item(&session, id, bucket, before).await?,
        Command::Star { id } => match session.toggle_important(id).await {
            PromotionOutcome::Promoted => println!("#{} marked important", id),
            PromotionOutcome::Demoted => println!("#{} no longer important", id),
            PromotionOutcome::NotFound => {
                return Err(BoardError::NotFound(format!("Item {} not found", id)))
            }
            PromotionOutcome::Reverted { error, .. } => return Err(error),
        },
    }
    Ok(())
}

async fn move_item<A: RemoteAuthority>(
    session: &BoardSession<A>,
    id: ItemId,
    bucket: Bucket,
    before: Option<ItemId>,
) -> BoardResult<()> {
    let (current, last) = session.board().with(|b| {
        let last = b.bucket_sequence(bucket).into_iter().filter(|&x| x != id).last();
        (b.bucket_of(id), last)
    });
    let current = current.ok_or_else(|| BoardError::NotFound(format!("Item {} not found", id)))?;

    let target = match before {
        Some(over) => {
            if session.board().with(|b| b.bucket_of(over)) != Some(bucket) {
                return Err(BoardError::InvalidInput(format!("Item {} is not in {}", over, bucket)));
            }
            HoverTarget::Item(over)
        }
        // Hovering the last card of the item's own column moves it to the end
        None => match last {
            Some(last) if current == bucket => HoverTarget::Item(last),
            _ => HoverTarget::Column(bucket),
        },
    };

    session.drag_start(id);
    session.drag_over(target);
    match session.drag_end(GestureEnd::Dropped).await {
        Some(CommitOutcome::Committed) => println!("#{} moved to {}", id, bucket),
        Some(CommitOutcome::Unchanged) | None => println!("#{} already there", id),
        Some(CommitOutcome::Resynced(error)) => return Err(error),
        Some(CommitOutcome::ResyncFailed { commit, .. }) => return Err(commit),
        Some(CommitOutcome::Vanished) => {
            return Err(BoardError::NotFound(format!("Item {} disappeared", id)))
        }
    }
    print_board(session);
    Ok(())
}

fn print_board<A>(session: &BoardSession<A>)
where
    A: RemoteAuthority,
{
    session.board().with(|b| {
        for bucket in Bucket::ALL {
            let items = b.bucket_items(bucket);
            println!("{} ({})", bucket.label(), items.len());
            for item in items {
                let star = if item.important { "* " } else { "" };
                println!("  {:>3}  #{:<5} {}{}", item.position, item.id, star, item.title);
            }
        }
    });
}
