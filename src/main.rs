use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oryn_vote::allowance::AllowanceStore;
use oryn_vote::api::{self, middleware::SecurityConfig};
use oryn_vote::board;
use oryn_vote::client::FeatureClient;
use oryn_vote::clock::SystemClock;
use oryn_vote::config::Config;
use oryn_vote::db::Database;
use oryn_vote::engine::{VoteOutcome, VotingEngine};
use oryn_vote::models::{CreateSubmissionInput, PostMessageInput, SubmissionKind};
use oryn_vote::share::{
    ShareAction, SharePlatform, ShareOutcome, ShareRewardPolicy, ShareTarget,
};
use oryn_vote::storage::FileStore;

#[derive(Parser)]
#[command(name = "oryn-vote")]
#[command(about = "Feature wishlist voting with a daily allowance")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the record store API
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "17020")]
        port: u16,
    },
    /// Insert the launch wishlist into an empty record store
    Seed,
    /// Show the leaderboard
    List,
    /// Vote for a feature
    Vote {
        /// Feature id, e.g. feat_nap
        feature_id: String,
    },
    /// Show today's remaining votes
    Energy,
    /// Share the site for a one-time bonus (line or copy)
    Share {
        #[arg(value_parser = parse_platform)]
        platform: SharePlatform,
    },
    /// Suggest a feature
    Suggest {
        #[arg(long, default_value = "")]
        idea: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Leave a wish
    Wish { text: String },
    /// Join the mailing list
    Signup { email: String },
    /// Read the message board
    Messages,
    /// Post to the message board
    Post {
        #[arg(long, default_value = "")]
        name: String,
        content: String,
    },
}

fn parse_platform(s: &str) -> Result<SharePlatform, String> {
    SharePlatform::from_str(s).ok_or_else(|| format!("unknown platform '{}' (line, copy)", s))
}

/// Prints share actions for the user to carry out.
struct ConsoleShareTarget;

impl ShareTarget for ConsoleShareTarget {
    fn perform(&self, action: &ShareAction) {
        match action {
            ShareAction::OpenLink(url) => println!("Open to share: {}", url),
            ShareAction::CopyText(text) => println!("Link to copy: {}", text),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "oryn_vote=info,tower_http=debug".into()),
    );

    // Logs go to stderr so command output stays clean.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

struct Visitor {
    store: Arc<FileStore>,
    allowance: AllowanceStore,
    client: FeatureClient,
}

impl Visitor {
    fn open(config: &Config) -> anyhow::Result<Self> {
        let store = Arc::new(FileStore::open(config.local_state_path())?);
        let allowance =
            AllowanceStore::with_policy(store.clone(), Arc::new(SystemClock), config.allowance);
        let client = FeatureClient::new(&config.api_url, config.api_key.clone());
        Ok(Self {
            store,
            allowance,
            client,
        })
    }

    fn engine(&self) -> VotingEngine {
        VotingEngine::new(Arc::new(self.client.clone()), self.allowance.clone())
    }
}

async fn print_leaderboard(engine: &VotingEngine) {
    if let Err(e) = engine.refresh().await {
        eprintln!("Leaderboard unavailable: {}", e);
        return;
    }
    for (rank, feature) in engine.features().iter().enumerate() {
        let live = if feature.is_live { " [live]" } else { "" };
        println!(
            "#{:<2} {:>5}  {:<16} {}{}",
            rank + 1,
            feature.vote_count,
            feature.id,
            feature.title,
            live
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve { port } => {
            let db = Database::open(config.database_path())?;
            db.migrate()?;

            let security = SecurityConfig::from_config(&config);
            if let Some(limiter) = &security.rate_limiter {
                limiter.spawn_cleanup(Duration::from_secs(60));
            }
            let app = api::create_router_with_security(db, security);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("Record store listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
        Commands::Seed => {
            let db = Database::open(config.database_path())?;
            db.migrate()?;
            match db.seed_default_features()? {
                0 => println!("Record store already has features; nothing seeded."),
                n => println!("Seeded {} features.", n),
            }
        }
        Commands::List => {
            let visitor = Visitor::open(&config)?;
            let engine = visitor.engine();
            print_leaderboard(&engine).await;
            println!("Votes left today: {}", engine.remaining());
        }
        Commands::Vote { feature_id } => {
            let visitor = Visitor::open(&config)?;
            let engine = visitor.engine();
            match engine.vote(&feature_id).await {
                VoteOutcome::Committed {
                    vote_count,
                    remaining,
                    ..
                } => println!(
                    "Voted for {} ({} votes). {} left today.",
                    feature_id, vote_count, remaining
                ),
                VoteOutcome::RolledBack { notice, .. } => eprintln!("{}", notice),
                VoteOutcome::Exhausted => {
                    println!("No votes left today. Share the site for a bonus, or come back tomorrow.")
                }
                VoteOutcome::InFlight => println!("A vote for {} is already pending.", feature_id),
            }
        }
        Commands::Energy => {
            let visitor = Visitor::open(&config)?;
            println!(
                "Votes left today: {} / {}",
                visitor.allowance.get_remaining(),
                config.allowance.daily
            );
        }
        Commands::Share { platform } => {
            let visitor = Visitor::open(&config)?;
            let policy = ShareRewardPolicy::new(
                visitor.allowance.clone(),
                visitor.store.clone(),
                Arc::new(ConsoleShareTarget),
                &config.share_url,
            );
            match policy.claim(platform) {
                ShareOutcome::Granted { remaining, .. } => {
                    println!("Thanks for sharing! Votes left today: {}", remaining)
                }
                ShareOutcome::AlreadyClaimed { remaining } => println!(
                    "Share bonus already claimed. Votes left today: {}",
                    remaining
                ),
            }
        }
        Commands::Suggest { idea, email } => {
            let visitor = Visitor::open(&config)?;
            visitor
                .engine()
                .submit_suggestion(&idea, email.as_deref())
                .await?;
            println!("Suggestion received.");
        }
        Commands::Wish { text } => {
            let visitor = Visitor::open(&config)?;
            let input = CreateSubmissionInput {
                kind: SubmissionKind::Wish,
                content: text,
                contact_email: None,
            }
            .normalized()
            .map_err(anyhow::Error::msg)?;
            visitor.client.create_submission(&input).await?;
            println!("Wish received.");
        }
        Commands::Signup { email } => {
            let visitor = Visitor::open(&config)?;
            let input = CreateSubmissionInput {
                kind: SubmissionKind::Signup,
                content: String::new(),
                contact_email: Some(email),
            }
            .normalized()
            .map_err(anyhow::Error::msg)?;
            visitor.client.create_submission(&input).await?;
            println!("You're on the list.");
        }
        Commands::Messages => {
            let visitor = Visitor::open(&config)?;
            let (dev_log, community) = board::partition(visitor.client.list_messages().await?);

            println!("== Dev log ==");
            for m in &dev_log {
                println!("[{}] {}: {}", m.created_at.format("%Y-%m-%d %H:%M"), m.name, m.content);
            }
            println!("== Community ==");
            for m in &community {
                println!("[{}] {}: {}", m.created_at.format("%Y-%m-%d %H:%M"), m.name, m.content);
            }
        }
        Commands::Post { name, content } => {
            let visitor = Visitor::open(&config)?;
            let message = visitor
                .client
                .post_message(&PostMessageInput { name, content })
                .await?;
            println!("Posted as {}.", message.name);
        }
    }

    Ok(())
}
