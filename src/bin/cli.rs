//! Pollify CLI
//!
//! Command-line interface for a running Pollify server:
//! - Sign up, log in and out
//! - Create, list, show and delete polls
//! - Vote and browse the public feed

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use pollify::api::dto::{PollListResponse, PollView};
use pollify::client::{ClientConfig, ClientError, PollifyClient};
use pollify::store::{PollDraft, Visibility};
use pollify::voter::lookup::{IpLookup, IpifyLookup};

#[derive(Parser)]
#[command(name = "pollify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Create polls, share them, and vote from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL (defaults to the saved session's server)
    #[arg(long, global = true, env = "POLLIFY_API_URL")]
    pub api_url: Option<String>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and save the session
    Signup {
        email: String,
        /// Password (or set POLLIFY_PASSWORD)
        #[arg(short, long, env = "POLLIFY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in and save the session
    Login {
        email: String,
        /// Password (or set POLLIFY_PASSWORD)
        #[arg(short, long, env = "POLLIFY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Revoke and forget the saved session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Create a poll
    Create {
        /// The question
        question: String,
        /// Options (at least two)
        #[arg(short, long = "option", required = true)]
        options: Vec<String>,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
        /// List the poll in the public feed
        #[arg(long)]
        public: bool,
    },

    /// List your polls
    Mine,

    /// Show one poll with its results
    Show {
        /// Poll id or share link
        poll: String,
    },

    /// Vote on a poll
    Vote {
        /// Poll id or share link
        poll: String,
        /// Option number (1-based) or its label
        choice: String,
    },

    /// Delete one of your polls
    Delete {
        /// Poll id or share link
        poll: String,
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },

    /// Browse public polls
    Feed {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Poll counts
    Stats,

    /// Show the address votes are recorded under
    Ip {
        /// Ask the public lookup service directly instead of the server
        #[arg(long)]
        local: bool,
    },

    /// Show server status
    Status,

    /// Generate default server config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Saved login, kept between invocations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SavedSession {
    api_url: String,
    token: String,
    email: String,
}

fn session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pollify").join("session.json"))
}

fn load_session() -> Option<SavedSession> {
    let path = session_path()?;
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_session(session: &SavedSession) -> Result<()> {
    let path = session_path().context("No config directory on this system")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(session)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn clear_session() -> Result<()> {
    if let Some(path) = session_path() {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
    }
    Ok(())
}

/// Accept a bare id or anything ending in `/poll/<id>`
fn poll_id(input: &str) -> &str {
    let trimmed = input.trim().trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Map a 1-based number or an option label to a zero-based index
fn resolve_choice(options: &[String], choice: &str) -> Result<usize> {
    let choice = choice.trim();
    if let Ok(n) = choice.parse::<usize>() {
        if n >= 1 && n <= options.len() {
            return Ok(n - 1);
        }
        bail!("Option {} is out of range (1-{})", n, options.len());
    }

    options
        .iter()
        .position(|o| o.eq_ignore_ascii_case(choice))
        .with_context(|| format!("No option named '{}'", choice))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let saved = load_session();

    let api_url = cli
        .api_url
        .clone()
        .or_else(|| saved.as_ref().map(|s| s.api_url.clone()))
        .unwrap_or_else(|| ClientConfig::default().base_url);

    let anon = PollifyClient::new(ClientConfig::new(&api_url))?;
    let authed = || -> Result<PollifyClient> {
        match &saved {
            Some(s) => Ok(PollifyClient::new(ClientConfig::new(&api_url))?.with_token(&s.token)),
            None => bail!("Not logged in. Run `pollify-cli login <email>` first."),
        }
    };
    let optional = || -> Result<PollifyClient> {
        match &saved {
            Some(s) => Ok(PollifyClient::new(ClientConfig::new(&api_url))?.with_token(&s.token)),
            None => Ok(PollifyClient::new(ClientConfig::new(&api_url))?),
        }
    };

    match cli.command {
        Commands::Signup { email, password } => {
            let auth = anon.signup(&email, &password).await.map_err(explain)?;
            save_session(&SavedSession {
                api_url: api_url.clone(),
                token: auth.token,
                email: auth.user.email.clone(),
            })?;
            println!("Welcome, {}! You're signed in.", auth.user.display_name);
        }

        Commands::Login { email, password } => {
            let auth = anon.login(&email, &password).await.map_err(explain)?;
            save_session(&SavedSession {
                api_url: api_url.clone(),
                token: auth.token,
                email: auth.user.email.clone(),
            })?;
            println!("Signed in as {}", auth.user.email);
        }

        Commands::Logout => {
            if saved.is_some() {
                if let Err(e) = authed()?.logout().await {
                    eprintln!("Server logout failed: {}", e);
                }
            }
            clear_session()?;
            println!("Signed out.");
        }

        Commands::Whoami => {
            let user = authed()?.session().await.map_err(explain)?;
            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&user)?),
                _ => {
                    println!("{} ({})", user.display_name, user.email);
                    println!("Member since {}", user.created_at.format("%Y-%m-%d"));
                }
            }
        }

        Commands::Create {
            question,
            options,
            description,
            public,
        } => {
            let draft = PollDraft {
                question,
                description,
                options,
                visibility: if public {
                    Visibility::Public
                } else {
                    Visibility::Private
                },
            };
            let poll = authed()?.create_poll(&draft).await.map_err(explain)?;
            println!("Poll created!");
            println!("  id:    {}", poll.id);
            println!("  share: {}{}", api_url, poll.share_path);
        }

        Commands::Mine => {
            let polls = authed()?.my_polls().await.map_err(explain)?;
            print_list(&polls, &cli.format)?;
        }

        Commands::Show { poll } => {
            let view = optional()?.get_poll(poll_id(&poll)).await.map_err(explain)?;
            print_poll(&view, &cli.format)?;
        }

        Commands::Vote { poll, choice } => {
            let client = optional()?;
            let id = poll_id(&poll);
            let view = client.get_poll(id).await.map_err(explain)?;
            if view.has_voted {
                bail!("You've already voted!");
            }
            let index = resolve_choice(&view.options, &choice)?;
            let updated = client.vote(id, index).await.map_err(explain)?;
            println!("Vote recorded for \"{}\".", updated.options[index]);
            print_poll(&updated, &cli.format)?;
        }

        Commands::Delete { poll, yes } => {
            let client = authed()?;
            let id = poll_id(&poll);
            if !yes {
                let view = client.get_poll(id).await.map_err(explain)?;
                bail!(
                    "About to delete \"{}\". Re-run with --yes to confirm.",
                    view.question
                );
            }
            client.delete_poll(id).await.map_err(explain)?;
            println!("Poll deleted.");
        }

        Commands::Feed { limit } => {
            let polls = anon.feed(limit).await.map_err(explain)?;
            print_list(&polls, &cli.format)?;
        }

        Commands::Stats => {
            let stats = optional()?.stats().await.map_err(explain)?;
            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
                _ => {
                    println!(
                        "All polls:  {} ({} public, {} private), {} votes",
                        stats.all.total, stats.all.public, stats.all.private, stats.all.votes
                    );
                    if let Some(mine) = stats.mine {
                        println!(
                            "Your polls: {} ({} public, {} private), {} votes",
                            mine.total, mine.public, mine.private, mine.votes
                        );
                    }
                    println!("Live viewers: {}", stats.live_connections);
                }
            }
        }

        Commands::Ip { local } => {
            if local {
                let defaults = pollify::config::VoterConfig::default();
                let lookup = IpifyLookup::new(
                    &defaults.ip_lookup_url,
                    std::time::Duration::from_secs(defaults.lookup_timeout_secs),
                )?;
                let ip = lookup.public_ip().await?;
                println!("{}", ip);
            } else {
                let who = anon.whoami().await.map_err(explain)?;
                println!("{} (via {})", who.ip, who.source);
            }
        }

        Commands::Status => match anon.health().await {
            Ok(health) => {
                println!("Pollify v{}", health.version);
                println!();
                println!("API Status: {}", health.status);
                println!("Database:   {}", health.database);
                println!("Live:       {} connections", health.live_connections);
                println!();
                println!("Uptime: {}", format_duration(health.uptime_seconds));
                if let Some(s) = &saved {
                    println!("Signed in as {}", s.email);
                }
            }
            Err(e) => {
                eprintln!("Cannot connect to Pollify API at {}", api_url);
                eprintln!("Error: {}", e);
                eprintln!();
                eprintln!("Make sure the Pollify server is running:");
                eprintln!("  cargo run --bin pollify");
                std::process::exit(1);
            }
        },

        Commands::Config { output } => {
            let config = pollify::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Turn API errors into the message the server sent
fn explain(err: ClientError) -> anyhow::Error {
    match err {
        ClientError::Api { message, .. } => anyhow::anyhow!(message),
        ClientError::Unavailable => anyhow::anyhow!("Cannot reach the Pollify server"),
        other => other.into(),
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn percent(votes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        votes as f64 * 100.0 / total as f64
    }
}

fn print_poll(poll: &PollView, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(poll)?),
        "csv" => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["option", "votes", "percent"])?;
            for (label, votes) in poll.options.iter().zip(&poll.votes) {
                writer.write_record([
                    label.clone(),
                    votes.to_string(),
                    format!("{:.1}", percent(*votes, poll.total_votes)),
                ])?;
            }
            writer.flush()?;
        }
        _ => {
            println!("{}", poll.question);
            if let Some(description) = &poll.description {
                println!("{}", description);
            }
            println!("by {} · {:?}", poll.creator_name, poll.visibility);
            println!("{}", "-".repeat(50));

            for (i, (label, votes)) in poll.options.iter().zip(&poll.votes).enumerate() {
                let pct = percent(*votes, poll.total_votes);
                let bar = "#".repeat((pct / 5.0).round() as usize);
                let mark = if poll.voted_option == Some(i) { "*" } else { " " };
                println!(
                    "{}{:>2}. {:<20} {:<20} {:>5.1}% ({})",
                    mark,
                    i + 1,
                    label,
                    bar,
                    pct,
                    votes
                );
            }

            println!("{}", "-".repeat(50));
            println!("{} votes", poll.total_votes);
        }
    }
    Ok(())
}

fn print_list(list: &PollListResponse, format: &str) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(list)?),
        "csv" => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["id", "question", "options", "votes", "visibility", "created_at"])?;
            for poll in &list.polls {
                writer.write_record([
                    poll.id.clone(),
                    poll.question.clone(),
                    poll.option_count.to_string(),
                    poll.total_votes.to_string(),
                    poll.visibility.as_str().to_string(),
                    poll.created_at.to_rfc3339(),
                ])?;
            }
            writer.flush()?;
        }
        _ => {
            if list.polls.is_empty() {
                println!("No polls yet.");
                return Ok(());
            }

            println!("{:<34} {:<36} {:>6} {:<8}", "ID", "Question", "Votes", "Visible");
            println!("{}", "-".repeat(88));
            for poll in &list.polls {
                let question: String = poll.question.chars().take(36).collect();
                println!(
                    "{:<34} {:<36} {:>6} {:<8}",
                    poll.id,
                    question,
                    poll.total_votes,
                    poll.visibility.as_str()
                );
            }
        }
    }
    Ok(())
}
