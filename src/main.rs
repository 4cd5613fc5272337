//! DrawCal CLI
//!
//! Command-line client for the DrawCal backend:
//! - Sign in and out
//! - Send drawings for recognition
//! - Review profile and history
//! - Format numbers offline

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drawcal::api::{normalize_base_url, HttpBackend};
use drawcal::calculator::{CalculationResult, Calculator, CanvasImage};
use drawcal::config::{generate_default_config, Config, LoggingConfig};
use drawcal::format::format_number;
use drawcal::login;
use drawcal::profile::format_timestamp;
use drawcal::session::{SessionState, SessionStore};
use drawcal::storage::FileStore;
use drawcal::{Credentials, ProfileApi};

#[derive(Parser)]
#[command(name = "drawcal")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Handwriting calculator client")]
#[command(long_about = "DrawCal sends drawn math expressions to the DrawCal backend\nand shows what it recognised and computed.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides config and DRAWCAL_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with a callback token or a username and password
    Login {
        /// Token from the OAuth callback URL
        #[arg(long, conflicts_with_all = ["username", "google"])]
        token: Option<String>,
        #[arg(long, requires = "password")]
        username: Option<String>,
        #[arg(long, requires = "username")]
        password: Option<String>,
        /// Print the Google sign-in URL
        #[arg(long)]
        google: bool,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Verify the stored session and show who is signed in
    Whoami,

    /// Recognise and evaluate drawings (PNG files, sent in order)
    Calc {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Show past calculations
    History,

    /// Show account details
    Profile,

    /// Format numbers the way results are displayed
    Format {
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = normalize_base_url(url);
    }

    init_logging(&config.logging);

    let json = cli.format == "json";

    match cli.command {
        Commands::Format { values } => {
            for value in values {
                println!("{}", format_number(&value));
            }
        }

        Commands::Config { output } => {
            let template = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &template)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", template);
                }
            }
        }

        Commands::Login {
            token,
            username,
            password,
            google,
        } => {
            if google {
                println!("Open this URL to sign in with Google:");
                println!("  {}", login::google_login_url(&config.api.base_url));
                println!();
                println!("Then pass the token from the redirect URL:");
                println!("  drawcal login --token <TOKEN>");
                return Ok(());
            }

            let backend = HttpBackend::new(&config.api)?;
            let mut session = open_session(&config);

            match (token, username, password) {
                (Some(token), _, _) => {
                    login::complete_token_login(&mut session, &backend, &token).await?
                }
                (None, Some(username), Some(password)) => {
                    login::password_login(&mut session, &backend, &username, &password).await?
                }
                _ => bail!("Pass --token, --username and --password, or --google"),
            }

            if let Some(user) = session.user() {
                println!("Logged in as {} ({})", user.name, user.email);
            }
        }

        Commands::Logout => {
            let backend = HttpBackend::new(&config.api)?;
            let mut session = open_session(&config);
            session.logout(&backend).await;
            println!("Logged out");
        }

        Commands::Whoami => {
            let backend = HttpBackend::new(&config.api)?;
            let mut session = open_session(&config);
            let state = session.restore(&backend).await;

            if json {
                let body = match state {
                    SessionState::Authenticated(s) => serde_json::json!({
                        "state": state.label(),
                        "user": s.user,
                    }),
                    SessionState::Invalid { reason } => serde_json::json!({
                        "state": state.label(),
                        "reason": reason,
                    }),
                    _ => serde_json::json!({ "state": state.label() }),
                };
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                match state {
                    SessionState::Authenticated(s) => {
                        println!("{} <{}> [{}]", s.user.name, s.user.email, s.user.role)
                    }
                    SessionState::Invalid { reason } => {
                        println!("Stored session is no longer valid ({})", reason)
                    }
                    _ => println!("Not logged in"),
                }
            }
        }

        Commands::Calc { images } => {
            let backend = HttpBackend::new(&config.api)?;
            let credentials = authenticated(&config, &backend).await?;
            let mut calculator = Calculator::new();

            for path in images {
                let bytes =
                    std::fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
                let image = CanvasImage::from_png(&bytes)
                    .with_context(|| format!("Unusable image {:?}", path))?;

                let results = calculator.submit(&backend, &credentials, &image).await;

                if json {
                    println!("{}", serde_json::to_string_pretty(results)?);
                } else {
                    println!("{}:", path.display());
                    print_results(results);
                }
            }
        }

        Commands::History => {
            let backend = HttpBackend::new(&config.api)?;
            let credentials = authenticated(&config, &backend).await?;
            let history = backend.history(&credentials).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No calculations yet.");
            } else {
                println!("{:<24} {:<30} {}", "When", "Expression", "Result");
                println!("{}", "-".repeat(70));

                for record in history {
                    println!(
                        "{:<24} {:<30} {}",
                        format_timestamp(&record.timestamp),
                        record.expression,
                        format_number(&record.result)
                    );
                }
            }
        }

        Commands::Profile => {
            let backend = HttpBackend::new(&config.api)?;
            let credentials = authenticated(&config, &backend).await?;
            let profile = backend.profile(&credentials).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Name:    {}", profile.name.as_deref().unwrap_or("-"));
                println!("Email:   {}", profile.email.as_deref().unwrap_or("-"));
                println!("Role:    {}", profile.role.as_deref().unwrap_or("-"));
                println!(
                    "Joined:  {}",
                    profile
                        .created_at
                        .as_deref()
                        .map(format_timestamp)
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("drawcal={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn open_session(config: &Config) -> SessionStore<FileStore> {
    SessionStore::new(FileStore::new(config.storage.session_path()))
}

/// Verify the stored session and hand back its credentials
async fn authenticated(config: &Config, backend: &HttpBackend) -> anyhow::Result<Credentials> {
    let mut session = open_session(config);
    let state = session.restore(backend).await;

    match state {
        SessionState::Authenticated(s) => Ok(s.credentials.clone()),
        SessionState::Invalid { reason } => {
            bail!("Session expired ({}). Run `drawcal login` again.", reason)
        }
        _ => bail!("Not logged in. Run `drawcal login` first."),
    }
}

fn print_results(results: &[CalculationResult]) {
    for item in results {
        let marker = if item.is_assignment { " (assigned)" } else { "" };
        println!("  Expression: {}", item.expression);
        println!("  Result:     {}{}", item.result, marker);
    }
}
