//! Return ticket CLI - issue, decode and preview ticketed notifications

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticket_auth::{Locale, TicketCodec, TicketConfig, TicketMethod};
use ticket_notify::{MailError, Mailer, Notification, OutgoingMail, TicketNotifier, User};

const INVALID_CONFIG: &str = "Invalid ticket configuration";

/// Return tickets for email notification links
#[derive(Parser, Debug)]
#[command(name = "ticket")]
#[command(about = "Issue and inspect return tickets for email notification links", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ticket configuration file (YAML)
    #[arg(short, long, global = true, env = "TICKET_CONFIG")]
    config: Option<PathBuf>,

    /// Site-wide secret (overrides the config file)
    #[arg(long, global = true, env = "TICKET_SITE_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Ticket method: symmetric or asymmetric (overrides the config file)
    #[arg(long, global = true)]
    method: Option<TicketMethod>,

    /// Site public key (PEM), for the asymmetric method
    #[arg(long, global = true, requires = "private_key")]
    public_key: Option<PathBuf>,

    /// Site private key (PEM), for the asymmetric method
    #[arg(long, global = true, requires = "public_key")]
    private_key: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Issue a ticket for a user
    Issue {
        /// Login name of the recipient
        #[arg(short, long)]
        username: String,

        /// Destination URL the ticket grants access to
        #[arg(long)]
        url: String,

        /// Purpose of the ticket
        #[arg(short, long, default_value = "")]
        reason: String,
    },
    /// Decode a ticket and print its payload as JSON
    Decode {
        /// Encoded ticket
        #[arg(allow_hyphen_values = true)]
        ticket: String,

        /// Also report whether the ticket is past the time guard
        #[arg(long)]
        check_expiry: bool,

        /// Language for the error shown when the ticket is rejected
        #[arg(long, env = "LANG", default_value = "en")]
        lang: String,
    },
    /// Print the configured ticket time guard
    Timeguard,
    /// Render a notification for one recipient and print it instead of sending
    Notify {
        /// Login name of the recipient
        #[arg(long)]
        username: String,

        /// Email address of the recipient
        #[arg(long)]
        email: String,

        /// Sender address
        #[arg(long, default_value = "noreply@localhost")]
        from: String,

        /// Subject line
        #[arg(long, default_value = "Notification")]
        subject: String,

        /// HTML body template containing <%%TICKET%%>
        #[arg(long)]
        html: PathBuf,

        /// Plain-text body template
        #[arg(long)]
        text: Option<PathBuf>,

        /// Destination URL; without it no ticket is issued
        #[arg(long, default_value = "")]
        url: String,

        /// Purpose of the ticket
        #[arg(short, long, default_value = "")]
        reason: String,
    },
}

/// Mailer that prints messages instead of delivering them
struct StdoutMailer;

#[async_trait]
impl Mailer for StdoutMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        println!("From:    {} <{}>", mail.from.full_name, mail.from.email);
        println!("To:      {} <{}>", mail.to.full_name, mail.to.email);
        println!("Subject: {}", mail.subject);
        println!("\n--- text ---\n{}", mail.text);
        println!("\n--- html ---\n{}", mail.html);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = load_config(&cli)?;
    debug!(?config, "Loaded ticket configuration");

    match cli.command {
        Commands::Issue {
            username,
            url,
            reason,
        } => {
            let codec = build_codec(&config)?;
            match codec.issue(&username, &reason, &url)? {
                Some(ticket) => println!("{}", ticket),
                None => bail!("No ticket issued: username and URL must both be set"),
            }
        }
        Commands::Decode {
            ticket,
            check_expiry,
            lang,
        } => {
            let codec = build_codec(&config)?;
            let payload = match codec.decode(&ticket) {
                Ok(payload) => payload,
                Err(e) => {
                    eprintln!("{}", e.user_message(Locale::from_tag(&lang)));
                    return Err(e.into());
                }
            };

            println!("{}", serde_json::to_string_pretty(&payload)?);
            if check_expiry {
                let guard = config.time_guard().context(INVALID_CONFIG)?;
                let issued: DateTime<Local> = payload.issued_at_time().into();
                let status = if payload.is_expired(guard) {
                    "expired"
                } else {
                    "valid"
                };
                println!(
                    "Issued {} - {} under a {}s time guard",
                    issued.format("%Y-%m-%d %H:%M:%S %Z"),
                    status,
                    guard.num_seconds()
                );
            }
        }
        Commands::Timeguard => {
            let guard = config.time_guard().context(INVALID_CONFIG)?;
            println!("{}", guard.num_seconds());
        }
        Commands::Notify {
            username,
            email,
            from,
            subject,
            html,
            text,
            url,
            reason,
        } => {
            let html = std::fs::read_to_string(&html)
                .with_context(|| format!("Failed to read HTML template: {:?}", html))?;
            let text = match text {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read text template: {:?}", path))?,
                None => String::new(),
            };

            let codec = Arc::new(build_codec(&config)?);
            let notifier = TicketNotifier::new(codec, Arc::new(StdoutMailer));

            let recipient = User::new(&username, &email, &username);
            let sender = User::new("", &from, "");
            let notification = Notification::new(&subject, &text, &html);

            let ticket = notifier
                .notify(&recipient, &sender, &notification, &url, &reason)
                .await?;
            info!(with_ticket = ticket.is_some(), "Notification rendered");
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<TicketConfig> {
    let mut config = match &cli.config {
        Some(path) => TicketConfig::load(path)
            .with_context(|| format!("Failed to load config file: {:?}", path))?,
        None => TicketConfig::default(),
    };

    if let Some(secret) = &cli.secret {
        config.site_secret = secret.clone();
    }
    if let Some(method) = cli.method {
        config.method = method;
    }
    if let (Some(public_key), Some(private_key)) = (&cli.public_key, &cli.private_key) {
        config = config.with_keypair(public_key.clone(), private_key.clone());
    }

    Ok(config)
}

/// Codec for commands that seal or open tickets; only these need key material
fn build_codec(config: &TicketConfig) -> Result<TicketCodec> {
    config.validate().context(INVALID_CONFIG)?;
    Ok(TicketCodec::from_config(config, None)?)
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to initialize logging filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
