//! Guardian CLI
//!
//! Usage:
//!   guardian register --name Ana --email ana@example.com --phone "51 9999-0000" --pin 1234
//!   guardian login --pin 1234                # verify PIN (intruder alert on breach)
//!   guardian contacts add --name Bia --phone "51 98888-0000"
//!   guardian sos --lat -30.03 --lng -51.22   # emergency alert
//!   guardian serve                           # HTTP API server
//!   guardian --json sos                      # JSON output

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use guardian::core::{
    run_server, Clock, CredentialStore, FileStore, FixedLocation, Guardian, GuardianConfig,
    LocationProvider, LogOpener, MemoryStore, NoLocation, SystemClock,
};
use guardian::types::{AuthOutcome, DispatchOutcome, Location, NewContact, NewUser, TransportKind};
use guardian::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "guardian",
    version = VERSION,
    about = "Guardian - PIN guard with intruder alerts and SOS dispatch",
    long_about = "Guardian keeps the PIN guard and emergency dispatch of the personal-safety app.\n\n\
                  Two wrong PINs within five minutes alert every contact that opted into\n\
                  intruder alerts. SOS alerts go to every contact, with location when known.\n\n\
                  Messages are delivered by handing a deep link (or its web fallback)\n\
                  to the platform URL handler; here the links are printed."
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Secret store file
    #[arg(long, global = true, default_value = "./guardian-store.json")]
    store: PathBuf,

    /// Keep everything in memory (nothing persists after exit)
    #[arg(long, global = true)]
    ephemeral: bool,

    /// JSON config file (auth policy, dispatch settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Current latitude for SOS messages
    #[arg(long, global = true, allow_hyphen_values = true, requires = "lng")]
    lat: Option<f64>,

    /// Current longitude for SOS messages
    #[arg(long, global = true, allow_hyphen_values = true, requires = "lat")]
    lng: Option<f64>,

    /// Treat the messaging app as not installed (always use the web link)
    #[arg(long, global = true)]
    web_only: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    no_color: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register the installation's user
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        pin: String,
    },
    /// Verify a PIN
    Login {
        #[arg(long)]
        pin: String,
    },
    /// Send the emergency alert to every contact
    Sos,
    /// Send the intruder alert to opted-in contacts
    Intruder,
    /// Manage emergency contacts
    Contacts {
        #[command(subcommand)]
        action: ContactsCommand,
    },
    /// Replace the registered PIN
    ResetPin {
        #[arg(long)]
        pin: String,
    },
    /// Look up the registered account by email
    FindAccount {
        #[arg(long)]
        email: String,
    },
    /// Delete the registered user, PIN and failed-attempt counter
    Wipe,
    /// Run as HTTP API server
    Serve {
        /// Server address
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
}

#[derive(Subcommand, Debug)]
enum ContactsCommand {
    /// List contacts in insertion order
    List,
    /// Add a contact
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        /// Do not send intruder alerts to this contact
        #[arg(long)]
        no_intruder_alert: bool,
    },
    /// Remove a contact by id
    Remove {
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match &args.config {
        Some(path) => GuardianConfig::load(path)?,
        None => GuardianConfig::default(),
    };

    let store: Arc<dyn CredentialStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::new(&args.store))
    };
    let location: Arc<dyn LocationProvider> = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Arc::new(FixedLocation(Location::new(lat, lng))),
        _ => Arc::new(NoLocation),
    };
    // Nothing drains the link history of a long-running server
    let opener = match args.command {
        Command::Serve { .. } => LogOpener::new(!args.web_only).without_history(),
        _ => LogOpener::new(!args.web_only),
    };
    let opener = Arc::new(opener);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let guardian = Guardian::new(store, location, opener.clone(), clock, &config);

    match args.command {
        Command::Register { ref name, ref email, ref phone, ref pin } => {
            let credential = guardian
                .auth()
                .register_user(NewUser::new(name, email, phone, pin))
                .await
                .context("registration failed")?;
            if args.json {
                println!("{}", serde_json::json!({ "registered": credential.name }));
            } else {
                println!("{} Registered {}", "✔".green(), credential.name.bold());
            }
        }
        Command::Login { ref pin } => {
            let result = guardian.login(pin).await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_auth(&result.auth);
                if let Some(alert) = &result.intruder_alert {
                    print_dispatch(alert, &opener.take_opened());
                }
            }
        }
        Command::Sos => {
            let outcome = guardian.send_emergency_alert().await;
            report_dispatch(&outcome, &opener, args.json)?;
        }
        Command::Intruder => {
            let outcome = guardian.send_intruder_alert().await;
            report_dispatch(&outcome, &opener, args.json)?;
        }
        Command::Contacts { ref action } => run_contacts(&guardian, action, args.json).await?,
        Command::ResetPin { ref pin } => {
            guardian.auth().update_pin(pin).await.context("PIN update failed")?;
            println!("{} PIN updated", "✔".green());
        }
        Command::FindAccount { ref email } => match guardian.auth().find_by_email(email).await? {
            Some(credential) if args.json => println!(
                "{}",
                serde_json::json!({ "found": true, "name": credential.name })
            ),
            Some(credential) => println!("{} Account found: {}", "✔".green(), credential.name),
            None if args.json => println!("{}", serde_json::json!({ "found": false })),
            None => println!("{} This email is not registered", "✘".red()),
        },
        Command::Wipe => {
            guardian.auth().clear_all_data().await?;
            println!("{} All credential data removed", "✔".green());
        }
        Command::Serve { ref addr } => {
            println!();
            println!("{}", "Guardian API Server".bold());
            println!("Version: {}", VERSION);
            println!("  GET    /health        - Health check");
            println!("  POST   /register      - Register user");
            println!("  POST   /login         - Verify PIN");
            println!("  POST   /sos           - Emergency alert");
            println!("  POST   /intruder      - Intruder alert");
            println!("  GET    /contacts      - List contacts");
            println!("  POST   /contacts      - Add contact");
            println!("  DELETE /contacts/:id  - Remove contact");
            println!();
            run_server(addr, guardian).await.context("server error")?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "guardian=debug" } else { "guardian=info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_contacts(guardian: &Guardian, action: &ContactsCommand, json: bool) -> Result<()> {
    let contacts = guardian.contacts();
    match action {
        ContactsCommand::List => {
            let all = contacts.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No emergency contacts yet.");
            } else {
                for (i, c) in all.iter().enumerate() {
                    let primary = if i == 0 {
                        " (primary)".cyan().to_string()
                    } else {
                        String::new()
                    };
                    let intruder = if c.receive_intruder_alert {
                        "intruder alerts on"
                    } else {
                        "intruder alerts off"
                    };
                    println!(
                        "{}  {}  {}  [{}]{}",
                        c.id.dimmed(),
                        c.name.bold(),
                        c.phone,
                        intruder,
                        primary
                    );
                }
            }
        }
        ContactsCommand::Add { name, phone, no_intruder_alert } => {
            let contact = contacts
                .add(NewContact::new(name, phone), !no_intruder_alert)
                .await
                .context("could not add contact")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contact)?);
            } else {
                println!("{} {} added ({})", "✔".green(), contact.name.bold(), contact.id);
            }
        }
        ContactsCommand::Remove { id } => {
            contacts.remove(id).await.context("could not remove contact")?;
            println!("{} Contact removed", "✔".green());
        }
    }
    Ok(())
}

fn report_dispatch(outcome: &DispatchOutcome, opener: &LogOpener, json: bool) -> Result<()> {
    let links = opener.take_opened();
    if json {
        #[derive(serde::Serialize)]
        struct DispatchOutput<'a> {
            outcome: &'a DispatchOutcome,
            links: &'a [String],
        }
        println!("{}", serde_json::to_string_pretty(&DispatchOutput { outcome, links: &links })?);
    } else {
        print_dispatch(outcome, &links);
    }
    Ok(())
}

fn print_auth(outcome: &AuthOutcome) {
    if outcome.success {
        println!("{} {}", "✔".green(), outcome.message);
    } else if outcome.intruder_detected {
        println!("{} {}", "🚨".red(), outcome.message.red().bold());
    } else {
        println!("{} {}", "✘".yellow(), outcome.message.yellow());
    }
    println!("  {}", outcome.reason.code().dimmed());
}

fn print_dispatch(outcome: &DispatchOutcome, links: &[String]) {
    if outcome.success {
        println!("{} {}", "🚨".red(), outcome.message.bold());
    } else {
        println!("{} {}", "⚠".yellow(), outcome.message.yellow());
    }
    for r in &outcome.results {
        let transport = match r.transport_used {
            TransportKind::Primary => "app",
            TransportKind::Fallback => "web",
        };
        let status = if r.delivered { "opened".green() } else { "failed".red() };
        println!("  {} via {} - {}", r.contact_id, transport, status);
    }
    for link in links {
        println!("  {}", link.dimmed());
    }
}
