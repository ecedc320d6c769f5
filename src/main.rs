use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use verbal::catalog::{load_devices, load_extensions};
use verbal::repl::{self, ReplInput};
use verbal::stats::new_shared;
use verbal::{Config, Device, Extension, Lang, SessionClient, SessionCommand, SessionEvent, SessionManager};

#[derive(Parser)]
#[command(name = "verbal", about = "Spoken command vocabulary for a home automation catalog")]
struct Cli {
    /// TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Vocabulary language, overrides the config
    #[arg(short, long)]
    lang: Option<Lang>,

    /// Device catalog JSON, overrides the config
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Extension phrases JSON, overrides the config
    #[arg(long)]
    extensions: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Interactive prompt (default)
    Repl,
    /// Resolve one utterance and print the action as JSON
    Resolve {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print every registered phrase
    List,
    /// Print the generated device phrases
    Channels,
}

#[hotpath::main]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if let Some(lang) = cli.lang {
        config.lang = lang;
    }
    if let Some(catalog) = cli.catalog {
        config.sources.catalog = catalog;
    }
    if cli.extensions.is_some() {
        config.sources.extensions = cli.extensions;
    }
    info!("Language: {}, catalog: {}", config.lang, config.sources.catalog.display());

    match cli.command.unwrap_or(Mode::Repl) {
        Mode::Repl => run_repl(&config),
        Mode::Resolve { text } => run_resolve(&config, &text.join(" ")),
        Mode::List => {
            let (session, _) = build_session(&config)?;
            print_event(&SessionEvent::Listing(session.registry().listing()));
            Ok(())
        }
        Mode::Channels => {
            let (session, _) = build_session(&config)?;
            print_event(&SessionEvent::Channels(session.builder().channels().to_vec()));
            Ok(())
        }
    }
}

/// Read the catalog and extensions named by the config
fn load_sources(config: &Config) -> anyhow::Result<(Vec<Device>, Vec<Extension>)> {
    let devices = load_devices(&config.sources.catalog)?;
    let extensions = match &config.sources.extensions {
        Some(path) => load_extensions(path)?,
        None => Vec::new(),
    };
    info!("Loaded {} devices, {} extensions", devices.len(), extensions.len());
    Ok((devices, extensions))
}

fn build_session(config: &Config) -> anyhow::Result<(SessionManager, Vec<Device>)> {
    let (devices, extensions) = load_sources(config)?;
    let mut session = SessionManager::new(config);
    session.reload_extensions(&extensions);
    session.reload_devices(&devices);
    Ok((session, devices))
}

fn run_resolve(config: &Config, text: &str) -> anyhow::Result<()> {
    let (mut session, devices) = build_session(config)?;
    let resolution = session
        .resolve(text)
        .with_context(|| format!("resolving '{}'", text))?;

    match resolution {
        Some(res) => {
            if let Some(filter) = res.filter() {
                let covered = devices.iter().filter(|d| filter.covers(d)).count();
                info!("Group covers {} devices", covered);
            }
            println!("{}", serde_json::to_string_pretty(&res.to_json())?);
        }
        None => println!("No matching command"),
    }
    Ok(())
}

fn run_repl(config: &Config) -> anyhow::Result<()> {
    let stats = new_shared();
    let session = SessionManager::new(config).with_stats(stats.clone());
    let (mut client, handle) = SessionClient::spawn(session);

    reload(&mut client, config);
    println!("Type a command, or /help\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let cmd = match repl::parse_input(&line?) {
            ReplInput::Empty => continue,
            ReplInput::Quit => break,
            ReplInput::Help => {
                println!("{}", repl::HELP);
                continue;
            }
            ReplInput::Unknown(cmd) => {
                println!("Unknown command: {}. Type /help", cmd);
                continue;
            }
            ReplInput::Stats => {
                match stats.lock() {
                    Ok(s) => print!("{}", s.summary()),
                    Err(_) => warn!("Stats unavailable"),
                }
                continue;
            }
            ReplInput::Reload => {
                reload(&mut client, config);
                continue;
            }
            ReplInput::List => SessionCommand::Listing,
            ReplInput::Channels => SessionCommand::Channels,
            ReplInput::Utterance(text) => SessionCommand::Utterance(text),
        };

        match client.request(cmd) {
            Some(event) => print_event(&event),
            None => break,
        }
    }

    drop(client);
    let _ = handle.join();
    Ok(())
}

/// Extensions go in before devices so authored phrases win duplicate checks
fn reload(client: &mut SessionClient, config: &Config) {
    let (devices, extensions) = match load_sources(config) {
        Ok(sources) => sources,
        Err(e) => {
            warn!("Reload failed: {:#}", e);
            return;
        }
    };
    for cmd in [
        SessionCommand::ReloadExtensions(extensions),
        SessionCommand::ReloadDevices(devices),
    ] {
        if let Some(event) = client.request(cmd) {
            print_event(&event);
        }
    }
}

fn print_event(event: &SessionEvent) {
    println!("{}", repl::format_event(event));
}
