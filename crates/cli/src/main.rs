//! `twintalk` — persona chat from the terminal.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tt_domain::config::Config;
use tt_domain::persona::PersonaRef;

mod bootstrap;
mod chat;
mod run;

#[derive(Parser)]
#[command(name = "twintalk", version, about = "Persona-driven conversational backend")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = "twintalk.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat REPL with a persona.
    Chat {
        /// Session to resume (a new one is minted when omitted).
        #[arg(long)]
        session: Option<String>,
        #[command(flatten)]
        persona: PersonaArgs,
    },
    /// Send one message and print the reply.
    Run {
        /// The user message.
        message: String,
        #[arg(long)]
        session: Option<String>,
        #[command(flatten)]
        persona: PersonaArgs,
        /// Print the full transcript as JSON instead of just the reply.
        #[arg(long)]
        json: bool,
    },
    /// List the personas found in the configured directory.
    Personas,
}

#[derive(clap::Args)]
struct PersonaArgs {
    /// Persona display name.
    #[arg(long, conflicts_with = "persona_id")]
    persona: Option<String>,
    /// Persona numeric id.
    #[arg(long)]
    persona_id: Option<u64>,
}

impl PersonaArgs {
    fn to_ref(&self) -> anyhow::Result<PersonaRef> {
        match (&self.persona, self.persona_id) {
            (_, Some(id)) => Ok(PersonaRef::Id(id)),
            (Some(name), None) => Ok(PersonaRef::Name(name.clone())),
            (None, None) => anyhow::bail!("pass --persona <name> or --persona-id <id>"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("twintalk=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Chat { session, persona } => {
            let persona = persona.to_ref()?;
            chat::chat(config, session, persona).await
        }
        Command::Run {
            message,
            session,
            persona,
            json,
        } => {
            let persona = persona.to_ref()?;
            run::run(config, message, session, persona, json).await
        }
        Command::Personas => {
            let store = tt_domain::persona::PersonaStore::load_dir(&config.personas.path)?;
            if store.is_empty() {
                eprintln!("no personas under {}", config.personas.path.display());
            }
            for line in bootstrap::persona_listing(&store) {
                println!("{line}");
            }
            Ok(())
        }
    }
}
