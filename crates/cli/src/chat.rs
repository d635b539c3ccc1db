//! `twintalk chat` — interactive REPL command.

use tt_domain::config::Config;
use tt_domain::persona::{build_system_prompt, PersonaRef};

use crate::bootstrap;

/// Run the interactive chat REPL against one persona.
pub async fn chat(
    config: Config,
    mut session: Option<String>,
    persona: PersonaRef,
) -> anyhow::Result<()> {
    let (graph, personas) = bootstrap::build(&config)?;
    let record = personas.resolve(&persona)?.clone();
    let system_prompt = build_system_prompt(&record);

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".twintalk")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    eprintln!("TwinTalk — chatting with {}", record.name);
    eprintln!("Type /exit to quit, /session <id> to switch sessions.");
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if let Some(rest) = trimmed.strip_prefix('/') {
                    if handle_slash_command(rest, &mut session) {
                        break;
                    }
                    continue;
                }

                match graph
                    .handle_turn(session.as_deref(), trimmed, &system_prompt)
                    .await
                {
                    Ok(outcome) => {
                        session = Some(outcome.session_id);
                        println!("{}> {}", record.name.to_lowercase(), outcome.assistant_text);
                    }
                    Err(e) => {
                        let hint = if e.is_retriable() { " (try again)" } else { "" };
                        eprintln!("error: {e}{hint}");
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    eprintln!("Goodbye!");
    Ok(())
}

/// Process a slash command. Returns `true` if the REPL should exit.
fn handle_slash_command(cmd: &str, session: &mut Option<String>) -> bool {
    let mut parts = cmd.splitn(2, ' ');
    match (parts.next().unwrap_or(""), parts.next().map(str::trim)) {
        ("exit", _) | ("quit", _) => true,
        ("session", Some(id)) if !id.is_empty() => {
            *session = Some(id.to_owned());
            eprintln!("Session switched to: {id}");
            false
        }
        ("session", _) => {
            match session {
                Some(id) => eprintln!("Current session: {id}"),
                None => eprintln!("No session yet (one is minted on the first message)"),
            }
            eprintln!("Usage: /session <id>");
            false
        }
        (other, _) => {
            eprintln!("Unknown command: /{other}");
            false
        }
    }
}
