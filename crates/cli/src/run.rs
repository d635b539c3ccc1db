//! `twintalk run` — one-shot message command.

use tt_domain::config::Config;
use tt_domain::persona::{build_system_prompt, PersonaRef};

use crate::bootstrap;

pub async fn run(
    config: Config,
    message: String,
    session: Option<String>,
    persona: PersonaRef,
    json: bool,
) -> anyhow::Result<()> {
    let (graph, personas) = bootstrap::build(&config)?;
    let record = personas.resolve(&persona)?;
    let system_prompt = build_system_prompt(record);

    let outcome = graph
        .handle_turn(session.as_deref(), &message, &system_prompt)
        .await?;

    if json {
        let transcript: Vec<_> = outcome
            .transcript
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "session_id": outcome.session_id,
                "transcript": transcript,
            }))?
        );
    } else {
        eprintln!("session: {}", outcome.session_id);
        println!("{}", outcome.assistant_text);
    }
    Ok(())
}
