//! Persona profiles and the interview-style system prompt built from them.
//!
//! Personas are stored as `persona_*.json` files in a configured directory.
//! The rest of the system never inspects individual fields — it consumes a
//! persona only through [`build_system_prompt`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// A persona profile. Field names follow the stored JSON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub id: u64,
    pub name: String,
    pub age: u32,
    pub location: String,
    pub description: String,
    pub education: String,
    pub tech_skills: String,
    pub soft_skills: String,
    pub strengths: String,
    pub weaknesses: String,
    pub goals: String,
    pub hobbies: String,
    pub personality: String,
}

/// How a caller names a persona. Numeric ids and display names are
/// distinct types — a name that happens to look like a number is still
/// a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonaRef {
    Id(u64),
    Name(String),
}

/// Deterministic render of a persona into the system prompt that frames
/// every conversation. Same record in, same text out.
pub fn build_system_prompt(p: &PersonaRecord) -> String {
    format!(
        "You are {name} ({age} years old, from {location}).\n\
         Summary: {description}\n\
         Education: {education}.\n\
         Technical skills: {tech}.\n\
         Interpersonal skills: {soft}.\n\
         Strengths: {strengths}.\n\
         Weaknesses: {weaknesses}.\n\
         Goals: {goals}.\n\
         Hobbies: {hobbies}.\n\
         Personality: {personality}.\n\
         \n\
         Always answer as if you were {name} in a job interview.\n\
         Answer concisely and directly.\n\
         Never invent information that is not in the profile.\n\
         If the input does not make sense, ask for the question to be rephrased.",
        name = p.name,
        age = p.age,
        location = p.location,
        description = p.description,
        education = p.education,
        tech = p.tech_skills,
        soft = p.soft_skills,
        strengths = p.strengths,
        weaknesses = p.weaknesses,
        goals = p.goals,
        hobbies = p.hobbies,
        personality = p.personality,
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-memory collection of personas loaded from a directory of
/// `persona_*.json` files.
#[derive(Debug, Default)]
pub struct PersonaStore {
    by_id: HashMap<u64, PersonaRecord>,
}

impl PersonaStore {
    pub fn new(records: Vec<PersonaRecord>) -> Self {
        let by_id = records.into_iter().map(|r| (r.id, r)).collect();
        Self { by_id }
    }

    /// Load every `persona_*.json` file under `dir`. A malformed file is
    /// an error, not a skip — a silently missing persona is worse than a
    /// failed startup.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut records = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(fname) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !fname.starts_with("persona_") || !fname.ends_with(".json") {
                continue;
            }
            let raw = std::fs::read_to_string(&path)?;
            let record: PersonaRecord = serde_json::from_str(&raw)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
            records.push(record);
        }
        Ok(Self::new(records))
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All personas, ordered by id.
    pub fn records(&self) -> Vec<&PersonaRecord> {
        let mut records: Vec<_> = self.by_id.values().collect();
        records.sort_by_key(|p| p.id);
        records
    }

    /// Resolve a reference to its record.
    ///
    /// Name matching is case-insensitive. Two personas sharing a name make
    /// that name unresolvable by design; the caller must use the id.
    pub fn resolve(&self, r: &PersonaRef) -> Result<&PersonaRecord> {
        match r {
            PersonaRef::Id(id) => self
                .by_id
                .get(id)
                .ok_or_else(|| Error::PersonaNotFound(format!("id {id}"))),
            PersonaRef::Name(name) => {
                let wanted = name.trim().to_lowercase();
                let mut hits = self
                    .by_id
                    .values()
                    .filter(|p| p.name.to_lowercase() == wanted);
                match (hits.next(), hits.next()) {
                    (Some(one), None) => Ok(one),
                    (Some(_), Some(_)) => Err(Error::PersonaAmbiguous(name.clone())),
                    (None, _) => Err(Error::PersonaNotFound(name.clone())),
                }
            }
        }
    }
}
