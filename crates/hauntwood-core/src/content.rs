//! Case content: roster, clues, lore and the murderer/evidence mapping.
//!
//! Content is immutable input. The engine only reads ids and relationships
//! from it; display text and dialogue trees stay with the host.

use std::collections::{HashMap, HashSet};

use hauntwood_logic::geometry::{Aabb, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to parse case content: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("case roster is empty")]
    EmptyRoster,
    #[error("duplicate id `{0}`")]
    DuplicateId(String),
    #[error("murderer `{0}` is not in the roster")]
    UnknownMurderer(String),
    #[error("evidence map references unknown npc `{0}`")]
    UnknownSuspect(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    /// Number of top-level dialogue choices the host shows for this NPC.
    #[serde(default)]
    pub dialogue_options: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClueKind {
    /// Picked up by walking to it.
    Static,
    /// Audible from a distance; found by standing still close by.
    Whisper,
    /// Only readable while the hint highlight is active.
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClueDef {
    pub id: String,
    pub kind: ClueKind,
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub evidence: Option<String>,
}

impl ClueDef {
    pub fn position(&self) -> Vec3 {
        Vec3::ground(self.x, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoreDef {
    pub id: String,
    pub x: f32,
    pub z: f32,
}

impl LoreDef {
    pub fn position(&self) -> Vec3 {
        Vec3::ground(self.x, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseContent {
    pub id: String,
    pub npcs: Vec<NpcDef>,
    /// Fixed murderer. When absent one is drawn from the evidence map's
    /// suspects at mode start.
    #[serde(default)]
    pub murderer: Option<String>,
    #[serde(default)]
    pub clues: Vec<ClueDef>,
    #[serde(default)]
    pub lore: Vec<LoreDef>,
    /// Evidence ids needed to accuse each suspect.
    #[serde(default)]
    pub murderer_evidence: HashMap<String, Vec<String>>,
    /// Static scenery colliders (houses, rocks). Boundary trees are added
    /// by the engine.
    #[serde(default)]
    pub obstacles: Vec<Aabb>,
}

impl CaseContent {
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let content: CaseContent = serde_json::from_str(json)?;
        content.validate()?;
        Ok(content)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        if self.npcs.is_empty() {
            return Err(ContentError::EmptyRoster);
        }
        let mut seen = HashSet::new();
        let ids = self
            .npcs
            .iter()
            .map(|n| &n.id)
            .chain(self.clues.iter().map(|c| &c.id))
            .chain(self.lore.iter().map(|l| &l.id));
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(ContentError::DuplicateId(id.clone()));
            }
        }
        if let Some(m) = &self.murderer {
            if self.npc(m).is_none() {
                return Err(ContentError::UnknownMurderer(m.clone()));
            }
        }
        for suspect in self.murderer_evidence.keys() {
            if self.npc(suspect).is_none() {
                return Err(ContentError::UnknownSuspect(suspect.clone()));
            }
        }
        Ok(())
    }

    pub fn npc(&self, id: &str) -> Option<&NpcDef> {
        self.npcs.iter().find(|n| n.id == id)
    }

    /// Suspects that may be drawn as murderer, in roster order.
    pub fn suspects(&self) -> Vec<&str> {
        self.npcs
            .iter()
            .filter(|n| self.murderer_evidence.contains_key(&n.id))
            .map(|n| n.id.as_str())
            .collect()
    }

    /// Evidence needed to accuse `murderer`. Unknown ids need nothing.
    pub fn crucial_evidence(&self, murderer: &str) -> &[String] {
        self.murderer_evidence
            .get(murderer)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
