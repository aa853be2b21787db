use serde::{Deserialize, Serialize};

use crate::error::{GenieError, Result};

/// Wire format version this crate emits ("Protobuf JSON v2").
pub const WIRE_VERSION: u32 = 2;

/// One table in the wire format: a bare dotted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTable {
    pub identifier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDataSources {
    #[serde(default)]
    pub tables: Vec<WireTable>,
}

/// A sample question. The text is stored as a list of line variants, not a
/// single string; the first entry is the canonical question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSampleQuestion {
    pub id: String,
    #[serde(default)]
    pub question: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireQuestionConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_questions: Vec<WireSampleQuestion>,
}

impl WireQuestionConfig {
    pub fn is_empty(&self) -> bool {
        self.sample_questions.is_empty()
    }
}

/// A free-text instruction block; content is a list of lines (each typically
/// ending in `\n`) segmented into human-readable sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTextInstruction {
    pub id: String,
    #[serde(default)]
    pub content: Vec<String>,
}

impl WireTextInstruction {
    /// Content joined into one string.
    pub fn joined(&self) -> String {
        self.content.concat()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInstructions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_instructions: Vec<WireTextInstruction>,
}

impl WireInstructions {
    pub fn is_empty(&self) -> bool {
        self.text_instructions.is_empty()
    }
}

/// The remote platform's versioned serialization of a space's AI
/// configuration, as carried in the `serialized_space` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSpace {
    pub version: u32,
    #[serde(default, skip_serializing_if = "WireQuestionConfig::is_empty")]
    pub config: WireQuestionConfig,
    #[serde(default)]
    pub data_sources: WireDataSources,
    #[serde(default, skip_serializing_if = "WireInstructions::is_empty")]
    pub instructions: WireInstructions,
}

impl WireSpace {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GenieError::Api(format!("malformed serialized_space payload: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Fresh 32-character lowercase hex identifier for a wire entry.
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}
