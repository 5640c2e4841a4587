//! Call records, transcripts and recorded actions.
//!
//! Calls are produced by the execution engine and are read-only here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{deserialize_optional_timestamp, RecordId, Timestamp};

/// Text shown when a call has no stored transcript.
pub const NO_TRANSCRIPT: &str = "No transcript found";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: RecordId,
    pub organization_id: RecordId,
    pub campaign_id: RecordId,
    pub customer_id: RecordId,
    #[serde(rename = "type")]
    pub call_type: String,
    pub from_number: String,
    pub to_number: String,
    /// Engine-owned lifecycle label (PENDING, IN_PROGRESS, ...).
    pub status: String,
    #[serde(default)]
    pub retry_count: u32,
    /// Stored without an offset by the backend; read as UTC.
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub start_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub end_time: Option<Timestamp>,
    /// Seconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub actions: Option<serde_json::Value>,
}

impl Call {
    pub fn parsed_transcript(&self) -> Option<Transcript> {
        self.transcript.as_deref().map(Transcript::parse)
    }
}

/* --------------------------------------------------------------------------
   Transcript
   -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Speaker {
    Bot,
    Human,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Bot => f.write_str("BOT"),
            Speaker::Human => f.write_str("HUMAN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// `None` when the line has no recognised `SPEAKER:` prefix.
    pub speaker: Option<Speaker>,
    pub text: String,
}

/// A transcript split into speaker turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    /// Parse newline-delimited `SPEAKER: text` lines. Blank lines are dropped.
    pub fn parse(raw: &str) -> Self {
        let lines = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(parse_line)
            .collect();
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// One line per turn, `SPEAKER: text`.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line.speaker {
                Some(speaker) => format!("{speaker}: {}", line.text),
                None => line.text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_line(line: &str) -> TranscriptLine {
    let split = line.split_once(':').and_then(|(prefix, rest)| {
        let speaker = match prefix.trim() {
            "BOT" => Speaker::Bot,
            "HUMAN" => Speaker::Human,
            _ => return None,
        };
        Some((speaker, rest.trim().to_string()))
    });
    match split {
        Some((speaker, text)) => TranscriptLine {
            speaker: Some(speaker),
            text,
        },
        None => TranscriptLine {
            speaker: None,
            text: line.to_string(),
        },
    }
}

/// Display text for a possibly missing transcript.
pub fn render_transcript(transcript: Option<&Transcript>) -> String {
    match transcript {
        Some(t) if !t.is_empty() => t.render(),
        _ => NO_TRANSCRIPT.to_string(),
    }
}

/* --------------------------------------------------------------------------
   Actions
   -------------------------------------------------------------------------- */

/// An event recorded during a call, e.g. a remark the agent logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub data: CallActionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallActionData {
    #[serde(default)]
    pub message: Option<String>,
    pub timestamp: ActionTimestamp,
}

/// Engines report action times either as epoch seconds or as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionTimestamp {
    Epoch(f64),
    Text(String),
}

impl fmt::Display for ActionTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTimestamp::Epoch(secs) => write!(f, "{secs}"),
            ActionTimestamp::Text(text) => f.write_str(text),
        }
    }
}
