use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    File,
    Function,
    Type,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::File => "file",
            ArtifactKind::Function => "function",
            ArtifactKind::Type => "type",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "file" => Some(ArtifactKind::File),
            "function" => Some(ArtifactKind::Function),
            "type" => Some(ArtifactKind::Type),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the store currently knows about an identifier; carried inside
/// `InvalidState` and `NameCollision` errors so callers can explain failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    Unknown,
    Reserved,
    Finalized,
}

impl ArtifactState {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactState::Unknown => "unknown",
            ArtifactState::Reserved => "reserved",
            ArtifactState::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A claimed or finalized artifact. The id is stable across renames: it is
/// allocated at reservation time so generated content can embed it inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: i64,
    pub kind: ArtifactKind,
    pub name: String,
    pub is_reserved: bool,
    pub parent_file_id: Option<i64>,
    pub path: Option<String>,
    pub checksum: Option<String>,
    pub signature: Option<String>,
    pub role: Option<String>,
    pub created_at: i64,
    pub finalized_at: Option<i64>,
}

impl ArtifactRecord {
    pub fn state(&self) -> ArtifactState {
        if self.is_reserved {
            ArtifactState::Reserved
        } else {
            ArtifactState::Finalized
        }
    }
}

/// Content metadata recorded at finalization. The variant must match the
/// artifact's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ContentMetadata {
    File { path: String, checksum: String },
    Function { signature: String, role: String },
    Type { signature: String, role: String },
}

impl ContentMetadata {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ContentMetadata::File { .. } => ArtifactKind::File,
            ContentMetadata::Function { .. } => ArtifactKind::Function,
            ContentMetadata::Type { .. } => ArtifactKind::Type,
        }
    }
}
