use serde::{Deserialize, Serialize};

/// One unit of agent/system output within a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: MessageRole,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

impl MessageEntry {
    pub fn new(role: MessageRole) -> Self {
        Self {
            role,
            blocks: Vec::new(),
        }
    }

    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            blocks: vec![ContentBlock::Text { text: text.into() }],
        }
    }
}

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    ToolResult,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::ToolResult => "tool_result",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual content block.
///
/// Servers may introduce new block kinds at any time; anything unrecognized
/// deserializes as `Unknown` and renders as nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        text: String,
    },
    ToolCall {
        name: String,
    },
    ToolResult {
        text: String,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_roundtrip() {
        let entry = MessageEntry {
            role: MessageRole::Assistant,
            blocks: vec![
                ContentBlock::Thinking {
                    text: "considering".to_string(),
                },
                ContentBlock::ToolCall {
                    name: "shell".to_string(),
                },
            ],
        };

        let json = serde_json::to_string(&entry).unwrap();
        let parsed: MessageEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn unknown_block_kind_deserializes_as_unknown() {
        let json = r#"{"role":"assistant","blocks":[{"type":"hologram","payload":42}]}"#;
        let parsed: MessageEntry = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.blocks, vec![ContentBlock::Unknown]);
    }

    #[test]
    fn missing_blocks_defaults_to_empty() {
        let parsed: MessageEntry = serde_json::from_str(r#"{"role":"system"}"#).unwrap();
        assert!(parsed.blocks.is_empty());
    }
}
