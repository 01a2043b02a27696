// Transcript archive: one markdown file plus a JSON metadata sidecar per chat

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::get_config_dir;
use crate::models::{ChatMessage, ConversationMetadata, MessageRole};

const USER_HEADING: &str = "## User";
const ASSISTANT_HEADING: &str = "## Assistant";
const FOLLOW_UP_HEADING: &str = "### Follow-up questions";

pub struct Storage {
    chats_dir: PathBuf,
}

impl Storage {
    pub fn new() -> Result<Self> {
        Self::with_root(&get_config_dir()?)
    }

    /// Keep chats under `root/chats`.
    pub fn with_root(root: &Path) -> Result<Self> {
        let chats_dir = root.join("chats");
        fs::create_dir_all(&chats_dir).context("Failed to create chats directory")?;

        Ok(Self { chats_dir })
    }

    pub fn get_conversation_path(&self, id: &Uuid) -> PathBuf {
        self.chats_dir.join(format!("{id}.md"))
    }

    pub fn get_metadata_path(&self, id: &Uuid) -> PathBuf {
        self.chats_dir.join(format!("{id}_meta.json"))
    }

    pub fn save_conversation(&self, id: &Uuid, messages: &[ChatMessage]) -> Result<()> {
        let path = self.get_conversation_path(id);
        fs::write(&path, render_conversation(messages))
            .context("Failed to write conversation file")?;

        Ok(())
    }

    pub fn load_conversation(&self, id: &Uuid) -> Result<Vec<ChatMessage>> {
        let path = self.get_conversation_path(id);

        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).context("Failed to read conversation file")?;

        Ok(parse_conversation(&content))
    }

    pub fn save_metadata(&self, metadata: &ConversationMetadata) -> Result<()> {
        let path = self.get_metadata_path(&metadata.id);
        let content =
            serde_json::to_string_pretty(metadata).context("Failed to serialize metadata")?;

        fs::write(&path, content).context("Failed to write metadata file")?;

        Ok(())
    }

    pub fn load_metadata(&self, id: &Uuid) -> Result<ConversationMetadata> {
        let path = self.get_metadata_path(id);

        if !path.exists() {
            anyhow::bail!("Metadata file not found");
        }

        let content = fs::read_to_string(&path).context("Failed to read metadata file")?;

        let metadata: ConversationMetadata =
            serde_json::from_str(&content).context("Failed to parse metadata file")?;

        Ok(metadata)
    }

    /// Saved conversations, most recently updated first. Unreadable
    /// sidecars are skipped.
    pub fn list_conversations(&self) -> Result<Vec<ConversationMetadata>> {
        let mut conversations = Vec::new();

        for entry in fs::read_dir(&self.chats_dir).context("Failed to read chats directory")? {
            let path = entry?.path();

            let is_metadata = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with("_meta.json"));
            if !is_metadata {
                continue;
            }

            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            match serde_json::from_str::<ConversationMetadata>(&content) {
                Ok(metadata) => conversations.push(metadata),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "Skipping bad metadata"),
            }
        }

        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(conversations)
    }

    pub fn delete_conversation(&self, id: &Uuid) -> Result<()> {
        let conv_path = self.get_conversation_path(id);
        let meta_path = self.get_metadata_path(id);

        if conv_path.exists() {
            fs::remove_file(conv_path).context("Failed to delete conversation file")?;
        }

        if meta_path.exists() {
            fs::remove_file(meta_path).context("Failed to delete metadata file")?;
        }

        Ok(())
    }

    /// Write the transcript and refresh its metadata in one go.
    pub fn archive(
        &self,
        metadata: &mut ConversationMetadata,
        messages: &[ChatMessage],
    ) -> Result<PathBuf> {
        metadata.touch(messages.len());
        self.save_conversation(&metadata.id, messages)?;
        self.save_metadata(metadata)?;

        Ok(self.get_conversation_path(&metadata.id))
    }
}

fn render_conversation(messages: &[ChatMessage]) -> String {
    let mut content = String::new();

    for message in messages {
        let heading = match message.role {
            MessageRole::User => USER_HEADING,
            MessageRole::Assistant => ASSISTANT_HEADING,
        };
        content.push_str(heading);
        content.push_str("\n\n");
        for line in message.content.trim_end().lines() {
            if is_structural(line) {
                content.push('\\');
            }
            content.push_str(line);
            content.push('\n');
        }
        content.push('\n');

        if !message.follow_ups().is_empty() {
            content.push_str(FOLLOW_UP_HEADING);
            content.push_str("\n\n");
            for question in message.follow_ups() {
                content.push_str("- ");
                content.push_str(question);
                content.push('\n');
            }
            content.push('\n');
        }
    }

    content
}

/// A heading line, optionally preceded by escaping backslashes. Body lines
/// like this get one extra backslash on disk so they never read back as
/// structure.
fn is_structural(line: &str) -> bool {
    matches!(
        line.trim_end().trim_start_matches('\\'),
        USER_HEADING | ASSISTANT_HEADING | FOLLOW_UP_HEADING
    )
}

fn unescape(line: &str) -> &str {
    match line.strip_prefix('\\') {
        Some(rest) if is_structural(rest) => rest,
        _ => line,
    }
}

fn parse_conversation(content: &str) -> Vec<ChatMessage> {
    struct Entry {
        role: MessageRole,
        body: Vec<String>,
        follow_ups: Option<Vec<String>>,
    }

    fn finish(entry: Entry) -> ChatMessage {
        let message = ChatMessage {
            role: entry.role,
            content: entry.body.join("\n").trim().to_string(),
            follow_up_questions: None,
        };
        message.with_follow_ups(entry.follow_ups.unwrap_or_default())
    }

    let mut messages = Vec::new();
    let mut current: Option<Entry> = None;

    for line in content.lines() {
        let role = match line.trim_end() {
            USER_HEADING => Some(MessageRole::User),
            ASSISTANT_HEADING => Some(MessageRole::Assistant),
            _ => None,
        };

        if let Some(role) = role {
            messages.extend(current.take().map(finish));
            current = Some(Entry {
                role,
                body: Vec::new(),
                follow_ups: None,
            });
            continue;
        }

        let Some(entry) = current.as_mut() else {
            continue;
        };

        if line.trim_end() == FOLLOW_UP_HEADING {
            entry.follow_ups = Some(Vec::new());
        } else if let Some(questions) = entry.follow_ups.as_mut() {
            if let Some(question) = line.strip_prefix("- ") {
                questions.push(question.trim().to_string());
            }
        } else {
            entry.body.push(unescape(line).to_string());
        }
    }

    messages.extend(current.map(finish));
    messages
}
