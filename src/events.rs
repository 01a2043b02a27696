// Event types for async communication

use civic_assistant::stream::ChatStreamEvent;
use civic_assistant::ChatError;

#[derive(Debug)]
pub enum AppEvent {
    /// One reassembled stream event for chat request `turn`
    Stream { turn: u64, event: ChatStreamEvent },
    /// The chat request failed before or during streaming
    ChatFailed { turn: u64, error: ChatError },
    AnalysisReady(String),
    AnalysisFailed(ChatError),
}
