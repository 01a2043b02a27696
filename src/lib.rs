//! Bilingual (Bangla/English) civic-education assistant.
//!
//! The library holds everything shared by the two binaries: the incremental
//! SSE chat-stream reassembler, the chat session model, the HTTP client for
//! the assistant functions and the proxy gateway in front of the hosted AI
//! completion service.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod i18n;
pub mod models;
pub mod session;
pub mod storage;
pub mod stream;

pub use error::ChatError;
pub use i18n::Language;
