// src/completion/mod.rs — Streaming completion boundary
//
// The assistant itself is an external collaborator; this module only
// defines the contract `complete(turns) -> stream of content` and maps
// the collaborator's failures into this crate's error taxonomy.

pub mod openai_compat;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::infra::errors::WayfarerError;
use crate::ledger::Role;

/// System preamble sent ahead of every conversation.
pub const SYSTEM_PREAMBLE: &str = "\
You are a helpful travel planner AI assistant. Your role is strictly limited to travel planning and related topics.

IMPORTANT RULES:
1. ONLY answer travel-related questions (destinations, itineraries, accommodations, transportation, budgets, travel tips, etc.)
2. If asked about non-travel topics, politely respond: \"I'm here to help only with travel planning.\"
3. Be conversational and friendly while gathering information
4. Collect the traveler's name, source location, destination, travel dates, duration and budget before generating an itinerary
5. Once you have all required information, generate a detailed itinerary with transportation, accommodation, day-wise activities, a budget breakdown and destination-specific tips
6. Ask for missing information one piece at a time in a natural conversation flow
7. Do not hallucinate or provide false information about places, prices, or travel requirements";

/// One conversational turn handed to the completion service.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, WayfarerError>> + Send>>;

/// Contract all completion backends implement.
///
/// A dropped stream before completion simply means that assistant turn is
/// never recorded; the caller treats it as an accepted loss, not an error.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn id(&self) -> &str;

    /// Stream the assistant's reply to the given turns, with the system
    /// preamble prepended.
    async fn complete_stream(&self, turns: &[Turn]) -> Result<CompletionStream, WayfarerError>;
}
