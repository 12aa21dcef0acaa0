// ============================================================================
// CHAT VIEWMODEL - symptom checker conversation
// ============================================================================

use crate::models::{ChatMessage, Sender};
use crate::services::ApiClient;
use std::cell::{Cell, RefCell};

pub const CHAT_GREETING: &str = "Hi! Describe your symptoms and I'll help you.";
pub const CHAT_PLACEHOLDER: &str = "Responding...";
pub const CHAT_NO_REPLY: &str = "Sorry, I couldn't process that.";
pub const CHAT_FAILED: &str = "Sorry, something went wrong. Please try again.";

pub struct ChatViewModel {
    api: ApiClient,
    messages: RefCell<Vec<ChatMessage>>,
    responding: Cell<bool>,
}

impl ChatViewModel {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            messages: RefCell::new(vec![ChatMessage::bot(CHAT_GREETING)]),
            responding: Cell::new(false),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.borrow().clone()
    }

    pub fn is_responding(&self) -> bool {
        self.responding.get()
    }

    /// Sends one message. Blank input, or input while a reply is pending, is ignored.
    pub async fn send(&self, input: &str) {
        let text = input.trim();
        if text.is_empty() || self.responding.get() {
            return;
        }

        let placeholder_at = {
            let mut messages = self.messages.borrow_mut();
            messages.push(ChatMessage::user(text));
            messages.push(ChatMessage::bot(CHAT_PLACEHOLDER));
            messages.len() - 1
        };
        self.responding.set(true);

        let answer = match self.api.send_chat_message(text).await {
            Ok(Some(reply)) => reply,
            Ok(None) => CHAT_NO_REPLY.to_string(),
            Err(e) => {
                log::warn!("❌ [CHAT] {}", e);
                CHAT_FAILED.to_string()
            }
        };

        if let Some(slot) = self.messages.borrow_mut().get_mut(placeholder_at) {
            if slot.sender == Sender::Bot {
                slot.text = answer;
            }
        }
        self.responding.set(false);
    }

    /// Back to just the greeting.
    pub fn reset(&self) {
        *self.messages.borrow_mut() = vec![ChatMessage::bot(CHAT_GREETING)];
    }
}
