//! Lock-free chat buffer between the chat reader and the session tick
//!
//! Uses crossbeam-channel for lock-free MPSC communication. Chat readers push
//! messages as they arrive and the session drains everything at the start of
//! each tick, so one sender's messages are applied in receipt order.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// One chat line addressed to the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
        }
    }

    /// Parse a `username: text` line; None if there is no separator or no name
    pub fn parse_line(line: &str) -> Option<Self> {
        let (username, text) = line.split_once(':')?;
        let username = username.trim();
        if username.is_empty() {
            return None;
        }
        Some(Self::new(username, text.trim()))
    }
}

/// Bounded chat buffer
///
/// A full buffer drops new messages: chat input is fire-and-forget.
pub struct ChatBuffer {
    sender: Sender<ChatMessage>,
    receiver: Receiver<ChatMessage>,
    capacity: usize,
}

impl ChatBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Create a new sender handle for a chat reader
    pub fn sender(&self) -> ChatSender {
        ChatSender {
            sender: self.sender.clone(),
        }
    }

    /// Try to submit a message (non-blocking); false if the buffer is full
    #[inline]
    pub fn try_submit(&self, message: ChatMessage) -> bool {
        self.sender.try_send(message).is_ok()
    }

    /// Drain all pending messages in receipt order
    pub fn drain(&self) -> Vec<ChatMessage> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ChatBuffer {
    fn default() -> Self {
        // A busy chat rarely exceeds a few hundred lines between two ticks
        Self::new(1024)
    }
}

/// Clonable sender handle for chat readers
#[derive(Clone)]
pub struct ChatSender {
    sender: Sender<ChatMessage>,
}

impl ChatSender {
    #[inline]
    pub fn try_send(&self, message: ChatMessage) -> Result<(), ChatBufferError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => ChatBufferError::Full,
            TrySendError::Disconnected(_) => ChatBufferError::Disconnected,
        })
    }
}

/// Chat buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChatBufferError {
    /// Buffer is full, message dropped
    #[error("chat buffer full")]
    Full,
    /// Session dropped its buffer
    #[error("chat buffer disconnected")]
    Disconnected,
}
