// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat messages and conversations

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub const USER_SENDER: &str = "user";
pub const BOT_SENDER: &str = "bot";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub time: DateTime<Utc>,
    pub sender: String,
    /// N-Triples backing the message, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triples: Option<String>,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            time: Utc::now(),
            sender: sender.into(),
            triples: None,
        }
    }

    pub fn with_triples(mut self, triples: impl Into<String>) -> Self {
        self.triples = Some(triples.into());
        self
    }
}

/// Ordered thread of messages with a unique identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub thread: Vec<Message>,
    #[serde(default = "new_uid")]
    pub uid: String,
}

fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            thread: Vec::new(),
            uid: new_uid(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.thread.push(message);
    }

    pub fn len(&self) -> usize {
        self.thread.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thread.is_empty()
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.thread.first().map(|m| m.time)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.thread.last().map(|m| m.time)
    }

    pub fn duration(&self) -> Option<Duration> {
        Some(self.end_time()? - self.start_time()?)
    }

    /// Distinct senders, sorted
    pub fn actors(&self) -> Vec<String> {
        self.thread
            .iter()
            .map(|m| m.sender.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
