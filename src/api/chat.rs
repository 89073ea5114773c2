// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat over a WebSocket
//!
//! Each text frame is a question. Replies are bot [`Message`]s serialized as
//! JSON. The conversation lives as long as the socket and is logged when the
//! client goes away.

use axum::extract::ws::{Message as WsMessage, WebSocket};
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

use super::handlers::{ChatMode, ChatRequest};
use super::server::AppState;
use super::ApiError;
use crate::models::{Conversation, Message, BOT_SENDER, USER_SENDER};

/// Answer one chat request, turning failures into a bot message
pub async fn reply_to(state: &AppState, request: &ChatRequest) -> Message {
    if let Err(e) = request.validate() {
        state.metrics.record_error();
        return Message::new(e.to_response(None).message, BOT_SENDER);
    }

    let result = match request.mode {
        ChatMode::Answer => state
            .pipeline
            .answer(&request.question)
            .await
            .map(|a| (a.answer, a.context)),
        ChatMode::Sparql => state
            .pipeline
            .generate_sparql(&request.question, false)
            .await
            .map(|a| (a.query, a.context)),
    };

    match result {
        Ok((text, context)) => {
            let message = Message::new(text, BOT_SENDER);
            if context.is_empty() {
                message
            } else {
                message.with_triples(context)
            }
        }
        Err(e) => {
            state.metrics.record_error();
            let error = ApiError::from(e);
            warn!("Chat request failed: {}", error);
            Message::new(error.to_response(None).message, BOT_SENDER)
        }
    }
}

pub async fn handle_chat_socket(mut socket: WebSocket, state: AppState) {
    let mut conversation = Conversation::new();
    state.metrics.active_chats.fetch_add(1, Ordering::Relaxed);
    info!("Chat {} opened", conversation.uid);

    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Chat {} receive error: {}", conversation.uid, e);
                break;
            }
        };

        state.metrics.record_request(&state.metrics.chat_messages);
        let request = ChatRequest::from_frame(&text);
        conversation.push(Message::new(request.question.clone(), USER_SENDER));

        let reply = reply_to(&state, &request).await;
        let payload = match serde_json::to_string(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize chat reply: {}", e);
                continue;
            }
        };
        conversation.push(reply);

        if socket.send(WsMessage::Text(payload)).await.is_err() {
            break;
        }
    }

    state.metrics.active_chats.fetch_sub(1, Ordering::Relaxed);
    info!(
        "Chat {} closed: {} messages, actors {:?}, duration {}s",
        conversation.uid,
        conversation.len(),
        conversation.actors(),
        conversation
            .duration()
            .map(|d| d.num_seconds())
            .unwrap_or(0)
    );
    if let Ok(json) = serde_json::to_string(&conversation) {
        debug!("Conversation {}: {}", conversation.uid, json);
    }
}
