// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod chat;
pub mod errors;
pub mod handlers;
pub mod server;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{
    AskRequest, ChatMode, ChatRequest, HealthResponse, SparqlRequest, MAX_QUESTION_LENGTH,
};
pub use server::{create_router, ApiConfig, ApiServer, AppState, Metrics};
