// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod context;
pub mod io;

pub use context::{estimate_tokens, truncate_to_tokens};
pub use io::{download_file, gunzip_file};
