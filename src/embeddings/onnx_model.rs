// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX sentence transformer
//!
//! Runs an exported sentence-transformers model (all-mpnet-base-v2,
//! all-MiniLM-L6-v2, ...) with ONNX Runtime on the CPU.
//!
//! - BERT-style tokenization with truncation to the model's max length
//! - Batch padding
//! - Mean pooling over token embeddings, weighted by the attention mask
//! - L2 normalization
//!
//! The output dimension is read from a test inference at load time.

use async_trait::async_trait;
use ndarray::{Array2, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use super::{normalize, Embedder, EmbeddingError};

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Sequence limit for mpnet and MiniLM sentence transformers
const DEFAULT_MAX_LENGTH: usize = 384;

/// ONNX-based sentence embedding model
///
/// # Thread Safety
/// The session sits behind a mutex, so clones share one runtime session.
#[derive(Clone)]
pub struct OnnxEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
    /// Some exports (mpnet) do not take token_type_ids
    uses_token_types: bool,
}

impl std::fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

struct EncodedBatch {
    rows: usize,
    max_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from a directory
    pub async fn from_dir(model_name: &str, dir: &Path) -> Result<Self, EmbeddingError> {
        Self::new(model_name, dir.join(MODEL_FILE), dir.join(TOKENIZER_FILE)).await
    }

    /// Creates a new embedder from disk paths
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file is missing or invalid
    /// - ONNX Runtime initialization fails
    /// - The test inference does not produce `[batch, seq_len, hidden]` output
    pub async fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
    ) -> Result<Self, EmbeddingError> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            return Err(EmbeddingError::ModelNotFound(model_path.to_path_buf()));
        }
        if !tokenizer_path.exists() {
            return Err(EmbeddingError::ModelNotFound(tokenizer_path.to_path_buf()));
        }

        info!("🚀 Initializing ONNX embedding model {}", model_name);
        let session = Session::builder()
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?
            .with_intra_threads(4)
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| {
                EmbeddingError::ModelLoad(format!("{}: {}", model_path.display(), e))
            })?;

        let uses_token_types = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| EmbeddingError::ModelLoad(format!("tokenizer: {}", e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: DEFAULT_MAX_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::ModelLoad(format!("tokenizer truncation: {}", e)))?;

        let mut embedder = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension: 0,
            uses_token_types,
        };

        let sample = embedder.run(&["validation test".to_string()])?;
        embedder.dimension = sample.first().map(|v| v.len()).unwrap_or(0);
        if embedder.dimension == 0 {
            return Err(EmbeddingError::ModelLoad(
                "model produced an empty embedding".to_string(),
            ));
        }

        info!(
            "✅ ONNX embedding model loaded ({} dimensions)",
            embedder.dimension
        );
        Ok(embedder)
    }

    fn encode(&self, texts: &[String]) -> Result<EncodedBatch, EmbeddingError> {
        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(text.as_str(), true)
                    .map_err(|e| EmbeddingError::Tokenization(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * max_len);

        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat(0i64).take(padding));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat(0i64).take(padding));
        }

        Ok(EncodedBatch {
            rows: texts.len(),
            max_len,
            input_ids,
            attention_mask,
        })
    }

    /// Tokenize, run inference and mean-pool one batch
    fn run(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let batch = self.encode(texts)?;
        let shape = (batch.rows, batch.max_len);
        let shape_err = |e: ndarray::ShapeError| EmbeddingError::Inference(e.to_string());

        let input_ids = Array2::from_shape_vec(shape, batch.input_ids).map_err(shape_err)?;
        let attention_mask =
            Array2::from_shape_vec(shape, batch.attention_mask.clone()).map_err(shape_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Inference("session lock poisoned".to_string()))?;

        let outputs = if self.uses_token_types {
            let token_type_ids = Array2::<i64>::zeros(shape);
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?,
                "token_type_ids" => Value::from_array(token_type_ids)?
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?
            ])?
        };

        // Different exports name the output differently; the token embeddings come first
        let output = outputs[0].try_extract_array::<f32>()?;
        if output.ndim() != 3 {
            return Err(EmbeddingError::Inference(format!(
                "unexpected output shape {:?} (expected [batch, seq_len, hidden])",
                output.shape()
            )));
        }

        let mut embeddings = Vec::with_capacity(batch.rows);
        for row in 0..batch.rows {
            let tokens = output.index_axis(Axis(0), row);
            let seq_len = tokens.shape()[0];
            let hidden = tokens.shape()[1];
            let mask = &batch.attention_mask[row * batch.max_len..(row + 1) * batch.max_len];

            let mut pooled = vec![0.0f32; hidden];
            let mut mask_sum = 0.0f32;
            for (i, &m) in mask.iter().enumerate().take(seq_len) {
                let weight = m as f32;
                mask_sum += weight;
                for (j, value) in pooled.iter_mut().enumerate() {
                    *value += tokens[[i, j]] * weight;
                }
            }
            for value in &mut pooled {
                *value /= mask_sum.max(1e-9);
            }
            normalize(&mut pooled);
            embeddings.push(pooled);
        }

        debug!("Embedded batch of {} texts", embeddings.len());
        Ok(embeddings)
    }

    /// Number of real tokens in a text, special tokens included
    pub fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;
        Ok(encoding.get_attention_mask().iter().map(|&m| m as usize).sum())
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let embeddings = self.run(texts)?;
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
