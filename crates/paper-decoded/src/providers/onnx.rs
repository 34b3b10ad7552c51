//! ONNX-based embedding generation
//!
//! Runs the sentence-transformers all-MiniLM-L6-v2 model locally for
//! 384-dimensional embeddings. The model is downloaded into the cache
//! directory and loaded on first use, then kept for the process lifetime.

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;

/// Loaded ONNX session and tokenizer
struct OnnxModel {
    /// ONNX Runtime session
    session: Session,
    /// HuggingFace tokenizer
    tokenizer: Tokenizer,
    /// Embedding dimensions
    dimensions: usize,
    /// Maximum sequence length
    max_length: usize,
    /// Batch size
    batch_size: usize,
}

impl OnnxModel {
    async fn load(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!("Initializing ONNX embedder with model: {}", config.model);

        std::fs::create_dir_all(&config.cache_dir).map_err(|e| {
            Error::embedding(format!("Failed to create cache directory: {}", e))
        })?;

        let model_dir = config.cache_dir.join(&config.model);
        std::fs::create_dir_all(&model_dir).map_err(|e| {
            Error::embedding(format!("Failed to create model directory: {}", e))
        })?;

        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            download(&config.model, "onnx/model.onnx", &model_path).await?;
        }

        if !tokenizer_path.exists() {
            download(&config.model, "tokenizer.json", &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|e| Error::embedding(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::embedding(format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| Error::embedding(format!("Failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::embedding(format!("Failed to load model: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::embedding(format!("Failed to load tokenizer: {}", e)))?;

        tracing::info!("ONNX embedder initialized successfully");

        Ok(Self {
            session,
            tokenizer,
            dimensions: config.dimensions,
            max_length: config.max_length,
            batch_size: config.batch_size,
        })
    }

    /// Embed texts in batches of `batch_size`
    fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            all_embeddings.extend(self.embed_batch_internal(batch)?);
        }

        Ok(all_embeddings)
    }

    fn embed_batch_internal(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::embedding(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.max_length);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            for j in 0..ids.len().min(max_len) {
                input_ids[i * max_len + j] = ids[j] as i64;
                attention_mask[i * max_len + j] = mask[j] as i64;
                token_type_ids[i * max_len + j] = types[j] as i64;
            }
        }

        let input_ids_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            input_ids.into_boxed_slice(),
        ))
        .map_err(|e| Error::embedding(format!("Input tensor creation failed: {}", e)))?;

        let attention_mask_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            attention_mask.clone().into_boxed_slice(),
        ))
        .map_err(|e| Error::embedding(format!("Attention mask tensor creation failed: {}", e)))?;

        let token_type_ids_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            token_type_ids.into_boxed_slice(),
        ))
        .map_err(|e| Error::embedding(format!("Token type tensor creation failed: {}", e)))?;

        let inputs = vec![
            ("input_ids", input_ids_tensor.into_dyn()),
            ("attention_mask", attention_mask_tensor.into_dyn()),
            ("token_type_ids", token_type_ids_tensor.into_dyn()),
        ];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| Error::embedding(format!("Inference failed: {}", e)))?;

        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::embedding("No output tensor"))?;

        let (tensor_shape, tensor_data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::embedding(format!("Failed to extract tensor: {}", e)))?;

        let dims: Vec<usize> = tensor_shape.iter().map(|&d| d as usize).collect();
        let hidden_size = dims.get(2).copied().unwrap_or(self.dimensions);

        if hidden_size != self.dimensions {
            return Err(Error::embedding(format!(
                "Model produced {}-dimensional vectors, configured for {}",
                hidden_size, self.dimensions
            )));
        }

        Ok(pool_batch(tensor_data, &attention_mask, batch_size, max_len, hidden_size))
    }
}

/// One pooled, normalized vector per sequence of a `[batch, seq, hidden]` output
fn pool_batch(
    data: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|i| {
            mean_pool(
                data,
                &attention_mask[i * seq_len..(i + 1) * seq_len],
                i * seq_len * hidden_size,
                hidden_size,
            )
        })
        .collect()
}

/// Mask-weighted mean over token states, then L2 normalised
fn mean_pool(data: &[f32], mask: &[i64], base: usize, hidden_size: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for (j, &m) in mask.iter().enumerate() {
        if m > 0 {
            let row = base + j * hidden_size;
            for (k, value) in sum.iter_mut().enumerate() {
                if let Some(x) = data.get(row + k) {
                    *value += x;
                }
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for value in &mut sum {
            *value /= count;
        }
    }

    l2_normalize(&mut sum);
    sum
}

/// Scale a vector to unit length (zero vectors are left alone)
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Lazily loaded local sentence-transformers embedder
pub struct OnnxEmbedder {
    config: EmbeddingConfig,
    model: OnceCell<Arc<Mutex<OnnxModel>>>,
}

impl OnnxEmbedder {
    /// Create the embedder; the model is loaded on first use
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            config: config.clone(),
            model: OnceCell::new(),
        }
    }

    /// Whether the model has been loaded yet
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn model(&self) -> Result<Arc<Mutex<OnnxModel>>> {
        self.model
            .get_or_try_init(|| async {
                OnnxModel::load(&self.config)
                    .await
                    .map(|m| Arc::new(Mutex::new(m)))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("Empty embedding result"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model().await?;
        let texts = texts.to_vec();

        // inference is CPU-bound, keep it off the async workers
        tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            model.lock().embed_batch(&refs)
        })
        .await
        .map_err(|e| Error::internal(format!("Task join error: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        match self.model().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}", e);
                Ok(false)
            }
        }
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Download a model file from the sentence-transformers HuggingFace repository
async fn download(model_name: &str, file: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{}/resolve/main/{}",
        model_name, file
    );

    tracing::info!("Downloading {} from: {}", file, url);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| Error::embedding(format!("Failed to download {}: {}", file, e)))?;

    if !response.status().is_success() {
        return Err(Error::embedding(format!(
            "Download of {} failed: HTTP {}",
            file,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::embedding(format!("Failed to read {}: {}", file, e)))?;

    // stage beside the target, then rename into place
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(&bytes)?;
    staged
        .persist(path)
        .map_err(|e| Error::embedding(format!("Failed to save {}: {}", file, e.error)))?;

    tracing::info!("Downloaded {} ({} bytes)", file, bytes.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_respects_mask() {
        // two tokens of hidden size 2, second token masked out
        let data = [3.0, 4.0, 100.0, 100.0];
        let pooled = mean_pool(&data, &[1, 0], 0, 2);
        assert!((pooled[0] - 0.6).abs() < 1e-6);
        assert!((pooled[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_pooling_is_deterministic() {
        // two identical sequences of three tokens, hidden size 4, last token padded
        let sequence = [
            0.25, -1.5, 3.0, 0.125, //
            2.0, 0.5, -0.75, 1.0, //
            9.0, 9.0, 9.0, 9.0,
        ];
        let data: Vec<f32> = sequence.iter().chain(sequence.iter()).copied().collect();
        let mask = [1, 1, 0, 1, 1, 0];

        let first = pool_batch(&data, &mask, 2, 3, 4);
        let second = pool_batch(&data, &mask, 2, 3, 4);

        assert_eq!(first, second);
        assert_eq!(first[0], first[1]);
        let norm: f32 = first[0].iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        // mean of the two unmasked tokens is (1.125, -0.5, 1.125, 0.5625)
        let mean = [1.125f32, -0.5, 1.125, 0.5625];
        let length = mean.iter().map(|x| x * x).sum::<f32>().sqrt();
        for (got, want) in first[0].iter().zip(mean) {
            assert!((got - want / length).abs() < 1e-6);
        }
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn test_model_is_lazy() {
        let embedder = OnnxEmbedder::new(&EmbeddingConfig::default());
        assert!(!embedder.is_loaded());
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.name(), "onnx");
    }
}
