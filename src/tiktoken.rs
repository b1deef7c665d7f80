//! Exact counts through the `tiktoken-rs` library.
//!
//! The model identifier is an encoding name (`o200k_base`, `cl100k_base`, ...)
//! or an OpenAI model name. Input is decoded as UTF-8 lossily, since the
//! library tokenizes text rather than bytes.

use tiktoken_rs::CoreBPE;

use crate::counter::Counter;
use crate::error::{Error, Result};

pub struct TiktokenCounter {
    model: String,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let loaded = match model.as_str() {
            "o200k_base" => tiktoken_rs::o200k_base(),
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => tiktoken_rs::get_bpe_from_model(other),
        };
        let bpe = loaded.map_err(|e| Error::Prepare(format!("{model}: {e}")))?;
        Ok(TiktokenCounter { model, bpe })
    }
}

impl Counter for TiktokenCounter {
    fn model(&self) -> &str {
        &self.model
    }

    fn count(&self, bytes: &[u8]) -> usize {
        if bytes.is_empty() {
            return 0;
        }
        let text = String::from_utf8_lossy(bytes);
        self.bpe.encode_with_special_tokens(&text).len()
    }
}
