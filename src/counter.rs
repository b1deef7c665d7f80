//! The `Counter` capability and its built-in implementations.

use std::sync::Arc;

use crate::cache::EncodingCache;
use crate::encoding::Encoding;
use crate::error::Result;

pub trait Counter: Send + Sync {
    fn model(&self) -> &str;

    /// Makes sure the counter's model is loaded. Idempotent.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    fn count(&self, bytes: &[u8]) -> usize;
}

/// Naive fallback: `ceil(len / 4)`. Only for when no vocabulary is available.
pub struct DefaultCounter {
    model: String,
}

impl DefaultCounter {
    pub fn new(model: impl Into<String>) -> Self {
        DefaultCounter {
            model: model.into(),
        }
    }
}

impl Counter for DefaultCounter {
    fn model(&self) -> &str {
        &self.model
    }

    fn count(&self, bytes: &[u8]) -> usize {
        bytes.len().div_ceil(4)
    }
}

/// Greedy longest-match counter over a cached [`Encoding`].
///
/// Only quasi-matches a real BPE tokenizer: it never simulates merges, and
/// bytes no vocabulary token covers are counted one token each.
pub struct BpeCounter {
    model: String,
    cache: Arc<EncodingCache>,
    encoding: Arc<Encoding>,
}

impl BpeCounter {
    /// Fails with `ModelNotPrepared` unless `model` is already in `cache`.
    pub fn new(model: impl Into<String>, cache: Arc<EncodingCache>) -> Result<Self> {
        let model = model.into();
        let encoding = cache.require(&model)?;
        Ok(BpeCounter {
            model,
            cache,
            encoding,
        })
    }

    pub fn encoding(&self) -> &Arc<Encoding> {
        &self.encoding
    }
}

impl Counter for BpeCounter {
    fn model(&self) -> &str {
        &self.model
    }

    fn prepare(&self) -> Result<()> {
        self.cache.prepare(&self.model).map(|_| ())
    }

    fn count(&self, bytes: &[u8]) -> usize {
        self.encoding.count_tokens(bytes)
    }
}
