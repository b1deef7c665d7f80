//! Provider selection and counter construction.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::cache::EncodingCache;
use crate::counter::{BpeCounter, Counter, DefaultCounter};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// `ceil(bytes / 4)`, no vocabulary.
    Default,
    /// Greedy longest match over a `.tiktoken` vocabulary file.
    Bpe,
    /// Full tokenizer via `tiktoken-rs`.
    #[cfg(feature = "tiktoken")]
    Tiktoken,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Default => "default",
            Provider::Bpe => "bpe",
            #[cfg(feature = "tiktoken")]
            Provider::Tiktoken => "tiktoken",
        }
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(Provider::Default),
            "bpe" | "openai" => Ok(Provider::Bpe),
            #[cfg(feature = "tiktoken")]
            "tiktoken" => Ok(Provider::Tiktoken),
            other => Err(Error::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a ready-to-count counter, loading its vocabulary into the
/// process-wide cache if needed.
pub fn create(provider: &str, model: &str) -> Result<Box<dyn Counter>> {
    create_with_cache(provider, model, &EncodingCache::global())
}

pub fn create_with_cache(
    provider: &str,
    model: &str,
    cache: &Arc<EncodingCache>,
) -> Result<Box<dyn Counter>> {
    let counter: Box<dyn Counter> = match provider.parse::<Provider>()? {
        Provider::Default => Box::new(DefaultCounter::new(model)),
        Provider::Bpe => {
            cache.prepare(model)?;
            Box::new(BpeCounter::new(model, Arc::clone(cache))?)
        }
        #[cfg(feature = "tiktoken")]
        Provider::Tiktoken => Box::new(crate::tiktoken::TiktokenCounter::new(model)?),
    };
    Ok(counter)
}
