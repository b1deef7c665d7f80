//! Fast approximate token counting.
//!
//! Counts how many tokens a tokenizer vocabulary would produce for a byte
//! string with a single greedy longest-match pass, without materializing
//! token ids or ranks. Vocabularies are `.tiktoken` files, loaded once per
//! process and shared between counters through an [`EncodingCache`].
//!
//! ```no_run
//! let counter = tokcount::create("bpe", "/data/o200k_base.tiktoken")?;
//! let n = counter.count(b"Hello, world!");
//! # Ok::<(), tokcount::Error>(())
//! ```

pub mod cache;
pub mod counter;
pub mod encoding;
pub mod error;
pub mod loader;
pub mod masks;
pub mod provider;
pub mod server;
#[cfg(feature = "tiktoken")]
pub mod tiktoken;
pub mod vocab;

pub use cache::EncodingCache;
pub use counter::{BpeCounter, Counter, DefaultCounter};
pub use encoding::Encoding;
pub use error::{Error, Result};
pub use masks::MAX_TOKEN_LEN;
pub use provider::{create, create_with_cache, Provider};
pub use server::Server;
pub use vocab::Vocabulary;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
