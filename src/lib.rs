//! # charset-util - Legacy Charset Conversion and Detection
//!
//! Convenience functions for moving text between Unicode and named legacy
//! character encodings, and for guessing the encoding and language of
//! unlabeled bytes.
//!
//! ## Features
//!
//! - **Label-based lookup** using the WHATWG Encoding Standard labels
//!   (`"Windows-31J"`, `"EUC-JP"`, `"latin1"`, ...)
//! - **Three input shapes** for every operation: bytes, strings and readers
//! - **Statistical detection** of encoding and language
//! - **Pluggable backends** for both the label registry and the detector
//! - **Panicking `must_` variants** for call sites with no recovery path
//!
//! ## Quick Start
//!
//! ```rust
//! // Encode Japanese text as Windows-31J (Shift_JIS)
//! let bytes = charset_util::encode("こんにちわ", "Windows-31J").unwrap();
//! assert_eq!(bytes, [0x82, 0xB1, 0x82, 0xF1, 0x82, 0xC9, 0x82, 0xBF, 0x82, 0xED]);
//!
//! // And back again
//! let text = charset_util::decode(&bytes, "Windows-31J").unwrap();
//! assert_eq!(text, "こんにちわ");
//!
//! // Guess what an unlabeled buffer is
//! let guess = charset_util::guess_str("ああｲｲ\"haa").unwrap();
//! assert_eq!(guess.charset(), "UTF-8");
//! assert_eq!(guess.language(), "");
//! ```

#![deny(missing_docs)]

use std::io::Read;

use encoding_rs::Encoding;
use thiserror::Error;

mod decode;
pub mod detection;
mod encode;
pub mod registry;

pub use detection::{Chardetng, DEFAULT_PREFIX_LEN, Detect, Guess, Guesser};
pub use registry::{Registry, WhatwgRegistry};

/// Result type for charset operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during conversion or detection
#[derive(Debug, Error)]
pub enum Error {
    /// The label does not name an encoding the registry can provide
    #[error("unsupported charset: {0:?}")]
    UnsupportedCharset(String),

    /// The detector produced no usable candidate for the input
    #[error("charset detection failed")]
    DetectionFailed,

    /// Character cannot be encoded in the target encoding
    #[error("cannot encode character {character:?} at position {position} as {label}")]
    Unmappable {
        /// Canonical name of the target encoding
        label: &'static str,
        /// The unmappable character
        character: char,
        /// Byte offset of the character in the UTF-8 input
        position: usize,
    },

    /// Input to the encoder is not valid UTF-8
    #[error("invalid UTF-8 sequence at position {position}")]
    MalformedInput {
        /// Byte offset of the first invalid byte
        position: usize,
    },

    /// Reading the input stream failed
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Default read size used when draining a stream
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Label-driven decoder/encoder over a pluggable registry
#[derive(Debug, Clone)]
pub struct Charsets<R = WhatwgRegistry> {
    registry: R,
    chunk_size: usize,
}

impl Default for Charsets {
    fn default() -> Self {
        Self::with_registry(WhatwgRegistry)
    }
}

impl Charsets {
    /// Create a converter backed by the WHATWG label registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Registry> Charsets<R> {
    /// Create a converter that resolves labels through `registry`
    pub fn with_registry(registry: R) -> Self {
        Self {
            registry,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read size used when draining streams
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Get the registry labels are resolved through
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Resolve a label to an encoding, or fail with [`Error::UnsupportedCharset`]
    pub fn resolve(&self, label: &str) -> Result<&'static Encoding> {
        match self.registry.lookup(label) {
            Some(encoding) => {
                tracing::trace!(label, encoding = encoding.name(), "resolved charset label");
                Ok(encoding)
            }
            None => {
                tracing::debug!(label, "charset label not found in registry");
                Err(Error::UnsupportedCharset(label.to_string()))
            }
        }
    }

    /// Decode everything `reader` yields from `label` into a `String`
    pub fn decode_reader<T: Read>(&self, reader: T, label: &str) -> Result<String> {
        let encoding = self.resolve(label)?;
        decode::decode_stream(encoding, reader, self.chunk_size)
    }

    /// Decode a byte slice from `label`
    pub fn decode(&self, input: &[u8], label: &str) -> Result<String> {
        self.decode_reader(input, label)
    }

    /// Decode the raw bytes of a string from `label`
    pub fn decode_str(&self, input: &str, label: &str) -> Result<String> {
        self.decode_reader(input.as_bytes(), label)
    }

    /// Encode the UTF-8 text `reader` yields into `label`
    pub fn encode_reader<T: Read>(&self, reader: T, label: &str) -> Result<Vec<u8>> {
        let encoding = self.resolve(label)?;
        encode::encode_stream(label, encoding, reader, self.chunk_size)
    }

    /// Encode text into `label`
    pub fn encode(&self, input: &str, label: &str) -> Result<Vec<u8>> {
        self.encode_reader(input.as_bytes(), label)
    }

    /// Encode UTF-8 bytes into `label`
    pub fn encode_bytes(&self, input: &[u8], label: &str) -> Result<Vec<u8>> {
        self.encode_reader(input, label)
    }
}

fn or_panic<T>(result: Result<T>) -> T {
    result.unwrap_or_else(|err| panic!("{err}"))
}

/// Decode a byte slice from the encoding named by `label`
pub fn decode(input: &[u8], label: &str) -> Result<String> {
    Charsets::new().decode(input, label)
}

/// Decode the raw bytes of a string from the encoding named by `label`
pub fn decode_str(input: &str, label: &str) -> Result<String> {
    Charsets::new().decode_str(input, label)
}

/// Decode a whole stream from the encoding named by `label`
pub fn decode_reader<T: Read>(reader: T, label: &str) -> Result<String> {
    Charsets::new().decode_reader(reader, label)
}

/// Like [`decode`], but panics on failure
pub fn must_decode(input: &[u8], label: &str) -> String {
    or_panic(decode(input, label))
}

/// Like [`decode_str`], but panics on failure
pub fn must_decode_str(input: &str, label: &str) -> String {
    or_panic(decode_str(input, label))
}

/// Like [`decode_reader`], but panics on failure
pub fn must_decode_reader<T: Read>(reader: T, label: &str) -> String {
    or_panic(decode_reader(reader, label))
}

/// Encode text into the encoding named by `label`
pub fn encode(input: &str, label: &str) -> Result<Vec<u8>> {
    Charsets::new().encode(input, label)
}

/// Encode UTF-8 bytes into the encoding named by `label`
pub fn encode_bytes(input: &[u8], label: &str) -> Result<Vec<u8>> {
    Charsets::new().encode_bytes(input, label)
}

/// Encode a whole UTF-8 stream into the encoding named by `label`
pub fn encode_reader<T: Read>(reader: T, label: &str) -> Result<Vec<u8>> {
    Charsets::new().encode_reader(reader, label)
}

/// Like [`encode`], but panics on failure
pub fn must_encode(input: &str, label: &str) -> Vec<u8> {
    or_panic(encode(input, label))
}

/// Like [`encode_bytes`], but panics on failure
pub fn must_encode_bytes(input: &[u8], label: &str) -> Vec<u8> {
    or_panic(encode_bytes(input, label))
}

/// Like [`encode_reader`], but panics on failure
pub fn must_encode_reader<T: Read>(reader: T, label: &str) -> Vec<u8> {
    or_panic(encode_reader(reader, label))
}

/// Guess the encoding and language of a byte slice
pub fn guess(input: &[u8]) -> Result<Guess> {
    Guesser::new().guess(input)
}

/// Guess the encoding and language of a string's bytes
pub fn guess_str(input: &str) -> Result<Guess> {
    Guesser::new().guess_str(input)
}

/// Guess the encoding and language of a stream from its first
/// [`DEFAULT_PREFIX_LEN`] bytes
pub fn guess_reader<T: Read>(reader: T) -> Result<Guess> {
    Guesser::new().guess_reader(reader)
}

/// Like [`guess`], but panics on failure
pub fn must_guess(input: &[u8]) -> Guess {
    or_panic(guess(input))
}

/// Like [`guess_str`], but panics on failure
pub fn must_guess_str(input: &str) -> Guess {
    or_panic(guess_str(input))
}

/// Like [`guess_reader`], but panics on failure
pub fn must_guess_reader<T: Read>(reader: T) -> Guess {
    or_panic(guess_reader(reader))
}
