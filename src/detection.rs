//! Charset and language detection
//!
//! [`Guesser`] feeds input to a [`Detect`] backend and turns "no candidate"
//! into [`Error::DetectionFailed`]. The default backend, [`Chardetng`], wraps
//! the `chardetng` statistical detector and derives the language from the
//! encoding it settles on.
//!
//! Streams are only sampled: [`Guesser::guess_reader`] looks at the first
//! [`DEFAULT_PREFIX_LEN`] bytes unless told otherwise, so an encoding whose
//! tell-tale bytes appear later in the stream may go unnoticed.

use std::io::Read;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, ISO_2022_JP, UTF_8};
use serde::Serialize;

use crate::{Error, Result};

/// Number of leading bytes sampled from a stream
pub const DEFAULT_PREFIX_LEN: usize = 128;

/// Confidence for a byte order mark or well-formed non-ASCII UTF-8
const CERTAIN: u8 = 100;
/// Confidence for a statistical guess that beat the other candidates
const LIKELY: u8 = 80;
/// Confidence for ASCII-only input, which every ASCII superset decodes alike
const ASCII_ONLY: u8 = 10;

const ESC: u8 = 0x1B;

/// Result of a detection run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Guess {
    charset: String,
    language: String,
    confidence: u8,
}

impl Guess {
    /// Create a guess from its parts
    pub fn new(charset: impl Into<String>, language: impl Into<String>, confidence: u8) -> Self {
        Self {
            charset: charset.into(),
            language: language.into(),
            confidence,
        }
    }

    /// Name of the detected encoding
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// ISO 639-1 code of the detected language, empty if the encoding
    /// isn't tied to one
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Confidence score from 0 to 100
    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    fn for_encoding(encoding: &'static Encoding, confidence: u8) -> Self {
        Self::new(encoding.name(), language_for(encoding), confidence)
    }
}

/// Statistical charset detection backend
pub trait Detect {
    /// Return the best candidate for `sample`, or `None` if there is none
    fn detect(&self, sample: &[u8]) -> Option<Guess>;

    /// Like [`detect`](Self::detect), for a stream prefix that was cut
    /// before the end of the stream and may end mid-character
    fn detect_prefix(&self, sample: &[u8]) -> Option<Guess> {
        self.detect(sample)
    }
}

impl<F> Detect for F
where
    F: Fn(&[u8]) -> Option<Guess>,
{
    fn detect(&self, sample: &[u8]) -> Option<Guess> {
        self(sample)
    }
}

/// Detection backed by `chardetng`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chardetng {
    tld: Option<String>,
    allow_utf8: bool,
}

impl Default for Chardetng {
    fn default() -> Self {
        Self {
            tld: None,
            allow_utf8: true,
        }
    }
}

impl Chardetng {
    /// Create a backend with no top-level domain hint that may guess UTF-8
    pub fn new() -> Self {
        Self::default()
    }

    /// Hint the top-level domain the content came from (e.g. `"jp"`)
    pub fn with_tld(mut self, tld: impl Into<String>) -> Self {
        self.tld = Some(tld.into().to_ascii_lowercase());
        self
    }

    /// Allow or forbid UTF-8 as an answer
    pub fn allow_utf8(mut self, allow: bool) -> Self {
        self.allow_utf8 = allow;
        self
    }

    fn assess(&self, sample: &[u8], truncated: bool) -> (&'static Encoding, bool) {
        let mut detector = EncodingDetector::new();
        detector.feed(sample, !truncated);
        detector.guess_assess(self.tld.as_deref().map(str::as_bytes), self.allow_utf8)
    }

    fn detect_sample(&self, sample: &[u8], truncated: bool) -> Option<Guess> {
        if sample.is_empty() {
            return None;
        }

        if let Some((encoding, _)) = Encoding::for_bom(sample) {
            return Some(Guess::for_encoding(encoding, CERTAIN));
        }

        if sample.is_ascii() {
            // ISO-2022-JP is 7-bit; anything else is plain ASCII
            if sample.contains(&ESC) {
                let (encoding, _) = self.assess(sample, truncated);
                if encoding == ISO_2022_JP {
                    return Some(Guess::for_encoding(encoding, LIKELY));
                }
            }
            let encoding = if self.allow_utf8 {
                UTF_8
            } else {
                self.assess(sample, truncated).0
            };
            return Some(Guess::for_encoding(encoding, ASCII_ONLY));
        }

        if self.allow_utf8 && is_utf8(sample, truncated) {
            return Some(Guess::for_encoding(UTF_8, CERTAIN));
        }

        match self.assess(sample, truncated) {
            (encoding, true) => Some(Guess::for_encoding(encoding, LIKELY)),
            (encoding, false) => {
                tracing::debug!(
                    candidate = encoding.name(),
                    "no candidate scored above the others"
                );
                None
            }
        }
    }
}

impl Detect for Chardetng {
    fn detect(&self, sample: &[u8]) -> Option<Guess> {
        self.detect_sample(sample, false)
    }

    fn detect_prefix(&self, sample: &[u8]) -> Option<Guess> {
        self.detect_sample(sample, true)
    }
}

/// Well-formed UTF-8. A sequence cut off at the end only passes when the
/// sample itself was cut from a longer stream.
fn is_utf8(sample: &[u8], truncated: bool) -> bool {
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(err) => truncated && err.error_len().is_none(),
    }
}

/// ISO 639-1 code of the language an encoding is tied to, or `""`
pub fn language_for(encoding: &'static Encoding) -> &'static str {
    match encoding.name() {
        "Shift_JIS" | "EUC-JP" | "ISO-2022-JP" => "ja",
        "GBK" | "gb18030" | "Big5" => "zh",
        "EUC-KR" => "ko",
        "KOI8-R" | "windows-1251" | "ISO-8859-5" | "IBM866" | "x-mac-cyrillic" => "ru",
        "KOI8-U" => "uk",
        "windows-1253" | "ISO-8859-7" => "el",
        "windows-1255" | "ISO-8859-8" | "ISO-8859-8-I" => "he",
        "windows-1256" | "ISO-8859-6" => "ar",
        "windows-1254" => "tr",
        "windows-874" => "th",
        "windows-1258" => "vi",
        _ => "",
    }
}

/// Runs a [`Detect`] backend over whole inputs or stream prefixes
#[derive(Debug, Clone)]
pub struct Guesser<D = Chardetng> {
    backend: D,
    prefix_len: usize,
}

impl Default for Guesser {
    fn default() -> Self {
        Self::with_backend(Chardetng::default())
    }
}

impl Guesser {
    /// Create a guesser backed by `chardetng`
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Detect> Guesser<D> {
    /// Create a guesser over a custom backend
    pub fn with_backend(backend: D) -> Self {
        Self {
            backend,
            prefix_len: DEFAULT_PREFIX_LEN,
        }
    }

    /// Set how many leading bytes of a stream are sampled
    pub fn with_prefix_len(mut self, prefix_len: usize) -> Self {
        self.prefix_len = prefix_len;
        self
    }

    /// Number of leading bytes sampled from a stream
    pub fn prefix_len(&self) -> usize {
        self.prefix_len
    }

    /// Guess the encoding of the whole of `input`
    pub fn guess(&self, input: &[u8]) -> Result<Guess> {
        self.report(self.backend.detect(input), input.len())
    }

    fn report(&self, guess: Option<Guess>, sample_len: usize) -> Result<Guess> {
        match guess {
            Some(guess) => {
                tracing::debug!(
                    charset = guess.charset(),
                    language = guess.language(),
                    confidence = guess.confidence(),
                    sample_len,
                    "guessed charset"
                );
                Ok(guess)
            }
            None => {
                tracing::debug!(sample_len, "charset detection failed");
                Err(Error::DetectionFailed)
            }
        }
    }

    /// Guess the encoding of a string's bytes
    pub fn guess_str(&self, input: &str) -> Result<Guess> {
        self.guess(input.as_bytes())
    }

    /// Guess the encoding of a stream from its first
    /// [`prefix_len`](Self::prefix_len) bytes
    pub fn guess_reader<R: Read>(&self, reader: R) -> Result<Guess> {
        // One byte past the prefix tells a cut stream from one that ended
        let limit = self.prefix_len.saturating_add(1);
        let mut prefix = Vec::new();
        reader.take(limit as u64).read_to_end(&mut prefix)?;

        let guess = if prefix.len() > self.prefix_len {
            prefix.truncate(self.prefix_len);
            self.backend.detect_prefix(&prefix)
        } else {
            self.backend.detect(&prefix)
        };
        self.report(guess, prefix.len())
    }
}
