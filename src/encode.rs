//! Streaming encode from UTF-8 text into a legacy encoding
//!
//! Input is validated as UTF-8 chunk by chunk, carrying partial sequences
//! over to the next read, and handed to a `Sink` that produces the target
//! bytes. UTF-16 is written directly since `encoding_rs` only decodes it.

use std::io::{ErrorKind, Read};

use encoding_rs::{DecoderResult, Encoder, EncoderResult, Encoding, UTF_8};

use crate::{Error, Result};

/// Spare capacity kept free before each coder call
pub(crate) const MIN_SPARE: usize = 16;

/// Target byte producer
enum Sink {
    /// Any encoding `encoding_rs` can encode into
    Legacy(Encoder),
    /// UTF-16 in the given byte order
    Utf16 { big_endian: bool },
}

impl Sink {
    fn for_encoding(label: &str, encoding: &'static Encoding) -> Result<Self> {
        if encoding == encoding_rs::UTF_16LE {
            Ok(Sink::Utf16 { big_endian: false })
        } else if encoding == encoding_rs::UTF_16BE {
            Ok(Sink::Utf16 { big_endian: true })
        } else if encoding.output_encoding() != encoding {
            // Only "replacement" is left here; it has no encoder
            Err(Error::UnsupportedCharset(label.to_string()))
        } else {
            Ok(Sink::Legacy(encoding.new_encoder()))
        }
    }

    /// Write `text`, which starts at byte `offset` of the whole input
    fn write(&mut self, text: &str, offset: usize, out: &mut Vec<u8>, last: bool) -> Result<()> {
        match self {
            Sink::Legacy(encoder) => encode_text(encoder, text, offset, out, last),
            Sink::Utf16 { big_endian } => {
                out.reserve(text.len() * 2);
                for code_unit in text.encode_utf16() {
                    if *big_endian {
                        out.extend_from_slice(&code_unit.to_be_bytes());
                    } else {
                        out.extend_from_slice(&code_unit.to_le_bytes());
                    }
                }
                Ok(())
            }
        }
    }
}

fn encode_text(
    encoder: &mut Encoder,
    mut src: &str,
    offset: usize,
    out: &mut Vec<u8>,
    last: bool,
) -> Result<()> {
    let mut consumed = 0;

    loop {
        let needed = encoder
            .max_buffer_length_from_utf8_without_replacement(src.len())
            .unwrap_or(src.len());
        out.reserve(needed.max(MIN_SPARE));

        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(src, out, last);
        consumed += read;
        src = &src[read..];

        match result {
            EncoderResult::InputEmpty => return Ok(()),
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(character) => {
                return Err(Error::Unmappable {
                    label: encoder.encoding().name(),
                    character,
                    position: offset + consumed - character.len_utf8(),
                });
            }
        }
    }
}

/// Validate `src` as UTF-8 into `text`, where `src` starts at byte `offset`
fn validate_chunk(
    validator: &mut encoding_rs::Decoder,
    mut src: &[u8],
    offset: usize,
    text: &mut String,
    last: bool,
) -> Result<()> {
    let mut consumed = 0;

    loop {
        let needed = validator
            .max_utf8_buffer_length_without_replacement(src.len())
            .unwrap_or(src.len());
        text.reserve(needed.max(MIN_SPARE));

        let (result, read) = validator.decode_to_string_without_replacement(src, text, last);
        consumed += read;
        src = &src[read..];

        match result {
            DecoderResult::InputEmpty => return Ok(()),
            DecoderResult::OutputFull => continue,
            DecoderResult::Malformed(bad, after) => {
                return Err(Error::MalformedInput {
                    position: offset + consumed - bad as usize - after as usize,
                });
            }
        }
    }
}

pub(crate) fn encode_stream<R: Read>(
    label: &str,
    encoding: &'static Encoding,
    mut reader: R,
    chunk_size: usize,
) -> Result<Vec<u8>> {
    let mut sink = Sink::for_encoding(label, encoding)?;
    let mut validator = UTF_8.new_decoder_without_bom_handling();
    let mut buffer = vec![0u8; chunk_size];
    let mut text = String::new();
    let mut output = Vec::new();
    let mut bytes_read = 0;
    // Bytes of the input already handed to the sink
    let mut text_offset = 0;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        let last = read == 0;

        validate_chunk(&mut validator, &buffer[..read], bytes_read, &mut text, last)?;
        bytes_read += read;

        sink.write(&text, text_offset, &mut output, last)?;
        text_offset += text.len();
        text.clear();

        if last {
            break;
        }
    }

    tracing::debug!(
        encoding = encoding.name(),
        bytes_read,
        bytes_written = output.len(),
        "encoded stream"
    );

    Ok(output)
}
