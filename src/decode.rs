//! Streaming decode from a legacy encoding into a `String`

use std::io::{ErrorKind, Read};

use encoding_rs::{CoderResult, Decoder, Encoding};

use crate::Result;
use crate::encode::MIN_SPARE;

/// Drain `reader` through a single decoder so sequences split across
/// reads come out whole. Malformed input is replaced with U+FFFD. A leading
/// byte order mark is decoded as text under the label's own encoding.
pub(crate) fn decode_stream<R: Read>(
    encoding: &'static Encoding,
    mut reader: R,
    chunk_size: usize,
) -> Result<String> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut buffer = vec![0u8; chunk_size];
    let mut output = String::new();
    let mut bytes_read = 0;
    let mut replaced = false;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        let last = read == 0;

        replaced |= decode_chunk(&mut decoder, &buffer[..read], &mut output, last);
        bytes_read += read;

        if last {
            break;
        }
    }

    if replaced {
        tracing::debug!(
            encoding = encoding.name(),
            "malformed input replaced with U+FFFD"
        );
    }
    tracing::debug!(
        encoding = encoding.name(),
        bytes_read,
        bytes_written = output.len(),
        "decoded stream"
    );

    Ok(output)
}

fn decode_chunk(decoder: &mut Decoder, mut src: &[u8], dst: &mut String, last: bool) -> bool {
    let mut replaced = false;

    loop {
        let needed = decoder
            .max_utf8_buffer_length(src.len())
            .unwrap_or(src.len());
        dst.reserve(needed.max(MIN_SPARE));

        let (result, read, had_errors) = decoder.decode_to_string(src, dst, last);
        src = &src[read..];
        replaced |= had_errors;

        match result {
            CoderResult::InputEmpty => return replaced,
            CoderResult::OutputFull => continue,
        }
    }
}
