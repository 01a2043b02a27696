// Streaming UTF-8 decoding for chunked response bodies

/// Decodes byte chunks that may split a code point at any offset.
///
/// An incomplete sequence at the end of a chunk is held back and completed
/// by the next chunk. Bytes that can never form a valid sequence decode to
/// U+FFFD, like a non-fatal `TextDecoder`.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));

                    if let Some(invalid_len) = err.error_len() {
                        out.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[invalid_len..];
                    } else {
                        // Truncated sequence at the end of the chunk
                        self.pending = after.to_vec();
                        break;
                    }
                }
            }
        }

        out
    }

    /// Number of bytes held back waiting for the rest of a code point.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Flush at end of stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}
