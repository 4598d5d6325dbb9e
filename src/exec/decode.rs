// src/exec/decode.rs

//! Incremental decoding of raw output bytes into text.
//!
//! Chunks arrive at arbitrary byte boundaries. Encodings that work on
//! groups of bytes (UTF-8 sequences, base64 triples) keep the incomplete
//! tail in `pending` until the next chunk or [`ChunkDecoder::finish`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::types::OutputEncoding;

#[derive(Debug)]
pub struct ChunkDecoder {
    encoding: OutputEncoding,
    pending: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new(encoding: OutputEncoding) -> Self {
        Self {
            encoding,
            pending: Vec::new(),
        }
    }

    /// Decode the next chunk. May return an empty string if the whole chunk
    /// was held back.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        match self.encoding {
            OutputEncoding::Utf8 => self.decode_utf8(bytes),
            OutputEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            OutputEncoding::Ascii => bytes.iter().map(|&b| (b & 0x7f) as char).collect(),
            OutputEncoding::Hex => hex::encode(bytes),
            OutputEncoding::Base64 => self.decode_base64(bytes),
        }
    }

    /// Flush whatever is still held back at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let rest = std::mem::take(&mut self.pending);
        match self.encoding {
            OutputEncoding::Base64 => STANDARD.encode(rest),
            _ => String::from_utf8_lossy(&rest).into_owned(),
        }
    }

    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.push_str(s);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more.
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    fn decode_base64(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let whole = self.pending.len() - self.pending.len() % 3;
        if whole == 0 {
            return String::new();
        }
        let out = STANDARD.encode(&self.pending[..whole]);
        self.pending.drain(..whole);
        out
    }
}

/// Decode a complete buffer in one go.
pub fn decode_all(encoding: OutputEncoding, bytes: &[u8]) -> String {
    let mut decoder = ChunkDecoder::new(encoding);
    let mut out = decoder.decode(bytes);
    out.push_str(&decoder.finish());
    out
}
