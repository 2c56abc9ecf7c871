//! Graph payload codec
//!
//! ```text
//! Graph ──encode──▶ document JSON / MessagePack ──StorageCodec──▶ payload bytes
//! ```
//!
//! [`encode`] and [`decode`] dispatch on the [`StorageFormat`]: the format's
//! [`Encoding`] picks the serializer and its compression flag picks the
//! [`StorageCodec`]. [`checksum`] fingerprints the final payload bytes.

pub mod compression;
pub mod document;

pub use compression::{codec_for, CodecError, GzipCodec, IdentityCodec, StorageCodec};
pub use document::SERIALIZATION_VERSION;

use sha2::{Digest, Sha256};
use sfm_core::Graph;
use std::fmt::Write as _;
use tracing::debug;

use crate::error::SerializationResult;
use crate::format::{Encoding, StorageFormat};

/// Encoded payload plus the size it had before compression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Bytes to write to disk
    pub bytes: Vec<u8>,
    /// Length of the encoded graph before compression
    pub uncompressed_len: usize,
}

impl EncodedPayload {
    /// Compressed size over uncompressed size, `None` when uncompressed
    pub fn compression_ratio(&self, format: StorageFormat) -> Option<f64> {
        if !format.is_compressed() || self.uncompressed_len == 0 {
            return None;
        }
        Some(self.bytes.len() as f64 / self.uncompressed_len as f64)
    }
}

/// Encode `graph` in `format`
///
/// Deterministic: the same graph always yields the same bytes for a given
/// format.
pub fn encode(graph: &Graph, format: StorageFormat) -> SerializationResult<Vec<u8>> {
    encode_payload(graph, format).map(|payload| payload.bytes)
}

/// Encode `graph` in `format`, keeping the pre-compression size
pub fn encode_payload(graph: &Graph, format: StorageFormat) -> SerializationResult<EncodedPayload> {
    let raw = match format.encoding() {
        Encoding::StructuredText => {
            document::ensure_finite(graph)?;
            serde_json::to_vec_pretty(&document::graph_to_document(graph))?
        }
        Encoding::OpaqueBinary => rmp_serde::to_vec_named(graph)?,
    };
    let uncompressed_len = raw.len();
    let bytes = codec_for(format).encode(&raw)?;

    debug!(
        target: "sfm::codec",
        format = %format,
        uncompressed_len,
        encoded_len = bytes.len(),
        "Encoded graph"
    );

    Ok(EncodedPayload {
        bytes,
        uncompressed_len,
    })
}

/// Decode a graph previously produced by [`encode`] with the same format
pub fn decode(bytes: &[u8], format: StorageFormat) -> SerializationResult<Graph> {
    decode_payload(bytes, format).map(|(graph, _)| graph)
}

/// Decode a graph, also returning the decompressed size
pub fn decode_payload(bytes: &[u8], format: StorageFormat) -> SerializationResult<(Graph, usize)> {
    let raw = codec_for(format).decode(bytes)?;
    let graph = match format.encoding() {
        Encoding::StructuredText => {
            let doc: serde_json::Value = serde_json::from_slice(&raw)?;
            document::document_to_graph(&doc)?
        }
        Encoding::OpaqueBinary => rmp_serde::from_slice(&raw)?,
    };

    debug!(
        target: "sfm::codec",
        format = %format,
        encoded_len = bytes.len(),
        nodes = graph.node_count(),
        relationships = graph.relationship_count(),
        "Decoded graph"
    );

    Ok((graph, raw.len()))
}

/// SHA-256 of `bytes` as 64 lower-case hex characters
pub fn checksum(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}
