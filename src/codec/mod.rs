//! Metric batch codecs
//!
//! Pipeline stages hand batches to each other as opaque bytes labelled with a
//! content type. This module maps a content type to a [`MetricCodec`] that
//! turns those bytes into [`Metric`]s and back.
//!
//! # Example
//!
//! ```
//! use ns_filter::codec::{CodecRegistry, CONTENT_TYPE_JSON};
//! use ns_filter::metric::{Metric, Namespace};
//!
//! let registry = CodecRegistry::with_defaults();
//! let codec = registry.lookup(CONTENT_TYPE_JSON).unwrap();
//!
//! let bytes = codec.encode(&[Metric::new(Namespace::new(["intel", "foo"]))]).unwrap();
//! let decoded = codec.decode(&bytes).unwrap();
//! assert_eq!(decoded.len(), 1);
//! ```

mod json;
mod msgpack;

use std::fmt;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

use crate::error::CodecError;
use crate::metric::Metric;

/// JSON content type
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// MessagePack content type
pub const CONTENT_TYPE_MSGPACK: &str = "application/x-msgpack";

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Encoder/decoder for one wire format
pub trait MetricCodec: Send + Sync {
    /// Content type this codec handles
    fn content_type(&self) -> &'static str;

    /// Decode a batch
    fn decode(&self, content: &[u8]) -> CodecResult<Vec<Metric>>;

    /// Encode a batch
    fn encode(&self, metrics: &[Metric]) -> CodecResult<Vec<u8>>;
}

/// Set of codecs keyed by content type
pub struct CodecRegistry {
    codecs: Vec<Box<dyn MetricCodec>>,
}

impl CodecRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Create a registry with the JSON and MessagePack codecs
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(JsonCodec));
        registry.register(Box::new(MsgPackCodec));
        registry
    }

    /// Register a codec, replacing any codec for the same content type
    pub fn register(&mut self, codec: Box<dyn MetricCodec>) {
        self.codecs
            .retain(|c| c.content_type() != codec.content_type());
        self.codecs.push(codec);
    }

    /// Find the codec for `content_type`
    ///
    /// Media type parameters (`; charset=utf-8`) and letter case are ignored.
    pub fn lookup(&self, content_type: &str) -> CodecResult<&dyn MetricCodec> {
        let essence = media_type_essence(content_type);
        self.codecs
            .iter()
            .find(|c| c.content_type().eq_ignore_ascii_case(essence))
            .map(|c| c.as_ref())
            .ok_or_else(|| CodecError::UnsupportedContentType(content_type.to_string()))
    }

    /// Content types of all registered codecs
    pub fn content_types(&self) -> Vec<&'static str> {
        self.codecs.iter().map(|c| c.content_type()).collect()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("content_types", &self.content_types())
            .finish()
    }
}

fn media_type_essence(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}
