//! JSON codec
//!
//! A batch is a JSON array of metric objects.

use super::{CodecResult, MetricCodec, CONTENT_TYPE_JSON};
use crate::error::CodecError;
use crate::metric::Metric;

/// `application/json` codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl MetricCodec for JsonCodec {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_JSON
    }

    fn decode(&self, content: &[u8]) -> CodecResult<Vec<Metric>> {
        serde_json::from_slice(content).map_err(CodecError::JsonDecode)
    }

    fn encode(&self, metrics: &[Metric]) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(metrics).map_err(CodecError::JsonEncode)
    }
}
