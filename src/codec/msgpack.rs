//! MessagePack codec
//!
//! Structs are written with field names (map encoding) so optional fields can
//! be omitted and older or newer producers stay readable.

use super::{CodecResult, MetricCodec, CONTENT_TYPE_MSGPACK};
use crate::error::CodecError;
use crate::metric::Metric;

/// `application/x-msgpack` codec
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl MetricCodec for MsgPackCodec {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_MSGPACK
    }

    fn decode(&self, content: &[u8]) -> CodecResult<Vec<Metric>> {
        rmp_serde::from_slice(content).map_err(CodecError::MsgPackDecode)
    }

    fn encode(&self, metrics: &[Metric]) -> CodecResult<Vec<u8>> {
        rmp_serde::to_vec_named(metrics).map_err(CodecError::MsgPackEncode)
    }
}
