//! Namespace filter processor
//!
//! [`Processor::process`] is the single invocation entry point used by every
//! host adapter (CLI, HTTP). One call validates the configuration, compiles
//! the pattern, decodes the batch, filters it, and re-encodes it under the
//! content type it was given.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::CodecRegistry;
use crate::error::{ProcessError, ProcessResult};
use crate::policy::{ConfigMap, ConfigPolicy, FilterConfig};
use crate::transformer::{NamespaceFilter, SegmentPattern};

/// Name of the processor
pub const PLUGIN_NAME: &str = "ns-filter";

/// Version of the processor
pub const PLUGIN_VERSION: u32 = 1;

/// Kind of pipeline component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    /// Collects metrics from a source
    Collector,
    /// Transforms metric batches
    Processor,
    /// Writes metric batches to a sink
    Publisher,
}

impl PluginKind {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::Collector => "collector",
            PluginKind::Processor => "processor",
            PluginKind::Publisher => "publisher",
        }
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata reported to the host registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginMeta {
    /// Component name
    pub name: &'static str,
    /// Component version
    pub version: u32,
    /// Component kind
    #[serde(rename = "type")]
    pub kind: PluginKind,
    /// Content types accepted on input
    pub accept_content_types: Vec<&'static str>,
    /// Content types produced on output
    pub return_content_types: Vec<&'static str>,
}

/// Successful invocation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Content type, identical to the one supplied
    pub content_type: String,
    /// Re-encoded batch
    pub content: Vec<u8>,
}

/// Namespace filter processor
///
/// Holds only immutable data; one instance can serve concurrent invocations.
#[derive(Debug, Default)]
pub struct Processor {
    codecs: CodecRegistry,
    policy: ConfigPolicy,
}

impl Processor {
    /// Create a processor with the default codecs
    pub fn new() -> Self {
        Self::with_codecs(CodecRegistry::with_defaults())
    }

    /// Create a processor with a custom codec registry
    pub fn with_codecs(codecs: CodecRegistry) -> Self {
        Self {
            codecs,
            policy: ConfigPolicy::namespace_filter(),
        }
    }

    /// Metadata descriptor
    pub fn meta(&self) -> PluginMeta {
        let content_types = self.codecs.content_types();
        PluginMeta {
            name: PLUGIN_NAME,
            version: PLUGIN_VERSION,
            kind: PluginKind::Processor,
            accept_content_types: content_types.clone(),
            return_content_types: content_types,
        }
    }

    /// Configuration policy
    pub fn config_policy(&self) -> &ConfigPolicy {
        &self.policy
    }

    /// Validate `config` without touching any content
    pub fn validate_config(&self, config: &ConfigMap) -> ProcessResult<FilterConfig> {
        Ok(self.policy.validate(config)?)
    }

    /// Validate `config` and compile its pattern into a ready filter
    pub fn build_filter(&self, config: &ConfigMap) -> ProcessResult<NamespaceFilter> {
        let cfg = self.validate_config(config)?;
        let pattern = SegmentPattern::compile(&cfg.expression)?;
        Ok(NamespaceFilter::new(pattern, cfg.tag).with_scan_mode(cfg.scan_mode))
    }

    /// Run one invocation
    ///
    /// # Arguments
    ///
    /// * `content_type` - Label of `content`, returned unchanged
    /// * `content` - Encoded metric batch
    /// * `config` - Options for this invocation
    ///
    /// # Errors
    ///
    /// Any error aborts the whole invocation and no content is returned.
    pub fn process(
        &self,
        content_type: &str,
        content: &[u8],
        config: &ConfigMap,
    ) -> ProcessResult<ProcessOutput> {
        info!(
            processor = PLUGIN_NAME,
            content_type = %content_type,
            "Processor started"
        );

        let result = self.run(content_type, content, config);
        if let Err(ref e) = result {
            warn!(
                processor = PLUGIN_NAME,
                kind = %e.kind(),
                error = %e,
                content_type = %content_type,
                content_len = content.len(),
                "Processing failed"
            );
        }
        result
    }

    fn run(
        &self,
        content_type: &str,
        content: &[u8],
        config: &ConfigMap,
    ) -> ProcessResult<ProcessOutput> {
        let filter = self.build_filter(config)?;

        let decode_error = |source| ProcessError::Decoding {
            content_type: content_type.to_string(),
            source,
        };
        let codec = self.codecs.lookup(content_type).map_err(decode_error)?;
        let mut metrics = codec.decode(content).map_err(decode_error)?;

        let relocated = filter.apply(&mut metrics);

        let content = codec
            .encode(&metrics)
            .map_err(|source| ProcessError::Encoding {
                content_type: content_type.to_string(),
                source,
            })?;

        debug!(
            metrics = metrics.len(),
            relocated,
            tag = %filter.tag(),
            scan_mode = %filter.scan_mode(),
            "Processor finished"
        );

        Ok(ProcessOutput {
            content_type: content_type.to_string(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{JsonCodec, MetricCodec, CONTENT_TYPE_JSON, CONTENT_TYPE_MSGPACK};
    use crate::error::{CodecError, ErrorKind};
    use crate::metric::{Metric, Namespace};
    use crate::policy::ConfigValue;

    const IPV4: &str = r"([0-9]{1,3}\.){3}([0-9]{1,3})";

    fn ip_config() -> ConfigMap {
        ConfigMap::from([
            ("expression".to_string(), ConfigValue::from(IPV4)),
            ("tag".to_string(), ConfigValue::from("ip")),
        ])
    }

    #[test]
    fn test_meta() {
        let meta = Processor::new().meta();
        assert_eq!(meta.name, PLUGIN_NAME);
        assert_eq!(meta.version, PLUGIN_VERSION);
        assert_eq!(meta.kind, PluginKind::Processor);
        assert_eq!(
            meta.accept_content_types,
            vec![CONTENT_TYPE_JSON, CONTENT_TYPE_MSGPACK]
        );
        assert_eq!(meta.accept_content_types, meta.return_content_types);
    }

    #[test]
    fn test_meta_serializes() {
        let json = serde_json::to_value(Processor::new().meta()).unwrap();
        assert_eq!(json["name"], "ns-filter");
        assert_eq!(json["version"], 1);
        assert_eq!(json["type"], "processor");
    }

    #[test]
    fn test_process_keeps_content_type() {
        let input = JsonCodec
            .encode(&[Metric::new(Namespace::new(["intel", "1.1.1.2"]))])
            .unwrap();

        let output = Processor::new()
            .process("application/json; charset=utf-8", &input, &ip_config())
            .unwrap();

        assert_eq!(output.content_type, "application/json; charset=utf-8");
        let decoded = JsonCodec.decode(&output.content).unwrap();
        assert_eq!(decoded[0].namespace.strings(), vec!["intel"]);
    }

    #[test]
    fn test_configuration_checked_before_decoding() {
        let err = Processor::new()
            .process(CONTENT_TYPE_JSON, b"garbage", &ConfigMap::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_pattern_checked_before_decoding() {
        let mut config = ip_config();
        config.insert("expression".to_string(), ConfigValue::from("(["));

        let err = Processor::new()
            .process(CONTENT_TYPE_JSON, b"garbage", &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PatternCompilation);
    }

    #[test]
    fn test_unsupported_content_type() {
        let err = Processor::new()
            .process("snap.gob", b"[]", &ip_config())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Decoding);
        assert!(matches!(
            err,
            ProcessError::Decoding {
                source: CodecError::UnsupportedContentType(_),
                ..
            }
        ));
    }

    #[test]
    fn test_decode_error() {
        let err = Processor::new()
            .process(CONTENT_TYPE_JSON, b"{not json", &ip_config())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decoding);
    }

    struct FailingEncoder;

    impl MetricCodec for FailingEncoder {
        fn content_type(&self) -> &'static str {
            "application/x-failing"
        }

        fn decode(&self, content: &[u8]) -> crate::codec::CodecResult<Vec<Metric>> {
            JsonCodec.decode(content)
        }

        fn encode(&self, _metrics: &[Metric]) -> crate::codec::CodecResult<Vec<u8>> {
            Err(CodecError::JsonEncode(serde::ser::Error::custom(
                "sink rejected batch",
            )))
        }
    }

    #[test]
    fn test_encode_error_returns_no_content() {
        let mut codecs = CodecRegistry::with_defaults();
        codecs.register(Box::new(FailingEncoder));
        let processor = Processor::with_codecs(codecs);

        let err = processor
            .process("application/x-failing", b"[]", &ip_config())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert!(err.to_string().contains("sink rejected batch"));
    }

    #[test]
    fn test_build_filter_uses_scan_mode() {
        let mut config = ip_config();
        config.insert("scan_mode".to_string(), ConfigValue::from("legacy"));

        let filter = Processor::new().build_filter(&config).unwrap();
        assert_eq!(filter.scan_mode(), crate::transformer::ScanMode::Legacy);
        assert_eq!(filter.tag(), "ip");
        assert_eq!(filter.pattern().as_str(), IPV4);
    }
}
