//! Namespace filter - relocate matching segments into tags
//!
//! For every metric, each namespace segment that matches the pattern is
//! removed from the namespace and written to the metric's tags under the
//! configured key. All relocated segments of one metric share that key, so
//! the last one in scan order wins; a pre-existing tag with the same key is
//! overwritten as well.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::pattern::SegmentPattern;
use crate::metric::Metric;

/// How the scan continues after a segment has been removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Examine every original segment exactly once
    #[default]
    Exhaustive,
    /// Walk the original index range over the shrinking namespace
    ///
    /// After a removal at position `j` the next segment slides into `j` and
    /// is never examined. Kept for output compatibility with older pipeline
    /// deployments.
    Legacy,
}

impl ScanMode {
    /// All accepted string forms
    pub const VARIANTS: &'static [&'static str] = &["exhaustive", "legacy"];

    /// Config string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Exhaustive => "exhaustive",
            ScanMode::Legacy => "legacy",
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exhaustive" => Ok(ScanMode::Exhaustive),
            "legacy" => Ok(ScanMode::Legacy),
            other => Err(format!(
                "unknown scan mode '{}', expected one of: {}",
                other,
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ScanMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScanMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Namespace filter
///
/// Holds a compiled pattern and the destination tag key. The filter keeps no
/// state between calls and can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    pattern: SegmentPattern,
    tag: String,
    scan_mode: ScanMode,
}

impl NamespaceFilter {
    /// Create a filter relocating segments matching `pattern` to tag `tag`
    ///
    /// # Example
    ///
    /// ```
    /// use ns_filter::metric::{Metric, Namespace};
    /// use ns_filter::transformer::{NamespaceFilter, SegmentPattern};
    ///
    /// let pattern = SegmentPattern::compile(r"([0-9]{1,3}\.){3}([0-9]{1,3})").unwrap();
    /// let filter = NamespaceFilter::new(pattern, "ip");
    ///
    /// let metrics = filter.filter(vec![Metric::new(Namespace::new([
    ///     "intel", "foo", "1.1.1.2", "bar",
    /// ]))]);
    ///
    /// assert_eq!(metrics[0].namespace.strings(), vec!["intel", "foo", "bar"]);
    /// assert_eq!(metrics[0].tags["ip"], "1.1.1.2");
    /// ```
    pub fn new(pattern: SegmentPattern, tag: impl Into<String>) -> Self {
        Self {
            pattern,
            tag: tag.into(),
            scan_mode: ScanMode::default(),
        }
    }

    /// Set the scan mode
    pub fn with_scan_mode(mut self, scan_mode: ScanMode) -> Self {
        self.scan_mode = scan_mode;
        self
    }

    /// Compiled pattern
    pub fn pattern(&self) -> &SegmentPattern {
        &self.pattern
    }

    /// Destination tag key
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Scan mode
    pub fn scan_mode(&self) -> ScanMode {
        self.scan_mode
    }

    /// Filter a batch, returning the same metrics after mutation
    pub fn filter(&self, mut metrics: Vec<Metric>) -> Vec<Metric> {
        self.apply(&mut metrics);
        metrics
    }

    /// Filter a batch in place
    ///
    /// # Returns
    ///
    /// Total number of segments relocated across the batch.
    pub fn apply(&self, metrics: &mut [Metric]) -> usize {
        metrics.iter_mut().map(|m| self.filter_metric(m)).sum()
    }

    /// Filter a single metric in place
    ///
    /// # Returns
    ///
    /// Number of segments relocated from this metric.
    pub fn filter_metric(&self, metric: &mut Metric) -> usize {
        let relocated = match self.scan_mode {
            ScanMode::Exhaustive => self.scan_exhaustive(metric),
            ScanMode::Legacy => self.scan_legacy(metric),
        };

        if relocated == 0 {
            return 0;
        }

        if metric.namespace.is_empty() {
            tracing::warn!(
                tag = %self.tag,
                value = metric.tags.get(&self.tag).map(String::as_str).unwrap_or_default(),
                pattern = %self.pattern,
                "Pattern consumed the whole namespace"
            );
        } else {
            tracing::trace!(
                namespace = %metric.namespace,
                relocated,
                "Relocated namespace segments"
            );
        }

        relocated
    }

    fn scan_exhaustive(&self, metric: &mut Metric) -> usize {
        if !metric.namespace.iter().any(|e| self.pattern.is_match(e.value())) {
            return 0;
        }

        let elements = metric.namespace.take_elements();
        let mut kept = Vec::with_capacity(elements.len());
        let mut relocated = 0;

        for element in elements {
            if self.pattern.is_match(element.value()) {
                metric.tags.insert(self.tag.clone(), element.value);
                relocated += 1;
            } else {
                kept.push(element);
            }
        }

        metric.namespace.set_elements(kept);
        relocated
    }

    fn scan_legacy(&self, metric: &mut Metric) -> usize {
        let original_len = metric.namespace.len();
        let mut relocated = 0;

        // Indices run over the original length while the namespace shrinks.
        for index in 0..original_len {
            let Some(element) = metric.namespace.get(index) else {
                break;
            };
            if self.pattern.is_match(element.value()) {
                let removed = metric.namespace.remove(index);
                metric.tags.insert(self.tag.clone(), removed.value);
                relocated += 1;
            }
        }

        relocated
    }
}
