use std::collections::{BTreeMap, HashSet};

use dashmap::DashMap;
use tracing::debug;

use super::types::{CrlFacts, DistributionPoint};

pub const GENERATION_TIME_METRIC: &str = "crl_monitor_generate_time_seconds";
pub const EXPIRATION_TIME_METRIC: &str = "crl_monitor_expire_time_seconds";
pub const DISTRIBUTION_POINT_LABEL: &str = "crldp";

/// Latest observed CRL timestamps, one series per distribution point.
///
/// Each entry is replaced as a whole under its shard lock, so readers see both
/// timestamps from the same CRL.
#[derive(Debug, Default)]
pub struct CrlMetrics {
    series: DashMap<DistributionPoint, CrlFacts>,
}

impl CrlMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, distribution_point: &DistributionPoint, facts: CrlFacts) {
        self.series.insert(distribution_point.clone(), facts);
    }

    pub fn get(&self, distribution_point: &str) -> Option<CrlFacts> {
        self.series.get(distribution_point).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Drop every series whose distribution point is not in `configured`.
    ///
    /// Returns the number of removed series.
    pub fn retain_configured(&self, configured: &[DistributionPoint]) -> usize {
        let keep: HashSet<&str> = configured.iter().map(DistributionPoint::as_str).collect();
        let mut removed = 0;

        self.series.retain(|distribution_point, _| {
            let kept = keep.contains(distribution_point.as_str());
            if !kept {
                debug!("Removing metrics for unconfigured CRL {}", distribution_point);
                removed += 1;
            }
            kept
        });

        removed
    }

    /// Point-in-time copy of all series, ordered by distribution point
    pub fn snapshot(&self) -> BTreeMap<DistributionPoint, CrlFacts> {
        self.series
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    /// Render all series in the Prometheus text exposition format
    pub fn render(&self) -> String {
        format_prometheus(&self.snapshot())
    }
}

/// Format a snapshot as Prometheus exposition format.
pub fn format_prometheus(snapshot: &BTreeMap<DistributionPoint, CrlFacts>) -> String {
    let mut output = String::new();

    push_family(
        &mut output,
        EXPIRATION_TIME_METRIC,
        "Expiration time of CRLs in seconds since epoch",
        snapshot.iter().map(|(dp, facts)| (dp, facts.expiration_time.timestamp())),
    );
    push_family(
        &mut output,
        GENERATION_TIME_METRIC,
        "Generation time of CRLs in seconds since epoch",
        snapshot.iter().map(|(dp, facts)| (dp, facts.generation_time.timestamp())),
    );

    output
}

fn push_family<'a>(
    output: &mut String,
    name: &str,
    help: &str,
    samples: impl Iterator<Item = (&'a DistributionPoint, i64)>,
) {
    output.push_str(&format!("# HELP {name} {help}\n"));
    output.push_str(&format!("# TYPE {name} gauge\n"));

    for (distribution_point, value) in samples {
        output.push_str(&format!(
            "{name}{{{DISTRIBUTION_POINT_LABEL}=\"{}\"}} {value}\n",
            escape_label_value(distribution_point.as_str())
        ));
    }
}

/// Escape a label value for Prometheus format.
/// Backslash, double-quote, and newline must be escaped.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
