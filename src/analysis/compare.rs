//! Comparative analytics between a treatment run and a baseline run.
//!
//! Produces a `ComparisonTable` (core metrics first, then extensions in the
//! order they are computed) and a `PathTable` for the treatment's paths.
//! Every improvement follows `Metric::direction`, and a zero or undefined
//! baseline yields NaN rather than 0 or infinity.

use crate::utils::stats::{improvement_percent, jain_fairness, percent};

use super::params::ScenarioParams;
use super::types::*;

/// Simulation length assumed when a transcript does not print one
pub const DEFAULT_SIMULATION_TIME_S: u64 = 60;

/// Approximate recovery time charged to each path switch, seconds
pub const FAILOVER_TIME_PER_SWITCH_S: f64 = 0.05;

/// Loss percentage at which video becomes unusable
const MOS_LOSS_LIMIT: f64 = 20.0;
/// Delay in seconds at which video becomes unusable
const MOS_DELAY_LIMIT: f64 = 1.0;
/// Jitter multiplier: 50 ms of jitter makes video unusable
const MOS_JITTER_SCALE: f64 = 20.0;

/// MOS estimate together with the factors it was built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosEstimate {
    pub loss_factor: f64,
    pub delay_factor: f64,
    pub jitter_factor: f64,
    pub mos: f64,
}

/// Synthetic 1-5 quality score from loss (%), delay (s) and jitter (s)
pub fn estimate_mos(loss: f64, delay: f64, jitter: f64) -> MosEstimate {
    let loss_factor = (1.0 - loss / MOS_LOSS_LIMIT).max(0.0);
    let delay_factor = (1.0 - delay / MOS_DELAY_LIMIT).max(0.0);
    let jitter_factor = (1.0 - jitter * MOS_JITTER_SCALE).max(0.0);
    MosEstimate {
        loss_factor,
        delay_factor,
        jitter_factor,
        mos: 1.0 + 4.0 * loss_factor * delay_factor * jitter_factor,
    }
}

impl AggregatedSummary {
    pub fn mos(&self) -> MosEstimate {
        estimate_mos(self.loss_mean, self.delay_mean, self.jitter_mean)
    }

    /// Jain's index over mean path rates; `None` with fewer than two paths
    pub fn path_fairness(&self) -> Option<f64> {
        if self.paths.len() < 2 {
            return None;
        }
        jain_fairness(&self.path_throughputs())
    }
}

/// Time lost to path switches, at a fixed cost per switch
pub fn estimated_failover_time(switches: usize) -> f64 {
    switches as f64 * FAILOVER_TIME_PER_SWITCH_S
}

/// `100/(1+underruns) * avg_len/(1+variance)`, 0 without a buffer length
pub fn buffer_stability_score(buffer: &BufferSummary) -> f64 {
    if buffer.average_ms <= 0.0 {
        return 0.0;
    }
    100.0 / (1.0 + buffer.underruns as f64) * (buffer.average_ms / (1.0 + buffer.variance))
}

/// Buffer QoE on a 1-5 scale, penalizing underruns and stalls
pub fn buffer_qoe(buffer: &BufferSummary) -> f64 {
    (5.0 - 0.2 * buffer.underruns as f64 - 0.1 * buffer.stalls as f64).max(1.0)
}

/// Smoothness drops 5 points per quality transition
pub fn quality_smoothness(transitions: usize) -> f64 {
    (100.0 - transitions as f64 * 5.0).max(0.0)
}

/// Goodput of a protocol in Mbps from its received bytes
pub fn protocol_throughput_mbps(stats: &ProtocolStats, simulation_time_s: Option<u64>) -> f64 {
    let seconds = simulation_time_s
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_SIMULATION_TIME_S);
    stats.rx_bytes as f64 * 8.0 / (seconds as f64 * 1_000_000.0)
}

/// Accumulates rows in emission order
#[derive(Default)]
struct TableBuilder {
    rows: Vec<ComparisonRow>,
}

impl TableBuilder {
    fn push(&mut self, metric: Metric, treatment_value: f64, baseline_value: f64) {
        self.rows.push(ComparisonRow {
            metric,
            treatment_value,
            baseline_value,
            improvement_percent: improvement_percent(
                treatment_value,
                baseline_value,
                metric.direction(),
            ),
        });
    }

    fn push_counts(&mut self, metric: Metric, treatment: u64, baseline: u64) {
        self.push(metric, treatment as f64, baseline as f64);
    }

    fn build(self) -> ComparisonTable {
        ComparisonTable { rows: self.rows }
    }
}

/// Compare a treatment summary against a baseline summary.
///
/// Returns empty tables if either side is missing.
pub fn compare(
    treatment: Option<&AggregatedSummary>,
    baseline: Option<&AggregatedSummary>,
) -> (ComparisonTable, PathTable) {
    let (Some(t), Some(b)) = (treatment, baseline) else {
        log::warn!("Missing data for analysis, returning empty tables");
        return (ComparisonTable::default(), PathTable::default());
    };

    let mut table = TableBuilder::default();
    push_core_rows(&mut table, t, b);
    push_extension_rows(&mut table, t, b);
    (table.build(), path_table(t))
}

/// `compare` plus the estimated frame delivery rows, which need the
/// scenario's frame size
pub fn compare_with_params(
    treatment: Option<&AggregatedSummary>,
    baseline: Option<&AggregatedSummary>,
    params: &ScenarioParams,
) -> (ComparisonTable, PathTable) {
    let (mut table, paths) = compare(treatment, baseline);
    if let (Some(t), Some(b)) = (treatment, baseline) {
        let mut builder = TableBuilder {
            rows: std::mem::take(&mut table.rows),
        };
        push_frame_estimate_rows(&mut builder, t, b, params.average_frame_bytes());
        table = builder.build();
    }
    (table, paths)
}

fn push_core_rows(table: &mut TableBuilder, t: &AggregatedSummary, b: &AggregatedSummary) {
    table.push(Metric::Throughput, t.throughput_mean, b.throughput_mean);
    table.push(Metric::Delay, t.delay_mean, b.delay_mean);
    table.push(Metric::Loss, t.loss_mean, b.loss_mean);
    table.push(Metric::Jitter, t.jitter_mean, b.jitter_mean);
    table.push(Metric::Mos, t.mos().mos, b.mos().mos);
}

fn push_extension_rows(table: &mut TableBuilder, t: &AggregatedSummary, b: &AggregatedSummary) {
    table.push(Metric::ThroughputStability, t.throughput_std, b.throughput_std);
    table.push(
        Metric::PathUtilizationRatio,
        t.path_utilization_ratio(),
        b.path_utilization_ratio(),
    );
    table.push(Metric::DeliveryEfficiency, t.delivery_efficiency(), b.delivery_efficiency());

    if t.overall_loss.is_some() || b.overall_loss.is_some() {
        table.push(
            Metric::OverallLoss,
            t.overall_loss.unwrap_or(f64::NAN),
            b.overall_loss.unwrap_or(f64::NAN),
        );
    }

    if t.paths.len() >= 2 {
        table.push(
            Metric::PathFairness,
            t.path_fairness().unwrap_or(f64::NAN),
            b.path_fairness().unwrap_or(f64::NAN),
        );
    }

    if t.energy_samples > 0 || b.energy_samples > 0 {
        table.push(Metric::ReportedEnergyEfficiency, t.energy_mean, b.energy_mean);
    }

    let has_events = |s: &AggregatedSummary| s.path_switch_count > 0 || s.quality_change_count > 0;
    if has_events(t) || has_events(b) {
        table.push_counts(
            Metric::PathSwitchEvents,
            t.path_switch_count as u64,
            b.path_switch_count as u64,
        );
        table.push(
            Metric::EstimatedFailoverTime,
            estimated_failover_time(t.path_switch_count),
            estimated_failover_time(b.path_switch_count),
        );
        table.push_counts(
            Metric::QualityTransitions,
            t.quality_change_count as u64,
            b.quality_change_count as u64,
        );
        table.push(
            Metric::QualitySmoothness,
            quality_smoothness(t.quality_change_count),
            quality_smoothness(b.quality_change_count),
        );
    }

    if t.has_buffer_data || b.has_buffer_data {
        table.push(Metric::BufferLength, t.buffer.average_ms, b.buffer.average_ms);
        table.push_counts(Metric::BufferUnderruns, t.buffer.underruns, b.buffer.underruns);
        table.push_counts(Metric::BufferStalls, t.buffer.stalls, b.buffer.stalls);
        table.push(
            Metric::BufferStabilityScore,
            buffer_stability_score(&t.buffer),
            buffer_stability_score(&b.buffer),
        );
        table.push(Metric::BufferQoe, buffer_qoe(&t.buffer), buffer_qoe(&b.buffer));
    }

    if t.has_tcp_data || b.has_tcp_data {
        table.push(Metric::TcpCongestionWindow, t.tcp.mean_cwnd, b.tcp.mean_cwnd);
        table.push(Metric::TcpRto, t.tcp.mean_rto, b.tcp.mean_rto);
        table.push(Metric::TcpRtt, t.tcp.mean_rtt, b.tcp.mean_rtt);
        table.push_counts(
            Metric::TcpRetransmissions,
            t.tcp.total_retransmissions,
            b.tcp.total_retransmissions,
        );
    }

    if !t.frames.is_empty() || !b.frames.is_empty() {
        table.push(Metric::KeyFrameLoss, t.frames.key_frame_loss, b.frames.key_frame_loss);
        table.push(Metric::DeltaFrameLoss, t.frames.delta_frame_loss, b.frames.delta_frame_loss);
        table.push(
            Metric::KeyFrameDelivery,
            percent(t.frames.key_frames_acked, t.frames.key_frames_sent),
            percent(b.frames.key_frames_acked, b.frames.key_frames_sent),
        );
    }

    let mut protocols: Vec<Protocol> = t
        .protocols
        .keys()
        .chain(b.protocols.keys())
        .copied()
        .collect();
    protocols.sort();
    protocols.dedup();
    for protocol in protocols {
        let throughput = |s: &AggregatedSummary| {
            s.protocols
                .get(&protocol)
                .map(|p| protocol_throughput_mbps(p, s.simulation_time_s))
                .unwrap_or(f64::NAN)
        };
        let loss = |s: &AggregatedSummary| {
            s.protocols
                .get(&protocol)
                .and_then(|p| p.loss)
                .unwrap_or(f64::NAN)
        };
        table.push(Metric::ProtocolThroughput(protocol), throughput(t), throughput(b));
        table.push(Metric::ProtocolLoss(protocol), loss(t), loss(b));
    }
}

fn push_frame_estimate_rows(
    table: &mut TableBuilder,
    t: &AggregatedSummary,
    b: &AggregatedSummary,
    frame_bytes: f64,
) {
    if !t.delivery.has_bytes() && !b.delivery.has_bytes() {
        return;
    }
    let frames_delivered = |s: &AggregatedSummary| s.delivery.bytes_delivered as f64 / frame_bytes;
    let delivery_ratio = |s: &AggregatedSummary| {
        let sent = s.delivery.bytes_sent as f64 / frame_bytes;
        if sent > 0.0 {
            (frames_delivered(s) / sent).min(1.0) * 100.0
        } else {
            0.0
        }
    };
    table.push(Metric::EstimatedFramesDelivered, frames_delivered(t), frames_delivered(b));
    table.push(Metric::FrameDeliveryRatio, delivery_ratio(t), delivery_ratio(b));
}

/// Utilization (acked/sent) and normalized weight of every treatment path
pub fn path_table(treatment: &AggregatedSummary) -> PathTable {
    PathTable {
        rows: treatment
            .paths
            .iter()
            .map(|(id, path)| PathRow {
                path_id: *id,
                path_label: format!("Path {}", id),
                utilization_percent: path.delivery_ratio,
                weight_percent: path.norm_weight * 100.0,
            })
            .collect(),
    }
}
