//! Core data types for transcript analysis.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Per-path statistics keyed by the id from a "Path N:" header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathRecord {
    /// Rate samples in Mbps
    pub rate: Vec<f64>,
    /// RTT samples in ms
    pub rtt: Vec<f64>,
    /// Last-seen packets sent
    pub sent: u64,
    /// Last-seen packets acked
    pub acked: u64,
    /// Last-seen scheduler weight
    pub weight: f64,
    /// weight / sum of all path weights (0 if total weight is 0)
    pub norm_weight: f64,
}

/// Global delivery totals printed at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    pub packets_sent: u64,
    pub packets_delivered: u64,
    pub bytes_sent: u64,
    pub bytes_delivered: u64,
}

impl DeliveryStats {
    pub fn has_bytes(&self) -> bool {
        self.bytes_sent > 0 || self.bytes_delivered > 0
    }
}

/// Playout buffer statistics from the video receiver
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BufferStats {
    /// Average buffer length samples (ms)
    pub length: Vec<f64>,
    pub underruns: u64,
    pub stalls: u64,
    pub variance: f64,
    /// Last-seen average buffer length (ms)
    pub average_ms: f64,
}

impl BufferStats {
    pub fn is_empty(&self) -> bool {
        self.length.is_empty() && self.underruns == 0 && self.stalls == 0 && self.variance == 0.0
    }
}

/// TCP sub-metrics from TCP-wrapped runs
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcpStats {
    pub cwnd: Vec<f64>,
    /// Retransmission timeout samples (ms)
    pub rto: Vec<f64>,
    /// RTT samples (ms)
    pub rtt: Vec<f64>,
    pub retransmissions: Vec<u64>,
}

impl TcpStats {
    pub fn is_empty(&self) -> bool {
        self.cwnd.is_empty()
            && self.rto.is_empty()
            && self.rtt.is_empty()
            && self.retransmissions.is_empty()
    }
}

/// Key/delta frame counters from the "WebRTC Frame Statistics:" block
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameStats {
    pub key_frames_sent: u64,
    pub key_frames_acked: u64,
    pub key_frame_loss: f64,
    pub delta_frames_sent: u64,
    pub delta_frames_acked: u64,
    pub delta_frame_loss: f64,
}

impl FrameStats {
    pub fn is_empty(&self) -> bool {
        *self == FrameStats::default()
    }
}

/// Protocol qualifier seen on "NADA ...", "WebRTC ..." and "TCP ..." lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Protocol {
    Nada,
    WebRtc,
    Tcp,
}

impl Protocol {
    /// Map the transcript prefix to a protocol
    pub fn from_prefix(s: &str) -> Option<Self> {
        match s {
            "NADA" => Some(Protocol::Nada),
            "WebRTC" => Some(Protocol::WebRtc),
            "TCP" => Some(Protocol::Tcp),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Nada => write!(f, "NADA"),
            Protocol::WebRtc => write!(f, "WebRTC"),
            Protocol::Tcp => write!(f, "TCP"),
        }
    }
}

/// Counters from protocol-qualified lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProtocolStats {
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub loss: Option<f64>,
    pub efficiency: Option<f64>,
}

/// Everything parsed from one simulation transcript.
///
/// Every sequence defaults to empty and every counter to 0, so a transcript
/// with no recognizable lines yields `RunRecord::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunRecord {
    pub throughput: Vec<f64>,
    pub delay: Vec<f64>,
    pub loss: Vec<f64>,
    pub jitter: Vec<f64>,
    pub paths: BTreeMap<u32, PathRecord>,
    pub delivery_stats: DeliveryStats,
    pub buffer_stats: BufferStats,
    pub tcp_stats: TcpStats,
    /// (from_path, to_path)
    pub path_switches: Vec<(u32, u32)>,
    /// (from_quality, to_quality)
    pub quality_changes: Vec<(f64, f64)>,
    /// Energy efficiency percentage samples
    pub energy_metrics: Vec<f64>,
    pub frame_stats: FrameStats,
    pub protocol_stats: BTreeMap<Protocol, ProtocolStats>,
    pub simulation_time_s: Option<u64>,
    /// Run-wide loss from "Overall packet loss", never mixed into `loss`
    pub overall_loss: Option<f64>,
    /// Run-wide "Average network efficiency" percentage
    pub network_efficiency: Option<f64>,
}

impl RunRecord {
    /// True when none of the primary metric families produced a sample
    pub fn has_no_primary_metrics(&self) -> bool {
        self.throughput.is_empty() && self.delay.is_empty() && self.loss.is_empty()
    }

    /// Recompute `norm_weight` for every path from the last-seen weights
    pub fn normalize_path_weights(&mut self) {
        let total_weight: f64 = self.paths.values().map(|p| p.weight).sum();
        for path in self.paths.values_mut() {
            path.norm_weight = if total_weight > 0.0 {
                path.weight / total_weight
            } else {
                0.0
            };
        }
    }
}

/// Advisory information about a parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostics {
    pub lines_scanned: usize,
    pub lines_matched: usize,
    /// Throughput, delay and loss were all empty
    pub no_metrics_recognized: bool,
}

/// Result of parsing one transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub record: RunRecord,
    pub diagnostics: ParseDiagnostics,
}

/// Scalar reduction of one path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathSummary {
    pub mean_rate: f64,
    pub mean_rtt: f64,
    pub sent: u64,
    pub acked: u64,
    /// acked / sent * 100, 0 if nothing was sent
    pub delivery_ratio: f64,
    /// Share of all path packets sent on this path, percent
    pub send_share: f64,
    pub weight: f64,
    pub norm_weight: f64,
}

/// Buffer metrics reduced to scalars
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BufferSummary {
    pub average_ms: f64,
    pub mean_length: f64,
    pub underruns: u64,
    pub stalls: u64,
    pub variance: f64,
}

/// TCP metrics reduced to scalars
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TcpSummary {
    pub mean_cwnd: f64,
    pub mean_rto: f64,
    pub mean_rtt: f64,
    pub total_retransmissions: u64,
}

/// Scalar summary of a `RunRecord`, the input of the comparison engine
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedSummary {
    pub throughput_mean: f64,
    pub throughput_std: f64,
    pub delay_mean: f64,
    pub loss_mean: f64,
    pub jitter_mean: f64,
    /// Per-path throughput means, used for fairness
    pub paths: BTreeMap<u32, PathSummary>,
    /// Sum over paths of mean rate
    pub theoretical_max_rate: f64,
    pub total_path_sent: u64,
    pub total_path_acked: u64,
    pub delivery: DeliveryStats,
    pub has_buffer_data: bool,
    pub buffer: BufferSummary,
    pub has_tcp_data: bool,
    pub tcp: TcpSummary,
    pub energy_samples: usize,
    pub energy_mean: f64,
    pub path_switch_count: usize,
    pub quality_change_count: usize,
    pub frames: FrameStats,
    pub protocols: BTreeMap<Protocol, ProtocolStats>,
    pub simulation_time_s: Option<u64>,
    pub overall_loss: Option<f64>,
    pub network_efficiency: Option<f64>,
}

/// Whether a larger or a smaller value of a metric is an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Every metric the comparison engine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Throughput,
    Delay,
    Loss,
    Jitter,
    Mos,
    ThroughputStability,
    PathUtilizationRatio,
    DeliveryEfficiency,
    OverallLoss,
    PathFairness,
    ReportedEnergyEfficiency,
    PathSwitchEvents,
    EstimatedFailoverTime,
    QualityTransitions,
    QualitySmoothness,
    BufferLength,
    BufferUnderruns,
    BufferStalls,
    BufferStabilityScore,
    BufferQoe,
    TcpCongestionWindow,
    TcpRto,
    TcpRtt,
    TcpRetransmissions,
    KeyFrameLoss,
    DeltaFrameLoss,
    KeyFrameDelivery,
    ProtocolThroughput(Protocol),
    ProtocolLoss(Protocol),
    EstimatedFramesDelivered,
    FrameDeliveryRatio,
}

impl Metric {
    /// Fixed directionality used by the improvement percentage
    pub fn direction(&self) -> Direction {
        use Metric::*;
        match self {
            Throughput
            | Mos
            | PathUtilizationRatio
            | DeliveryEfficiency
            | PathFairness
            | ReportedEnergyEfficiency
            | QualitySmoothness
            | BufferLength
            | BufferStabilityScore
            | BufferQoe
            | TcpCongestionWindow
            | KeyFrameDelivery
            | ProtocolThroughput(_)
            | EstimatedFramesDelivered
            | FrameDeliveryRatio => Direction::HigherIsBetter,
            Delay
            | Loss
            | Jitter
            | ThroughputStability
            | OverallLoss
            | PathSwitchEvents
            | EstimatedFailoverTime
            | QualityTransitions
            | BufferUnderruns
            | BufferStalls
            | TcpRto
            | TcpRtt
            | TcpRetransmissions
            | KeyFrameLoss
            | DeltaFrameLoss
            | ProtocolLoss(_) => Direction::LowerIsBetter,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Metric::*;
        match self {
            Throughput => write!(f, "Throughput (Mbps)"),
            Delay => write!(f, "Delay (seconds)"),
            Loss => write!(f, "Loss (%)"),
            Jitter => write!(f, "Jitter (seconds)"),
            Mos => write!(f, "Estimated MOS (1-5)"),
            ThroughputStability => write!(f, "Throughput Stability (stddev)"),
            PathUtilizationRatio => write!(f, "Path Utilization Ratio (%)"),
            DeliveryEfficiency => write!(f, "Delivery Efficiency (%)"),
            OverallLoss => write!(f, "Overall Packet Loss (%)"),
            PathFairness => write!(f, "Path Fairness (Jain)"),
            ReportedEnergyEfficiency => write!(f, "Reported Energy Efficiency (%)"),
            PathSwitchEvents => write!(f, "Path Switch Events"),
            EstimatedFailoverTime => write!(f, "Estimated Failover Time (seconds)"),
            QualityTransitions => write!(f, "Quality Transitions"),
            QualitySmoothness => write!(f, "Quality Smoothness (%)"),
            BufferLength => write!(f, "Buffer Length (ms)"),
            BufferUnderruns => write!(f, "Buffer Underruns"),
            BufferStalls => write!(f, "Buffer Stalls"),
            BufferStabilityScore => write!(f, "Buffer Stability Score"),
            BufferQoe => write!(f, "Buffer QoE Impact (1-5)"),
            TcpCongestionWindow => write!(f, "Mean Congestion Window"),
            TcpRto => write!(f, "Mean RTO (ms)"),
            TcpRtt => write!(f, "Mean TCP RTT (ms)"),
            TcpRetransmissions => write!(f, "TCP Retransmissions"),
            KeyFrameLoss => write!(f, "Key Frame Loss (%)"),
            DeltaFrameLoss => write!(f, "Delta Frame Loss (%)"),
            KeyFrameDelivery => write!(f, "Key Frame Delivery (%)"),
            ProtocolThroughput(p) => write!(f, "{} Throughput (Mbps)", p),
            ProtocolLoss(p) => write!(f, "{} Loss (%)", p),
            EstimatedFramesDelivered => write!(f, "Estimated Frames Delivered"),
            FrameDeliveryRatio => write!(f, "Frame Delivery Ratio (%)"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Serialize NaN as `null` so exports never show an undefined value as a number
fn nan_as_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_some(value)
    }
}

/// One metric compared between the treatment and the baseline run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonRow {
    #[serde(rename = "metric_name")]
    pub metric: Metric,
    #[serde(serialize_with = "nan_as_null")]
    pub treatment_value: f64,
    #[serde(serialize_with = "nan_as_null")]
    pub baseline_value: f64,
    /// NaN when no improvement could be computed
    #[serde(serialize_with = "nan_as_null")]
    pub improvement_percent: f64,
}

impl ComparisonRow {
    pub fn improvement(&self) -> Option<f64> {
        if self.improvement_percent.is_nan() {
            None
        } else {
            Some(self.improvement_percent)
        }
    }
}

/// Ordered comparison rows: core metrics first, then extensions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Find the row for a metric
    pub fn get(&self, metric: Metric) -> Option<&ComparisonRow> {
        self.rows.iter().find(|row| row.metric == metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter()
    }
}

/// One row of the path table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathRow {
    pub path_id: u32,
    pub path_label: String,
    pub utilization_percent: f64,
    pub weight_percent: f64,
}

/// Per-path utilization of the treatment run, ascending by path id
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PathTable {
    pub rows: Vec<PathRow>,
}

impl PathTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
