//! Reduction of a `RunRecord` into scalar summaries.

use crate::utils::stats::{mean, percent, std_dev};

use super::types::*;

/// Reduce every sample sequence of a run to the scalars the comparison
/// engine works with. Empty sequences reduce to 0.
pub fn aggregate(run: &RunRecord) -> AggregatedSummary {
    let total_path_sent: u64 = run.paths.values().map(|p| p.sent).sum();
    let total_path_acked: u64 = run.paths.values().map(|p| p.acked).sum();

    let paths: std::collections::BTreeMap<u32, PathSummary> = run
        .paths
        .iter()
        .map(|(id, path)| (*id, summarize_path(path, total_path_sent)))
        .collect();

    let theoretical_max_rate = paths.values().map(|p| p.mean_rate).sum();

    let buffer = &run.buffer_stats;
    let tcp = &run.tcp_stats;

    AggregatedSummary {
        throughput_mean: mean(&run.throughput),
        throughput_std: std_dev(&run.throughput),
        delay_mean: mean(&run.delay),
        loss_mean: mean(&run.loss),
        jitter_mean: mean(&run.jitter),
        paths,
        theoretical_max_rate,
        total_path_sent,
        total_path_acked,
        delivery: run.delivery_stats,
        has_buffer_data: !buffer.is_empty(),
        buffer: BufferSummary {
            average_ms: buffer.average_ms,
            mean_length: mean(&buffer.length),
            underruns: buffer.underruns,
            stalls: buffer.stalls,
            variance: buffer.variance,
        },
        has_tcp_data: !tcp.is_empty(),
        tcp: TcpSummary {
            mean_cwnd: mean(&tcp.cwnd),
            mean_rto: mean(&tcp.rto),
            mean_rtt: mean(&tcp.rtt),
            total_retransmissions: tcp.retransmissions.iter().sum(),
        },
        energy_samples: run.energy_metrics.len(),
        energy_mean: mean(&run.energy_metrics),
        path_switch_count: run.path_switches.len(),
        quality_change_count: run.quality_changes.len(),
        frames: run.frame_stats,
        protocols: run.protocol_stats.clone(),
        simulation_time_s: run.simulation_time_s,
        overall_loss: run.overall_loss,
        network_efficiency: run.network_efficiency,
    }
}

fn summarize_path(path: &PathRecord, total_sent: u64) -> PathSummary {
    PathSummary {
        mean_rate: mean(&path.rate),
        mean_rtt: mean(&path.rtt),
        sent: path.sent,
        acked: path.acked,
        delivery_ratio: percent(path.acked, path.sent),
        send_share: percent(path.sent, total_sent),
        weight: path.weight,
        norm_weight: path.norm_weight,
    }
}

impl AggregatedSummary {
    /// Delivered / sent in percent, from byte totals, then packet totals,
    /// then the reported network efficiency, then the per-path sent/acked
    /// counters. 0 when none is available.
    pub fn delivery_efficiency(&self) -> f64 {
        let d = &self.delivery;
        let by_bytes = percent(d.bytes_delivered, d.bytes_sent);
        if by_bytes > 0.0 {
            return by_bytes;
        }
        let by_packets = percent(d.packets_delivered, d.packets_sent);
        if by_packets > 0.0 {
            return by_packets;
        }
        if let Some(reported) = self.network_efficiency.filter(|v| *v > 0.0) {
            return reported;
        }
        percent(self.total_path_acked, self.total_path_sent)
    }

    /// Mean throughput over the sum of mean path rates, in percent
    pub fn path_utilization_ratio(&self) -> f64 {
        if self.theoretical_max_rate > 0.0 {
            self.throughput_mean / self.theoretical_max_rate * 100.0
        } else {
            0.0
        }
    }

    /// Mean rate of every path, ascending by path id
    pub fn path_throughputs(&self) -> Vec<f64> {
        self.paths.values().map(|p| p.mean_rate).collect()
    }
}
