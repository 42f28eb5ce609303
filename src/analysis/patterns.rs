//! Pattern catalog for simulation transcripts.
//!
//! One compiled regex per metric family, grouped so that transcript flavors
//! (single-path, multipath, TCP-wrapped, WebRTC) are a matter of enabling
//! groups rather than separate parsers.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Compiled regex patterns for transcript parsing
pub struct TranscriptPatterns {
    /// Match: "Throughput: 9.8 Mbps"
    pub throughput: Regex,
    /// Match: "Mean delay: 0.045 seconds"
    pub delay: Regex,
    /// Match: "NADA packet loss: 3%" (also WebRTC/TCP)
    pub qualified_loss: Regex,
    /// Match: "Overall packet loss: 2.1%"
    pub overall_loss: Regex,
    /// Match: "  Packet loss: 1.2%"
    pub loss: Regex,
    /// Match: "Mean jitter: 0.008 seconds"
    pub jitter: Regex,
    /// Match: "Path 1:"
    pub path_header: Regex,
    /// Match: "  Rate: 5.2 Mbps"
    pub path_rate: Regex,
    /// Match: "  RTT: 40 ms"
    pub path_rtt: Regex,
    /// Match: "  Packets sent: 5000"
    pub path_packets_sent: Regex,
    /// Match: "  Packets acked: 4950"
    pub path_packets_acked: Regex,
    /// Match: "  Weight: 0.6"
    pub path_weight: Regex,
    /// Match: "Total packets sent: N", "Total bytes delivered: N", ...
    pub delivery_total: Regex,
    /// Match: "Total Tx Packets: N", "Total Rx Bytes: N", ...
    pub delivery_tx_rx: Regex,
    /// Match: "Average network efficiency: 97.9%"
    pub network_efficiency: Regex,
    /// Match: "Path switch: from path 1 to path 2"
    pub path_switch: Regex,
    /// Match: "Quality changed: 0.8 -> 0.5"
    pub quality_change: Regex,
    /// Match: "Energy efficiency: 97.5%"
    pub energy_efficiency: Regex,
    /// Match: "Average buffer length: 120.5 ms"
    pub buffer_length: Regex,
    /// Match: "Buffer underruns: 3" / "Buffer stalls: 1"
    pub buffer_counter: Regex,
    /// Match: "Buffer variance: 12.4"
    pub buffer_variance: Regex,
    /// Match: "Congestion window: 14600" (optionally "TCP " prefixed)
    pub tcp_cwnd: Regex,
    /// Match: "RTO: 200 ms" (optionally "TCP " prefixed)
    pub tcp_rto: Regex,
    /// Match: "TCP RTT: 42 ms"
    pub tcp_rtt: Regex,
    /// Match: "Retransmissions: 12" (optionally "TCP " prefixed)
    pub tcp_retransmissions: Regex,
    /// Match: "WebRTC Frame Statistics:"
    pub frame_section: Regex,
    /// Match: "Key frames sent: 10" / "Delta frames acked: 280"
    pub frame_counter: Regex,
    /// Match: "Key frame loss: 2.5%"
    pub frame_loss: Regex,
    /// Match: "NADA Tx Packets: 5000" / "TCP Rx Bytes: 1000"
    pub protocol_counter: Regex,
    /// Match: "TCP efficiency: 98.1%"
    pub protocol_efficiency: Regex,
    /// Match: "Simulation time: 60 seconds"
    pub simulation_time: Regex,
}

impl TranscriptPatterns {
    pub fn new() -> Self {
        Self {
            throughput: Regex::new(r"Throughput: ([0-9.]+) Mbps")
                .expect("Invalid throughput regex"),
            delay: Regex::new(r"Mean delay: ([0-9.e-]+) seconds").expect("Invalid delay regex"),
            qualified_loss: Regex::new(r"^\s*(NADA|WebRTC|TCP) packet loss: ([0-9.]+)%")
                .expect("Invalid qualified_loss regex"),
            overall_loss: Regex::new(r"^\s*Overall packet loss: ([0-9.]+)%")
                .expect("Invalid overall_loss regex"),
            loss: Regex::new(r"Packet loss: ([0-9.]+)%").expect("Invalid loss regex"),
            jitter: Regex::new(r"Mean jitter: ([0-9.e-]+) seconds").expect("Invalid jitter regex"),
            path_header: Regex::new(r"Path (\d+):").expect("Invalid path_header regex"),
            path_rate: Regex::new(r"^\s*Rate: ([0-9.]+) Mbps").expect("Invalid path_rate regex"),
            path_rtt: Regex::new(r"^\s*RTT: ([0-9.]+) ms").expect("Invalid path_rtt regex"),
            path_packets_sent: Regex::new(r"^\s*Packets sent: (\d+)")
                .expect("Invalid path_packets_sent regex"),
            path_packets_acked: Regex::new(r"^\s*Packets acked: (\d+)")
                .expect("Invalid path_packets_acked regex"),
            path_weight: Regex::new(r"^\s*Weight: ([0-9.]+)").expect("Invalid path_weight regex"),
            delivery_total: Regex::new(r"Total (packets|bytes) (sent|delivered): (\d+)")
                .expect("Invalid delivery_total regex"),
            delivery_tx_rx: Regex::new(r"^\s*Total (Tx|Rx) (Packets|Bytes): (\d+)")
                .expect("Invalid delivery_tx_rx regex"),
            network_efficiency: Regex::new(r"Average network efficiency: ([0-9.]+)%")
                .expect("Invalid network_efficiency regex"),
            path_switch: Regex::new(r"Path switch: from path (\d+) to path (\d+)")
                .expect("Invalid path_switch regex"),
            quality_change: Regex::new(r"Quality changed: ([0-9.]+) -> ([0-9.]+)")
                .expect("Invalid quality_change regex"),
            energy_efficiency: Regex::new(r"Energy efficiency: ([0-9.]+)%")
                .expect("Invalid energy_efficiency regex"),
            buffer_length: Regex::new(r"Average buffer length: ([0-9.]+) ms")
                .expect("Invalid buffer_length regex"),
            buffer_counter: Regex::new(r"Buffer (underruns|stalls): (\d+)")
                .expect("Invalid buffer_counter regex"),
            buffer_variance: Regex::new(r"Buffer variance: ([0-9.]+)")
                .expect("Invalid buffer_variance regex"),
            tcp_cwnd: Regex::new(r"^\s*(?:TCP )?[Cc]ongestion window: ([0-9.]+)")
                .expect("Invalid tcp_cwnd regex"),
            tcp_rto: Regex::new(r"^\s*(?:TCP )?RTO: ([0-9.]+) ms").expect("Invalid tcp_rto regex"),
            tcp_rtt: Regex::new(r"^\s*TCP RTT: ([0-9.]+) ms").expect("Invalid tcp_rtt regex"),
            tcp_retransmissions: Regex::new(r"^\s*(?:TCP )?[Rr]etransmissions: (\d+)")
                .expect("Invalid tcp_retransmissions regex"),
            frame_section: Regex::new(r"WebRTC Frame Statistics:")
                .expect("Invalid frame_section regex"),
            frame_counter: Regex::new(r"(Key|Delta) frames (sent|acked): (\d+)")
                .expect("Invalid frame_counter regex"),
            frame_loss: Regex::new(r"(Key|Delta) frame loss: ([0-9.]+)%")
                .expect("Invalid frame_loss regex"),
            protocol_counter: Regex::new(r"^\s*(NADA|WebRTC|TCP) (Tx|Rx) (Packets|Bytes): (\d+)")
                .expect("Invalid protocol_counter regex"),
            protocol_efficiency: Regex::new(r"^\s*(NADA|WebRTC|TCP) efficiency: ([0-9.]+)%")
                .expect("Invalid protocol_efficiency regex"),
            simulation_time: Regex::new(r"Simulation time: (\d+) seconds")
                .expect("Invalid simulation_time regex"),
        }
    }
}

impl Default for TranscriptPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Global patterns instance
pub static PATTERNS: LazyLock<TranscriptPatterns> = LazyLock::new(TranscriptPatterns::new);

/// Pattern groups enabled for a parse. The core group (throughput, delay,
/// loss, jitter, simulation time) is always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternGroups {
    pub paths: bool,
    pub delivery: bool,
    pub events: bool,
    pub buffer: bool,
    pub tcp: bool,
    pub frames: bool,
    pub protocol: bool,
}

impl PatternGroups {
    /// Every group enabled
    pub const ALL: PatternGroups = PatternGroups {
        paths: true,
        delivery: true,
        events: true,
        buffer: true,
        tcp: true,
        frames: true,
        protocol: true,
    };

    /// Only the core group
    pub const CORE: PatternGroups = PatternGroups {
        paths: false,
        delivery: false,
        events: false,
        buffer: false,
        tcp: false,
        frames: false,
        protocol: false,
    };
}

impl Default for PatternGroups {
    fn default() -> Self {
        PatternGroups::ALL
    }
}

/// Transcript flavors produced by the different simulation programs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    SinglePath,
    Multipath,
    TcpWrapped,
    #[serde(rename = "webrtc")]
    WebRtc,
    #[default]
    All,
}

impl Flavor {
    /// Pattern groups enabled for this flavor
    pub fn groups(&self) -> PatternGroups {
        let core = PatternGroups::CORE;
        match self {
            Flavor::SinglePath => PatternGroups {
                delivery: true,
                buffer: true,
                ..core
            },
            Flavor::Multipath => PatternGroups {
                paths: true,
                delivery: true,
                events: true,
                buffer: true,
                ..core
            },
            Flavor::TcpWrapped => PatternGroups {
                tcp: true,
                protocol: true,
                ..Flavor::Multipath.groups()
            },
            Flavor::WebRtc => PatternGroups {
                paths: true,
                delivery: true,
                buffer: true,
                frames: true,
                protocol: true,
                ..core
            },
            Flavor::All => PatternGroups::ALL,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::SinglePath => write!(f, "single_path"),
            Flavor::Multipath => write!(f, "multipath"),
            Flavor::TcpWrapped => write!(f, "tcp_wrapped"),
            Flavor::WebRtc => write!(f, "webrtc"),
            Flavor::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single_path" | "single" => Ok(Flavor::SinglePath),
            "multipath" | "mp" => Ok(Flavor::Multipath),
            "tcp_wrapped" | "tcp" => Ok(Flavor::TcpWrapped),
            "webrtc" => Ok(Flavor::WebRtc),
            "all" => Ok(Flavor::All),
            other => Err(format!("Unknown transcript flavor: {}", other)),
        }
    }
}
