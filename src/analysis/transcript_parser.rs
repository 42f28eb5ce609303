//! Transcript parsing for simulation runs.
//!
//! A single pass over the lines of one transcript. Each line is tested
//! against the pattern catalog in a fixed priority order and contributes to
//! at most one field of the `RunRecord`. The only state carried between
//! lines is the current path id and the frame-statistics section flag.

use std::fmt;

use regex::Captures;

use super::patterns::{PatternGroups, PATTERNS};
use super::types::*;

/// Field a malformed capture was meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Throughput,
    Delay,
    Loss,
    QualifiedLoss,
    OverallLoss,
    Jitter,
    PathId,
    PathRate,
    PathRtt,
    PathPacketsSent,
    PathPacketsAcked,
    PathWeight,
    DeliveryTotal,
    NetworkEfficiency,
    PathSwitch,
    QualityChange,
    EnergyEfficiency,
    BufferLength,
    BufferCounter,
    BufferVariance,
    TcpCwnd,
    TcpRto,
    TcpRtt,
    TcpRetransmissions,
    FrameCounter,
    FrameLoss,
    ProtocolCounter,
    ProtocolEfficiency,
    SimulationTime,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Throughput => "throughput",
            Field::Delay => "delay",
            Field::Loss => "loss",
            Field::QualifiedLoss => "protocol loss",
            Field::OverallLoss => "overall loss",
            Field::Jitter => "jitter",
            Field::PathId => "path id",
            Field::PathRate => "path rate",
            Field::PathRtt => "path RTT",
            Field::PathPacketsSent => "path packets sent",
            Field::PathPacketsAcked => "path packets acked",
            Field::PathWeight => "path weight",
            Field::DeliveryTotal => "delivery total",
            Field::NetworkEfficiency => "network efficiency",
            Field::PathSwitch => "path switch",
            Field::QualityChange => "quality change",
            Field::EnergyEfficiency => "energy efficiency",
            Field::BufferLength => "buffer length",
            Field::BufferCounter => "buffer counter",
            Field::BufferVariance => "buffer variance",
            Field::TcpCwnd => "TCP congestion window",
            Field::TcpRto => "TCP RTO",
            Field::TcpRtt => "TCP RTT",
            Field::TcpRetransmissions => "TCP retransmissions",
            Field::FrameCounter => "frame counter",
            Field::FrameLoss => "frame loss",
            Field::ProtocolCounter => "protocol counter",
            Field::ProtocolEfficiency => "protocol efficiency",
            Field::SimulationTime => "simulation time",
        };
        write!(f, "{}", name)
    }
}

/// A pattern matched but its capture is not a valid number
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: malformed {field} value {raw:?} in {text:?}")]
    MalformedNumber {
        /// 1-based line number
        line: usize,
        field: Field,
        raw: String,
        text: String,
    },
}

/// State carried from one line to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanState {
    current_path: Option<u32>,
    in_frame_stats_section: bool,
}

/// The line being scanned, used to build errors
struct Line<'a> {
    number: usize,
    text: &'a str,
}

impl Line<'_> {
    fn error(&self, field: Field, raw: &str) -> ParseError {
        ParseError::MalformedNumber {
            line: self.number,
            field,
            raw: raw.to_string(),
            text: self.text.to_string(),
        }
    }

    fn capture<'c>(&self, caps: &'c Captures, group: usize) -> &'c str {
        caps.get(group).map(|m| m.as_str()).unwrap_or_default()
    }

    fn float(&self, caps: &Captures, group: usize, field: Field) -> Result<f64, ParseError> {
        let raw = self.capture(caps, group);
        raw.parse::<f64>().map_err(|_| self.error(field, raw))
    }

    fn integer(&self, caps: &Captures, group: usize, field: Field) -> Result<u64, ParseError> {
        let raw = self.capture(caps, group);
        raw.parse::<u64>().map_err(|_| self.error(field, raw))
    }

    fn path_id(&self, caps: &Captures, group: usize) -> Result<u32, ParseError> {
        let raw = self.capture(caps, group);
        raw.parse::<u32>().map_err(|_| self.error(Field::PathId, raw))
    }
}

/// Transcript parser configured with a set of pattern groups
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptParser {
    groups: PatternGroups,
}

impl TranscriptParser {
    pub fn new(groups: PatternGroups) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> PatternGroups {
        self.groups
    }

    /// Parse one transcript. `None` and empty text are an empty observation,
    /// not an error; only a malformed numeric capture fails.
    pub fn parse(&self, transcript: Option<&str>) -> Result<ParseOutcome, ParseError> {
        let Some(text) = transcript else {
            log::debug!("No transcript supplied, treating as empty observation");
            return Ok(Self::finish(RunRecord::default(), 0, 0, ""));
        };

        let mut record = RunRecord::default();
        let mut lines_scanned = 0;
        let mut lines_matched = 0;

        text.lines()
            .enumerate()
            .try_fold(ScanState::default(), |state, (idx, text)| {
                let line = Line {
                    number: idx + 1,
                    text,
                };
                let (next, matched) = self.scan_line(state, &line, &mut record)?;
                lines_scanned += 1;
                if matched {
                    lines_matched += 1;
                }
                Ok::<_, ParseError>(next)
            })?;

        record.normalize_path_weights();
        Ok(Self::finish(record, lines_scanned, lines_matched, text))
    }

    fn finish(
        record: RunRecord,
        lines_scanned: usize,
        lines_matched: usize,
        text: &str,
    ) -> ParseOutcome {
        let no_metrics_recognized = record.has_no_primary_metrics();
        if no_metrics_recognized {
            if !text.is_empty() {
                let head: Vec<&str> = text.lines().take(10).collect();
                log::warn!(
                    "No metrics were parsed from the transcript. First lines:\n{}",
                    head.join("\n")
                );
            }
        } else {
            log::debug!(
                "Parsed {} throughput, {} delay, {} loss and {} jitter values across {} paths",
                record.throughput.len(),
                record.delay.len(),
                record.loss.len(),
                record.jitter.len(),
                record.paths.len()
            );
        }

        ParseOutcome {
            record,
            diagnostics: ParseDiagnostics {
                lines_scanned,
                lines_matched,
                no_metrics_recognized,
            },
        }
    }

    /// Apply the catalog to one line. Returns the next carry-over state and
    /// whether the line matched a rule.
    fn scan_line(
        &self,
        mut state: ScanState,
        line: &Line<'_>,
        record: &mut RunRecord,
    ) -> Result<(ScanState, bool), ParseError> {
        let p = &*PATTERNS;
        let text = line.text;

        // 1. Scalar aggregates
        if let Some(caps) = p.throughput.captures(text) {
            record.throughput.push(line.float(&caps, 1, Field::Throughput)?);
            return Ok((state, true));
        }
        if let Some(caps) = p.delay.captures(text) {
            record.delay.push(line.float(&caps, 1, Field::Delay)?);
            return Ok((state, true));
        }
        // Protocol-qualified loss is never generic loss
        if let Some(caps) = p.qualified_loss.captures(text) {
            let value = line.float(&caps, 2, Field::QualifiedLoss)?;
            if let Some(protocol) = Protocol::from_prefix(line.capture(&caps, 1)) {
                record.protocol_stats.entry(protocol).or_default().loss = Some(value);
            }
            return Ok((state, true));
        }
        // Run-wide aggregate, kept apart from the per-flow samples
        if let Some(caps) = p.overall_loss.captures(text) {
            record.overall_loss = Some(line.float(&caps, 1, Field::OverallLoss)?);
            return Ok((state, true));
        }
        if let Some(caps) = p.loss.captures(text) {
            record.loss.push(line.float(&caps, 1, Field::Loss)?);
            return Ok((state, true));
        }
        if let Some(caps) = p.jitter.captures(text) {
            record.jitter.push(line.float(&caps, 1, Field::Jitter)?);
            return Ok((state, true));
        }

        if self.groups.paths {
            // 2. Path header
            if let Some(caps) = p.path_header.captures(text) {
                let id = line.path_id(&caps, 1)?;
                record.paths.entry(id).or_default();
                state.current_path = Some(id);
                return Ok((state, true));
            }

            // 3. Per-path metrics
            if let Some(path) = state.current_path.and_then(|id| record.paths.get_mut(&id)) {
                if let Some(caps) = p.path_rate.captures(text) {
                    path.rate.push(line.float(&caps, 1, Field::PathRate)?);
                    return Ok((state, true));
                }
                if let Some(caps) = p.path_rtt.captures(text) {
                    path.rtt.push(line.float(&caps, 1, Field::PathRtt)?);
                    return Ok((state, true));
                }
                if let Some(caps) = p.path_packets_sent.captures(text) {
                    path.sent = line.integer(&caps, 1, Field::PathPacketsSent)?;
                    return Ok((state, true));
                }
                if let Some(caps) = p.path_packets_acked.captures(text) {
                    path.acked = line.integer(&caps, 1, Field::PathPacketsAcked)?;
                    return Ok((state, true));
                }
                if let Some(caps) = p.path_weight.captures(text) {
                    path.weight = line.float(&caps, 1, Field::PathWeight)?;
                    return Ok((state, true));
                }
            }
        }

        // 4. Global delivery totals
        if self.groups.delivery {
            if let Some(caps) = p.delivery_total.captures(text) {
                let value = line.integer(&caps, 3, Field::DeliveryTotal)?;
                let stats = &mut record.delivery_stats;
                match (line.capture(&caps, 1), line.capture(&caps, 2)) {
                    ("packets", "sent") => stats.packets_sent = value,
                    ("packets", _) => stats.packets_delivered = value,
                    (_, "sent") => stats.bytes_sent = value,
                    _ => stats.bytes_delivered = value,
                }
                return Ok((state, true));
            }
            if let Some(caps) = p.delivery_tx_rx.captures(text) {
                let value = line.integer(&caps, 3, Field::DeliveryTotal)?;
                let stats = &mut record.delivery_stats;
                match (line.capture(&caps, 1), line.capture(&caps, 2)) {
                    ("Tx", "Packets") => stats.packets_sent = value,
                    ("Rx", "Packets") => stats.packets_delivered = value,
                    ("Tx", _) => stats.bytes_sent = value,
                    _ => stats.bytes_delivered = value,
                }
                return Ok((state, true));
            }
            if let Some(caps) = p.network_efficiency.captures(text) {
                record.network_efficiency = Some(line.float(&caps, 1, Field::NetworkEfficiency)?);
                return Ok((state, true));
            }
        }

        // 5. Events
        if self.groups.events {
            if let Some(caps) = p.path_switch.captures(text) {
                let from = line.path_id(&caps, 1)?;
                let to = line.path_id(&caps, 2)?;
                record.path_switches.push((from, to));
                return Ok((state, true));
            }
            if let Some(caps) = p.quality_change.captures(text) {
                let from = line.float(&caps, 1, Field::QualityChange)?;
                let to = line.float(&caps, 2, Field::QualityChange)?;
                record.quality_changes.push((from, to));
                return Ok((state, true));
            }
            if let Some(caps) = p.energy_efficiency.captures(text) {
                record.energy_metrics.push(line.float(&caps, 1, Field::EnergyEfficiency)?);
                return Ok((state, true));
            }
        }

        // 6. Sub-metrics
        if self.groups.buffer {
            if let Some(caps) = p.buffer_length.captures(text) {
                let value = line.float(&caps, 1, Field::BufferLength)?;
                record.buffer_stats.average_ms = value;
                record.buffer_stats.length.push(value);
                return Ok((state, true));
            }
            if let Some(caps) = p.buffer_counter.captures(text) {
                let value = line.integer(&caps, 2, Field::BufferCounter)?;
                match line.capture(&caps, 1) {
                    "underruns" => record.buffer_stats.underruns = value,
                    _ => record.buffer_stats.stalls = value,
                }
                return Ok((state, true));
            }
            if let Some(caps) = p.buffer_variance.captures(text) {
                record.buffer_stats.variance = line.float(&caps, 1, Field::BufferVariance)?;
                return Ok((state, true));
            }
        }

        if self.groups.tcp {
            if let Some(caps) = p.tcp_cwnd.captures(text) {
                record.tcp_stats.cwnd.push(line.float(&caps, 1, Field::TcpCwnd)?);
                return Ok((state, true));
            }
            if let Some(caps) = p.tcp_rto.captures(text) {
                record.tcp_stats.rto.push(line.float(&caps, 1, Field::TcpRto)?);
                return Ok((state, true));
            }
            if let Some(caps) = p.tcp_rtt.captures(text) {
                record.tcp_stats.rtt.push(line.float(&caps, 1, Field::TcpRtt)?);
                return Ok((state, true));
            }
            if let Some(caps) = p.tcp_retransmissions.captures(text) {
                record
                    .tcp_stats
                    .retransmissions
                    .push(line.integer(&caps, 1, Field::TcpRetransmissions)?);
                return Ok((state, true));
            }
        }

        if self.groups.frames {
            if p.frame_section.is_match(text) {
                state.in_frame_stats_section = true;
                return Ok((state, true));
            }
            if state.in_frame_stats_section {
                if let Some(caps) = p.frame_counter.captures(text) {
                    let value = line.integer(&caps, 3, Field::FrameCounter)?;
                    let frames = &mut record.frame_stats;
                    match (line.capture(&caps, 1), line.capture(&caps, 2)) {
                        ("Key", "sent") => frames.key_frames_sent = value,
                        ("Key", _) => frames.key_frames_acked = value,
                        (_, "sent") => frames.delta_frames_sent = value,
                        _ => frames.delta_frames_acked = value,
                    }
                    return Ok((state, true));
                }
                if let Some(caps) = p.frame_loss.captures(text) {
                    let value = line.float(&caps, 2, Field::FrameLoss)?;
                    match line.capture(&caps, 1) {
                        "Key" => record.frame_stats.key_frame_loss = value,
                        _ => record.frame_stats.delta_frame_loss = value,
                    }
                    return Ok((state, true));
                }
            }
        }

        if self.groups.protocol {
            if let Some(caps) = p.protocol_counter.captures(text) {
                let value = line.integer(&caps, 4, Field::ProtocolCounter)?;
                if let Some(protocol) = Protocol::from_prefix(line.capture(&caps, 1)) {
                    let stats = record.protocol_stats.entry(protocol).or_default();
                    match (line.capture(&caps, 2), line.capture(&caps, 3)) {
                        ("Tx", "Packets") => stats.tx_packets = value,
                        ("Tx", _) => stats.tx_bytes = value,
                        (_, "Packets") => stats.rx_packets = value,
                        _ => stats.rx_bytes = value,
                    }
                }
                return Ok((state, true));
            }
            if let Some(caps) = p.protocol_efficiency.captures(text) {
                let value = line.float(&caps, 2, Field::ProtocolEfficiency)?;
                if let Some(protocol) = Protocol::from_prefix(line.capture(&caps, 1)) {
                    record.protocol_stats.entry(protocol).or_default().efficiency = Some(value);
                }
                return Ok((state, true));
            }
        }

        if let Some(caps) = p.simulation_time.captures(text) {
            let value = line.integer(&caps, 1, Field::SimulationTime)?;
            record.simulation_time_s.get_or_insert(value);
            return Ok((state, true));
        }

        Ok((state, false))
    }
}

/// Parse a transcript with every pattern group enabled
pub fn parse_transcript(transcript: Option<&str>) -> Result<ParseOutcome, ParseError> {
    TranscriptParser::default().parse(transcript)
}
