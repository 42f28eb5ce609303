//! End-to-end regression tests: transcripts through parse, aggregate and
//! compare, plus batch configuration on disk.

use std::fs;

use nadastat::analysis::{
    aggregate, analyze_scenarios, compare, compare::estimate_mos, compare_with_params,
    parse_transcript, DeliveryStats, Metric, PatternGroups, Protocol, RunRecord, ScenarioInput,
    ScenarioParams,
};
use nadastat::config_loader;
use nadastat::utils::jain_fairness;

const MULTIPATH_TRANSCRIPT: &str = "\
=== Multipath NADA Simulation ===
Simulation time: 60 seconds
Path 1:
  Rate: 6.0 Mbps
  RTT: 40.0 ms
  Packets sent: 5000
  Packets acked: 4950
  Weight: 0.6
Path 2:
  Rate: 4.0 Mbps
  RTT: 60.0 ms
  Packets sent: 3000
  Packets acked: 2940
  Weight: 0.4
Path switch: from path 1 to path 2
Throughput: 9.8 Mbps
Mean delay: 0.045 seconds
Packet loss: 1.2%
Mean jitter: 0.008 seconds
Path 1:
  Rate: 6.2 Mbps
Total packets sent: 8000
Total packets delivered: 7890
NADA packet loss: 3%
";

const WEBRTC_TRANSCRIPT: &str = "\
Flow 1 (10.1.1.1 -> 10.1.2.2) [WebRTC]
  Tx Packets: 5000
  Rx Packets: 4950
  Tx Bytes: 5000000
  Rx Bytes: 4950000
  Throughput: 6.6 Mbps
  Mean delay: 0.045 seconds
  Mean jitter: 0.008 seconds
  Packet loss: 1%

Flow 2 (10.1.1.1 -> 10.1.3.2)
  Tx Packets: 5000
  Rx Packets: 4850
  Tx Bytes: 5000000
  Rx Bytes: 4850000
  Throughput: 6.4 Mbps
  Mean delay: 0.050 seconds
  Mean jitter: 0.010 seconds
  Packet loss: 3%

=== OVERALL STATISTICS ===
Total Tx Packets: 10000
Total Rx Packets: 9800
Overall packet loss: 2%
Total Tx Bytes: 10000000
Total Rx Bytes: 9800000
Average network efficiency: 98%
";

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

#[test]
fn test_empty_transcript_is_default_record() {
    for text in [None, Some(""), Some("\n\n")] {
        let outcome = parse_transcript(text).unwrap();
        assert_eq!(outcome.record, RunRecord::default());
        assert!(outcome.diagnostics.no_metrics_recognized);
    }
}

#[test]
fn test_parsing_is_deterministic() {
    let first = parse_transcript(Some(MULTIPATH_TRANSCRIPT)).unwrap();
    let second = parse_transcript(Some(MULTIPATH_TRANSCRIPT)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_core_metrics_and_mos() {
    let outcome = parse_transcript(Some(MULTIPATH_TRANSCRIPT)).unwrap();
    let record = &outcome.record;
    assert_eq!(record.throughput, vec![9.8]);
    assert_eq!(record.delay, vec![0.045]);
    assert_eq!(record.loss, vec![1.2]);
    assert_eq!(record.jitter, vec![0.008]);
    assert!(!outcome.diagnostics.no_metrics_recognized);

    let mos = aggregate(record).mos();
    assert!(close(mos.loss_factor, 0.94, 1e-9));
    assert!(close(mos.delay_factor, 0.955, 1e-9));
    assert!(close(mos.jitter_factor, 0.84, 1e-9));
    assert!(close(mos.mos, 1.0 + 4.0 * 0.94 * 0.955 * 0.84, 1e-9));
    assert!(close(mos.mos, 4.014, 0.01));
}

#[test]
fn test_repeated_path_header_accumulates() {
    let record = parse_transcript(Some(MULTIPATH_TRANSCRIPT)).unwrap().record;
    assert_eq!(record.paths.len(), 2);
    let path1 = &record.paths[&1];
    assert_eq!(path1.rate, vec![6.0, 6.2]);
    assert_eq!(path1.sent, 5000);
    assert_eq!(path1.acked, 4950);
    assert_eq!(record.path_switches, vec![(1, 2)]);
    assert_eq!(record.simulation_time_s, Some(60));
}

#[test]
fn test_qualified_loss_is_not_generic_loss() {
    let record = parse_transcript(Some("NADA packet loss: 3%\nPacket loss: 3%")).unwrap().record;
    assert_eq!(record.loss, vec![3.0]);
    assert_eq!(record.protocol_stats[&Protocol::Nada].loss, Some(3.0));

    let record = parse_transcript(Some("NADA packet loss: 3%")).unwrap().record;
    assert!(record.loss.is_empty());
}

#[test]
fn test_improvement_directions() {
    let treatment =
        parse_transcript(Some("Throughput: 10.0 Mbps\nMean delay: 0.04 seconds")).unwrap();
    let baseline =
        parse_transcript(Some("Throughput: 8.0 Mbps\nMean delay: 0.05 seconds")).unwrap();
    let (table, _) = compare(
        Some(&aggregate(&treatment.record)),
        Some(&aggregate(&baseline.record)),
    );

    let names: Vec<Metric> = table.iter().take(5).map(|row| row.metric).collect();
    assert_eq!(
        names,
        vec![Metric::Throughput, Metric::Delay, Metric::Loss, Metric::Jitter, Metric::Mos]
    );
    assert!(close(table.get(Metric::Throughput).unwrap().improvement_percent, 25.0, 1e-9));
    assert!(close(table.get(Metric::Delay).unwrap().improvement_percent, 20.0, 1e-9));

    // Neither run reported loss or jitter
    assert!(table.get(Metric::Loss).unwrap().improvement_percent.is_nan());
    assert!(table.get(Metric::Jitter).unwrap().improvement_percent.is_nan());
}

#[test]
fn test_zero_baseline_serializes_as_null() {
    let treatment = parse_transcript(Some("Throughput: 5.0 Mbps")).unwrap();
    let baseline = parse_transcript(Some("Mean delay: 0.05 seconds")).unwrap();
    let (table, _) = compare(
        Some(&aggregate(&treatment.record)),
        Some(&aggregate(&baseline.record)),
    );

    let json = serde_json::to_value(&table).unwrap();
    let first = &json[0];
    assert_eq!(first["metric_name"], "Throughput (Mbps)");
    assert_eq!(first["treatment_value"], 5.0);
    assert_eq!(first["baseline_value"], 0.0);
    assert!(first["improvement_percent"].is_null());
}

#[test]
fn test_missing_side_yields_empty_tables() {
    let summary = aggregate(&RunRecord::default());
    let (table, paths) = compare(Some(&summary), None);
    assert!(table.is_empty());
    assert!(paths.is_empty());
}

#[test]
fn test_jain_fairness_bounds() {
    assert_eq!(jain_fairness(&[5.0, 5.0]), Some(1.0));
    assert_eq!(jain_fairness(&[10.0, 0.0]), Some(0.5));
}

#[test]
fn test_multipath_against_single_path() {
    let treatment = aggregate(&parse_transcript(Some(MULTIPATH_TRANSCRIPT)).unwrap().record);
    let baseline = aggregate(
        &parse_transcript(Some(
            "Throughput: 7.0 Mbps\nMean delay: 0.060 seconds\n\
             Packet loss: 2.0%\nMean jitter: 0.010 seconds",
        ))
        .unwrap()
        .record,
    );
    let (table, paths) = compare(Some(&treatment), Some(&baseline));

    let mos = table.get(Metric::Mos).unwrap();
    assert!(close(mos.treatment_value, treatment.mos().mos, 1e-12));
    assert!(close(mos.baseline_value, estimate_mos(2.0, 0.06, 0.01).mos, 1e-12));
    assert!(mos.improvement_percent > 0.0);

    let fairness = table.get(Metric::PathFairness).unwrap();
    assert!(fairness.treatment_value > 0.5 && fairness.treatment_value <= 1.0);

    let ids: Vec<u32> = paths.rows.iter().map(|row| row.path_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(close(paths.rows[0].utilization_percent, 99.0, 1e-9));
}

#[test]
fn test_batch_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mp.txt"), MULTIPATH_TRANSCRIPT).unwrap();
    fs::write(dir.path().join("simple.txt"), "Throughput: 7.0 Mbps\n").unwrap();
    fs::write(dir.path().join("broken.txt"), "Throughput: 7..0 Mbps\n").unwrap();
    let config_path = dir.path().join("batch.yaml");
    fs::write(
        &config_path,
        r#"
flavor: multipath
labels:
  treatment: Multipath-NADA
  baseline: Simple-NADA
scenarios:
  - name: Standard
    params: { dataRate: 10Mbps, delayMs: 50 }
    treatment: mp.txt
    baseline: simple.txt
  - name: Broken
    treatment: mp.txt
    baseline: broken.txt
  - name: NoBaseline
    treatment: mp.txt
    baseline: does-not-exist.txt
"#,
    )
    .unwrap();

    let config = config_loader::load_config(&config_path).unwrap();
    let inputs: Vec<ScenarioInput> = config_loader::load_scenarios(&config, dir.path()).unwrap();
    let outcomes = analyze_scenarios(&inputs, config.flavor.groups());

    assert_eq!(outcomes.len(), 3);
    let standard = outcomes[0].as_ref().unwrap();
    assert_eq!(standard.name, "Standard");
    assert!(close(
        standard.comparison.get(Metric::Throughput).unwrap().improvement_percent,
        40.0,
        1e-9
    ));
    assert!(outcomes[1].is_err());

    let no_baseline = outcomes[2].as_ref().unwrap();
    assert!(no_baseline.baseline_diagnostics.no_metrics_recognized);
    assert!(no_baseline
        .comparison
        .get(Metric::Throughput)
        .unwrap()
        .improvement_percent
        .is_nan());
}

#[test]
fn test_flavor_groups_disable_patterns() {
    let record = nadastat::analysis::TranscriptParser::new(PatternGroups::CORE)
        .parse(Some(MULTIPATH_TRANSCRIPT))
        .unwrap()
        .record;
    assert!(record.paths.is_empty());
    assert_eq!(record.throughput, vec![9.8]);
}

#[test]
fn test_overall_statistics_do_not_skew_flow_loss() {
    let record = parse_transcript(Some(WEBRTC_TRANSCRIPT)).unwrap().record;
    assert_eq!(record.loss, vec![1.0, 3.0]);
    assert_eq!(record.overall_loss, Some(2.0));
    assert_eq!(record.network_efficiency, Some(98.0));
    assert_eq!(
        record.delivery_stats,
        DeliveryStats {
            packets_sent: 10000,
            packets_delivered: 9800,
            bytes_sent: 10_000_000,
            bytes_delivered: 9_800_000,
        }
    );

    let summary = aggregate(&record);
    assert!(close(summary.loss_mean, 2.0, 1e-9));
    assert!(close(summary.delivery_efficiency(), 98.0, 1e-9));
}

#[test]
fn test_webrtc_run_emits_delivery_and_frame_rows() {
    let treatment = aggregate(&parse_transcript(Some(WEBRTC_TRANSCRIPT)).unwrap().record);
    let baseline = aggregate(
        &parse_transcript(Some(
            "  Throughput: 5.0 Mbps\n  Packet loss: 4%\n\
             Total Tx Bytes: 10000000\nTotal Rx Bytes: 9000000\n\
             Overall packet loss: 4%\n",
        ))
        .unwrap()
        .record,
    );
    let params = ScenarioParams::from_pairs(["packetSize=1000"]).unwrap();
    let (table, _) = compare_with_params(Some(&treatment), Some(&baseline), &params);

    let efficiency = table.get(Metric::DeliveryEfficiency).unwrap();
    assert!(close(efficiency.treatment_value, 98.0, 1e-9));
    assert!(close(efficiency.baseline_value, 90.0, 1e-9));

    let overall = table.get(Metric::OverallLoss).unwrap();
    assert!(close(overall.improvement_percent, 50.0, 1e-9));

    let frames = table.get(Metric::EstimatedFramesDelivered).unwrap();
    assert!(close(frames.treatment_value, 3920.0, 1e-9));
    assert!(close(frames.baseline_value, 3600.0, 1e-9));
}
