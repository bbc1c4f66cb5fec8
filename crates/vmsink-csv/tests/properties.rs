//! Property-based tests for sampling and partitioning invariants.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use vmsink_common::{BlockNum, Epoch};
use vmsink_csv::{is_sample_due, reconcile, route, Row, SampleInterval};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn sample_due_iff_whole_interval(epoch_ms in 0i64..4_102_444_800_000, interval in 1u64..86_400) {
        let ts = Utc.timestamp_millis_opt(epoch_ms).unwrap();
        let due = is_sample_due(Some(&ts), interval).expect("positive interval");
        let expected = epoch_ms % 1000 == 0 && (epoch_ms / 1000) % interval as i64 == 0;
        prop_assert_eq!(due, expected);
    }

    #[test]
    fn absent_timestamp_never_due(interval in 1u64..86_400) {
        prop_assert!(!is_sample_due(None, interval).unwrap());
    }

    #[test]
    fn boundary_matches_interval(epoch_secs in 0i64..4_102_444_800, interval in 1u64..3_600) {
        let interval_s = SampleInterval::from_secs(interval).unwrap();
        let on = interval_s.is_boundary(Epoch(epoch_secs * 1000));
        prop_assert_eq!(on, epoch_secs % interval as i64 == 0);
    }

    #[test]
    fn partition_ids_floor_block(block in 0u64..1_000_000_000, folder in 1u64..100_000, file in 1u64..100_000) {
        let p = route("/out", BlockNum(block), folder, file).unwrap();
        prop_assert!(p.block_folder <= block && block - p.block_folder < folder);
        prop_assert!(p.file_id <= block && block - p.file_id < file);
        prop_assert_eq!(p.block_folder % folder, 0);
        prop_assert_eq!(p.file_id % file, 0);
        prop_assert!(p.file.starts_with(&p.dir));
    }

    #[test]
    fn reconciled_rows_match_header_width(
        key_sets in prop::collection::vec(prop::collection::vec(0usize..6, 0..6), 1..12)
    ) {
        let rows: Vec<Row> = key_sets
            .iter()
            .enumerate()
            .map(|(i, keys)| {
                let mut row = Row::with_epoch(Epoch(i as i64 * 1000));
                for k in keys {
                    row.insert(format!("m{k}"), i.to_string());
                }
                row
            })
            .collect();
        let csv = reconcile(&rows).expect("non-empty buffer");
        let lines: Vec<&str> = csv.split('\n').collect();
        prop_assert_eq!(lines.len(), rows.len() + 1);
        prop_assert!(lines[0].starts_with("#epoch"));
        let width = lines[0].split(',').count();
        for line in &lines[1..] {
            prop_assert_eq!(line.split(',').count(), width);
        }
    }
}
