//! Property tests for the fixed-capacity ring and its percentile queries

use okx_signals::RingBuffer;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_snapshot_holds_last_capacity_values(
        capacity in 1usize..64,
        values in proptest::collection::vec(any::<i64>(), 0..256),
    ) {
        let mut ring = RingBuffer::new(capacity).unwrap();
        for value in &values {
            ring.push(*value);
        }
        let expected_len = values.len().min(capacity);
        prop_assert_eq!(ring.len(), expected_len);
        prop_assert_eq!(ring.capacity(), capacity);
        prop_assert_eq!(ring.snapshot(), values[values.len() - expected_len..].to_vec());
    }

    #[test]
    fn prop_extend_matches_repeated_push(
        capacity in 1usize..32,
        head in proptest::collection::vec(any::<u64>(), 0..40),
        tail in proptest::collection::vec(any::<u64>(), 0..80),
    ) {
        let mut pushed = RingBuffer::new(capacity).unwrap();
        let mut extended = RingBuffer::new(capacity).unwrap();
        for value in head.iter().chain(&tail) {
            pushed.push(*value);
        }
        extended.extend_from_slice(&head);
        extended.extend_from_slice(&tail);
        prop_assert_eq!(pushed.snapshot(), extended.snapshot());
    }

    #[test]
    fn prop_percentiles_bounded_and_monotone(
        values in proptest::collection::vec(-1_000_000i64..1_000_000, 1..200),
        low in 0.0f64..=100.0,
        high in 0.0f64..=100.0,
    ) {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        let mut ring = RingBuffer::new(values.len()).unwrap();
        ring.extend_from_slice(&values);

        let min = *values.iter().min().unwrap() as f64;
        let max = *values.iter().max().unwrap() as f64;
        let [p_low, p_high] = ring.percentiles([low, high]).unwrap();
        prop_assert!(p_low >= min - 1e-6 && p_high <= max + 1e-6);
        prop_assert!(p_low <= p_high + 1e-6);
        prop_assert_eq!(ring.percentiles([0.0, 100.0]).unwrap(), [min, max]);
    }
}
