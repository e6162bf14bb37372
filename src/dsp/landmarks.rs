//! Pairing of nearby peaks into hashed landmarks.

use crate::types::{Landmark, Peak};

/// Pair every peak with itself and the following peaks.
///
/// For peak `i`, the candidates are `peaks[i..i + fan_value]` (stopping at the
/// end of the list). A pair is kept when `0 <= target.time - anchor.time <=
/// max_delta`. Landmarks come out in generation order.
pub fn generate_landmarks(peaks: &[Peak], fan_value: usize, max_delta: usize) -> Vec<Landmark> {
    let mut landmarks = Vec::with_capacity(peaks.len() * fan_value.min(4));

    for (i, &anchor) in peaks.iter().enumerate() {
        for &target in peaks[i..].iter().take(fan_value) {
            let delta = target.time as i64 - anchor.time as i64;
            if (0..=max_delta as i64).contains(&delta) {
                landmarks.push(Landmark::new(anchor, target));
            }
        }
    }

    log::debug!(
        "Generated {} landmarks from {} peaks (fan {}, max delta {})",
        landmarks.len(),
        peaks.len(),
        fan_value,
        max_delta
    );
    landmarks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest;
    use proptest::prelude::*;

    #[test]
    fn test_self_pair_is_emitted() {
        let landmarks = generate_landmarks(&[Peak::new(3, 93)], 15, 200);
        assert_eq!(landmarks.len(), 1);
        assert_eq!(landmarks[0].delta, 0);
        assert_eq!(landmarks[0].anchor, landmarks[0].target);
        assert_eq!(landmarks[0].hash_hex(), digest::to_hex(&digest::digest(b"93|93|0")));
    }

    #[test]
    fn test_generation_order() {
        let peaks = [Peak::new(0, 10), Peak::new(1, 20), Peak::new(2, 30)];
        let pairs: Vec<(usize, usize)> = generate_landmarks(&peaks, 15, 200)
            .iter()
            .map(|l| (l.anchor.freq, l.target.freq))
            .collect();
        assert_eq!(
            pairs,
            vec![(10, 10), (10, 20), (10, 30), (20, 20), (20, 30), (30, 30)]
        );
    }

    #[test]
    fn test_delta_window() {
        let peaks = [Peak::new(0, 1), Peak::new(200, 2), Peak::new(201, 3)];
        let landmarks = generate_landmarks(&peaks, 15, 200);
        assert!(landmarks.iter().any(|l| l.anchor.time == 0 && l.delta == 200));
        assert!(!landmarks.iter().any(|l| l.anchor.time == 0 && l.target.time == 201));
    }

    #[test]
    fn test_earlier_target_is_skipped() {
        let peaks = [Peak::new(5, 1), Peak::new(2, 2)];
        let landmarks = generate_landmarks(&peaks, 15, 200);
        assert_eq!(landmarks.len(), 2);
        assert!(landmarks.iter().all(|l| l.anchor == l.target));
    }

    #[test]
    fn test_fan_value_limits_pairs() {
        let peaks: Vec<Peak> = (0..40).map(|t| Peak::new(t, t % 7)).collect();
        let landmarks = generate_landmarks(&peaks, 15, 200);
        let from_first = landmarks.iter().filter(|l| l.anchor == peaks[0]).count();
        assert_eq!(from_first, 15);
        let from_last = landmarks.iter().filter(|l| l.anchor == peaks[39]).count();
        assert_eq!(from_last, 1);
    }

    #[test]
    fn test_empty() {
        assert!(generate_landmarks(&[], 15, 200).is_empty());
    }

    fn sorted_peaks() -> impl Strategy<Value = Vec<Peak>> {
        prop::collection::vec((0usize..400, 0usize..1024), 0..60).prop_map(|v| {
            let mut peaks: Vec<Peak> = v.into_iter().map(|(t, f)| Peak::new(t, f)).collect();
            peaks.sort();
            peaks.dedup();
            peaks
        })
    }

    proptest! {
        #[test]
        fn test_landmark_invariants(peaks in sorted_peaks(), fan in 1usize..20) {
            let landmarks = generate_landmarks(&peaks, fan, 200);

            for l in &landmarks {
                prop_assert!(l.delta <= 200);
                prop_assert_eq!(l.delta, l.target.time - l.anchor.time);
                let input = Landmark::digest_input(l.anchor.freq, l.target.freq, l.delta);
                prop_assert_eq!(l.digest, digest::digest(input.as_bytes()));
            }

            for p in &peaks {
                let count = landmarks.iter().filter(|l| l.anchor == *p).count();
                prop_assert!(count <= fan);
            }

            prop_assert_eq!(&landmarks, &generate_landmarks(&peaks, fan, 200));
        }
    }
}
