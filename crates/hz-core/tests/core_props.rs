use hz_core::random::{truncated_normal, weighted_index};
use hz_core::{Imt, SeqId, seed_stream};
use proptest::prelude::*;

proptest! {
    #[test]
    fn ids_round_trip_through_index_and_value(index in 0_u64..u64::MAX - 1) {
        let id = SeqId::from_index(index);
        prop_assert_eq!(id.index(), index);
        prop_assert_eq!(id.get(), index + 1);
        prop_assert_eq!(SeqId::from_value(id.get()), Some(id));
    }

    #[test]
    fn spectral_imts_parse_back(period in 0.01_f64..10.0) {
        let imt = Imt::sa(period);
        let parsed: Imt = imt.to_string().parse().unwrap();
        prop_assert_eq!(parsed, imt);
        prop_assert_eq!(parsed.sa_period(), Some(period));
    }

    #[test]
    fn truncated_draws_stay_inside_the_level(seed in any::<u64>(), level in 0.1_f64..4.0) {
        let mut rng = seed_stream(seed);
        for _ in 0..64 {
            let z = truncated_normal(&mut rng, Some(level));
            prop_assert!(z.abs() <= level);
        }
    }

    #[test]
    fn zero_weights_are_never_drawn(
        seed in any::<u64>(),
        weights in proptest::collection::vec(prop_oneof![Just(0.0_f64), 0.01_f64..1.0], 1..12),
    ) {
        let mut rng = seed_stream(seed);
        let positive = weights.iter().any(|w| *w > 0.0);
        for _ in 0..32 {
            match weighted_index(&mut rng, &weights) {
                Some(i) => prop_assert!(weights[i] > 0.0),
                None => prop_assert!(!positive),
            }
        }
    }
}
