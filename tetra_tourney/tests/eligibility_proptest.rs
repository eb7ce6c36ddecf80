/// Property-based tests for registration eligibility
use proptest::prelude::*;
use std::collections::HashSet;
use tetra_tourney::eligibility::{Decision, DenialReason, PlayerSnapshot, TournamentConstraints, evaluate};
use tetra_tourney::rank::Tier;

fn tier_strategy() -> impl Strategy<Value = Tier> {
    (0..Tier::ALL.len()).prop_map(|i| Tier::ALL[i])
}

fn snapshot_strategy() -> impl Strategy<Value = PlayerSnapshot> {
    (
        prop::option::of(prop::sample::select(vec!["US", "DE", "JP", "BR"])),
        tier_strategy(),
        -1.0f64..25_000.0,
    )
        .prop_map(|(country, tier, rating)| {
            PlayerSnapshot::new(country.map(str::to_string), tier, rating)
        })
}

fn constraints_strategy() -> impl Strategy<Value = TournamentConstraints> {
    (
        any::<bool>(),
        prop::option::of(prop::sample::select(vec!["US", "DE"])),
        prop::option::of(tier_strategy()),
        prop::option::of(1u32..25_000),
        prop::option::of(1u32..8),
        0usize..10,
    )
        .prop_map(|(is_open, lock, rank_cap, tr_cap, max_players, count)| {
            TournamentConstraints {
                is_open,
                is_country_locked: lock.is_some(),
                country_lock: lock.map(str::to_string),
                is_rank_capped: rank_cap.is_some(),
                rank_cap,
                is_tr_capped: tr_cap.is_some(),
                tr_cap: tr_cap.map(f64::from),
                max_players,
                current_player_ids: (0..count).map(|i| format!("p{i}")).collect(),
                current_player_count: count,
            }
        })
}

proptest! {
    #[test]
    fn prop_evaluate_is_deterministic(s in snapshot_strategy(), c in constraints_strategy()) {
        prop_assert_eq!(evaluate("new", &s, &c), evaluate("new", &s, &c));
    }

    #[test]
    fn prop_closed_always_denied_first(s in snapshot_strategy(), mut c in constraints_strategy()) {
        c.is_open = false;
        prop_assert_eq!(evaluate("p0", &s, &c), Decision::Denied(DenialReason::RegistrationClosed));
    }

    #[test]
    fn prop_unconstrained_open_allows_newcomers(s in snapshot_strategy(), count in 0usize..10) {
        let c = TournamentConstraints {
            is_open: true,
            current_player_ids: (0..count).map(|i| format!("p{i}")).collect(),
            current_player_count: count,
            ..Default::default()
        };
        prop_assert_eq!(evaluate("new", &s, &c), Decision::Allowed);
    }

    #[test]
    fn prop_allowed_respects_every_constraint(s in snapshot_strategy(), c in constraints_strategy()) {
        if evaluate("new", &s, &c).is_allowed() {
            prop_assert!(c.is_open);
            if let Some(max) = c.max_players {
                prop_assert!(c.current_player_count < max as usize);
            }
            if let Some(cap) = c.rank_cap {
                prop_assert!(!s.tier.is_unranked());
                prop_assert!(s.tier <= cap);
            }
            if let Some(cap) = c.tr_cap {
                prop_assert!(s.rating <= cap);
            }
            if let Some(lock) = &c.country_lock {
                prop_assert_eq!(s.country_code.as_deref(), Some(lock.as_str()));
            }
        }
    }

    #[test]
    fn prop_registered_players_never_allowed(s in snapshot_strategy(), mut c in constraints_strategy()) {
        c.current_player_ids.insert("p-existing".to_string());
        prop_assert!(!evaluate("p-existing", &s, &c).is_allowed());
    }

    #[test]
    fn prop_raising_rank_cap_never_hurts(s in snapshot_strategy(), cap in tier_strategy()) {
        let base = TournamentConstraints {
            is_open: true,
            is_rank_capped: true,
            rank_cap: Some(cap),
            current_player_ids: HashSet::new(),
            ..Default::default()
        };
        if evaluate("new", &s, &base).is_allowed() {
            for higher in Tier::ALL.iter().filter(|t| **t >= cap) {
                let raised = TournamentConstraints { rank_cap: Some(*higher), ..base.clone() };
                prop_assert!(evaluate("new", &s, &raised).is_allowed());
            }
        }
    }
}
