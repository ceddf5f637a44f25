/// Property-based tests for the registration engine using proptest
///
/// Each case builds a fresh in-memory store and drives the async engine on a
/// current-thread runtime.
mod common;

use common::{catalogue_of, form, seed_user, wallet};
use proptest::prelude::*;
use std::{collections::BTreeSet, sync::Arc};
use tourney::{EngineConfig, MemoryStore, RegistrationEngine, RegistrationError};

const TOURNAMENTS: i64 = 12;
const FEE: i64 = 10;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn engine(store: Arc<MemoryStore>, config: EngineConfig) -> RegistrationEngine<MemoryStore> {
    RegistrationEngine::new(store, Arc::new(catalogue_of(TOURNAMENTS)), config)
}

// Registration order over a subset of the catalogue, possibly with repeats
fn registration_order() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1..=TOURNAMENTS, 0..24)
}

fn config_strategy() -> impl Strategy<Value = EngineConfig> {
    prop_oneof![Just(EngineConfig::relaxed()), Just(EngineConfig::strict())]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_list_registrations_matches_successes(
        order in registration_order(),
        config in config_strategy(),
    ) {
        let rt = runtime();
        let (listed, expected, left) = rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            seed_user(store.as_ref(), "u1", 1_000).await;
            let engine = engine(Arc::clone(&store), config);

            let mut expected = BTreeSet::new();
            for id in &order {
                match engine.register("u1", *id, form("u1")).await {
                    Ok(_) => {
                        expected.insert(*id);
                    }
                    Err(RegistrationError::AlreadyRegistered(dup)) => assert_eq!(dup, *id),
                    Err(e) => panic!("unexpected failure: {e}"),
                }
            }
            (
                engine.list_registrations("u1").await,
                expected,
                wallet(store.as_ref(), "u1").await,
            )
        });

        prop_assert_eq!(&listed, &expected);
        // Sequential duplicates are refused before any debit
        prop_assert_eq!(left, 1_000 - FEE * expected.len() as i64);
    }

    #[test]
    fn test_list_registrations_is_order_independent(order in registration_order()) {
        let rt = runtime();
        let (forward, backward) = rt.block_on(async {
            let mut results = Vec::new();
            for ids in [order.clone(), order.iter().rev().copied().collect()] {
                let store = Arc::new(MemoryStore::new());
                seed_user(store.as_ref(), "u1", 1_000).await;
                let engine = engine(Arc::clone(&store), EngineConfig::default());
                for id in ids {
                    let _ = engine.register("u1", id, form("u1")).await;
                }
                results.push(engine.list_registrations("u1").await);
            }
            (results.remove(0), results.remove(0))
        });

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn test_get_player_count_is_idempotent(registrants in 0usize..8, reads in 1usize..6) {
        let rt = runtime();
        let counts = rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let engine = engine(Arc::clone(&store), EngineConfig::default());
            for i in 0..registrants {
                let uid = format!("p{i}");
                seed_user(store.as_ref(), &uid, FEE).await;
                engine.register(&uid, 3, form(&uid)).await.unwrap();
            }

            let mut counts = Vec::new();
            for _ in 0..reads {
                counts.push(engine.get_player_count(3).await);
            }
            counts
        });

        prop_assert!(counts.iter().all(|&c| c == registrants as u64));
    }

    #[test]
    fn test_wallet_never_goes_negative(start in 0i64..60, attempts in registration_order()) {
        let rt = runtime();
        let left = rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            seed_user(store.as_ref(), "u1", start).await;
            let engine = engine(Arc::clone(&store), EngineConfig::default());
            for id in attempts {
                let _ = engine.register("u1", id, form("u1")).await;
            }
            wallet(store.as_ref(), "u1").await
        });

        prop_assert!(left >= 0);
        prop_assert!(left <= start);
        prop_assert_eq!((start - left) % FEE, 0);
    }
}
