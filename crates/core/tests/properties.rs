//! Properties every check must satisfy, over seeded random histories.

mod common;

use common::{config, random_history, STRATEGIES};
use tapcheck_core::graph::Relation;
use tapcheck_core::{check, Algorithm, Checker, IsolationLevel, Tap};

const SEEDS: std::ops::Range<u64> = 0..48;

#[test]
fn checking_twice_gives_the_same_report() {
    for seed in SEEDS {
        let h = random_history(seed, 4, 6, 4, 4);
        for level in IsolationLevel::ALL {
            for algorithm in STRATEGIES {
                let mut config = config(level, algorithm);
                config.visualize = true;
                let first = check(&h, &config).unwrap();
                let second = check(&h, &config).unwrap();
                assert_eq!(first, second, "seed {seed}, {level}, {algorithm}");
            }
        }
    }
}

#[test]
fn strategies_agree() {
    for seed in SEEDS {
        let h = random_history(seed, 5, 5, 5, 5);
        for level in IsolationLevel::ALL {
            let reports: Vec<_> = STRATEGIES
                .iter()
                .map(|&algorithm| check(&h, &config(level, algorithm)).unwrap())
                .collect();
            for (algorithm, report) in STRATEGIES.iter().zip(&reports).skip(1) {
                assert_eq!(
                    report.taps, reports[0].taps,
                    "seed {seed}, {level}, {algorithm}"
                );
            }
        }
    }
}

#[test]
fn stronger_levels_find_more() {
    for seed in SEEDS {
        let h = random_history(seed, 3, 8, 3, 3);
        for algorithm in STRATEGIES {
            let found: Vec<_> = IsolationLevel::ALL
                .iter()
                .map(|&level| check(&h, &config(level, algorithm)).unwrap().taps)
                .collect();
            assert!(found[0].is_subset(&found[1]), "seed {seed}, {algorithm}");
            assert!(found[1].is_subset(&found[2]), "seed {seed}, {algorithm}");
        }
    }
}

#[test]
fn session_order_is_commit_order() {
    for seed in SEEDS {
        let h = random_history(seed, 4, 6, 3, 4);
        for algorithm in STRATEGIES {
            let config = config(IsolationLevel::TransactionalCausal, algorithm);
            let mut checker = Checker::new(&h, config);
            checker.run().unwrap();
            let graph = checker.graph();
            for session in h.sessions() {
                for pair in session.transactions.windows(2) {
                    let earlier = graph.node_of(pair[0].id).unwrap();
                    let later = graph.node_of(pair[1].id).unwrap();
                    assert!(graph.can_reach(earlier, later, Relation::CommitOrder).unwrap());
                    assert!(graph.can_reach(earlier, later, Relation::Arbitration).unwrap());
                }
            }
        }
    }
}

#[test]
fn reading_only_the_past_never_cycles() {
    for seed in SEEDS {
        let h = random_history(seed, 4, 6, 4, 3);
        for algorithm in STRATEGIES {
            let report = check(&h, &config(IsolationLevel::ReadCommitted, algorithm)).unwrap();
            assert!(!report.taps.contains(&Tap::CyclicCO), "seed {seed}, {algorithm}");
            assert!(!report.taps.contains(&Tap::ThinAirRead), "seed {seed}, {algorithm}");
            assert!(!report.taps.contains(&Tap::FutureRead), "seed {seed}, {algorithm}");
        }
    }
}
