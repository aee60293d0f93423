use proptest::prelude::*;
use screener::machine::{Action, Event, ScreeningMachine};
use screener::{BatchOutcome, ScreenerConfig, ScreeningPhase, ScreeningState};
use screener_mock::fixtures;

fn published(actions: Vec<Action>) -> Vec<ScreeningState> {
    actions
        .into_iter()
        .filter_map(|a| match a {
            Action::Publish(s) => Some(*s),
            _ => None,
        })
        .collect()
}

// Drive the machine through one run: each entry is (records in round,
// processed after round). The last round reports no more data.
fn drive(total: u64, rounds: &[(usize, u64)]) -> (Vec<ScreeningState>, usize) {
    let mut m = ScreeningMachine::new(&ScreenerConfig::default());
    let mut states = published(m.start("2024-03-08").expect("valid date"));
    let run_id = m.current_run_id().expect("run");
    let mut fetches = 0;
    for (i, (n, processed)) in rounds.iter().enumerate() {
        let more = i + 1 < rounds.len();
        let actions = m.handle(Event::RoundFinished {
            run_id,
            outcome: fixtures::batch(fixtures::synthetic_batch(&format!("R{i}-"), *n), *processed, total, more),
        });
        states.extend(published(actions));
        if more {
            let next = m.handle(Event::DeferralElapsed { run_id });
            fetches += next
                .iter()
                .filter(|a| matches!(a, Action::FetchBatch { .. }))
                .count();
        }
    }
    (states, fetches)
}

proptest! {
    #[test]
    fn progress_is_monotonic_and_hits_100_only_at_completion(
        total in 1u64..2_000,
        raw in prop::collection::vec((0usize..6, 0u64..2_000), 1..15),
    ) {
        // Processed counts are cumulative on the wire.
        let mut acc = 0;
        let rounds: Vec<(usize, u64)> = raw
            .into_iter()
            .map(|(n, step)| { acc = (acc + step).min(total); (n, acc) })
            .collect();

        let (states, fetches) = drive(total, &rounds);
        let pct: Vec<u8> = states.iter().map(|s| s.progress.percentage).collect();
        prop_assert!(pct.windows(2).all(|w| w[0] <= w[1]));

        let (last, earlier) = states.split_last().expect("states");
        prop_assert_eq!(last.phase, ScreeningPhase::Completed);
        prop_assert_eq!(last.progress.percentage, 100);
        prop_assert!(earlier.iter().all(|s| s.progress.percentage < 100));
        prop_assert!(earlier.iter().all(|s| s.phase == ScreeningPhase::Running));

        let expected: usize = rounds.iter().map(|(n, _)| n).sum();
        prop_assert_eq!(last.results.len(), expected);
        prop_assert_eq!(fetches, rounds.len() - 1);
    }
}

#[test]
fn failed_round_is_terminal_for_the_run() {
    let mut m = ScreeningMachine::new(&ScreenerConfig::default());
    m.start("2024-03-08").expect("valid date");
    let actions = m.handle(Event::RoundFinished {
        run_id: 1,
        outcome: BatchOutcome::Failed(screener::ScreenerError::Network("reset".into())),
    });
    assert!(actions.contains(&Action::Finish { run_id: 1 }));
    assert!(m.handle(Event::DeferralElapsed { run_id: 1 }).is_empty());
    assert_eq!(m.phase(), ScreeningPhase::Failed);
}
