use std::sync::Arc;
use std::thread;

use barbot_hardware::SimulatedRelayBoard;
use barbot_traits::RelayDriver;
use rstest::rstest;

#[rstest]
fn relays_switch_independently_across_threads() {
    let relays: Vec<u8> = vec![40, 38, 36, 15, 13, 11, 7, 5, 31, 33];
    let board = Arc::new(SimulatedRelayBoard::new());
    board.initialize(&relays).unwrap();

    let handles: Vec<_> = relays
        .iter()
        .map(|&relay| {
            let board = board.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    board.activate(relay).unwrap();
                    board.deactivate(relay).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(board.energised().is_empty());
    for relay in relays {
        assert_eq!(board.activation_count(relay), 50);
    }
}

#[rstest]
fn initialize_resets_previous_state() {
    let board = SimulatedRelayBoard::new();
    board.initialize(&[21, 23]).unwrap();
    board.activate(21).unwrap();
    board.initialize(&[21, 23]).unwrap();
    assert!(!board.is_on(21));
    assert_eq!(board.activation_count(21), 0);
}

#[rstest]
fn repeated_activation_counts_once() {
    let board = SimulatedRelayBoard::new();
    board.initialize(&[19]).unwrap();
    board.activate(19).unwrap();
    board.activate(19).unwrap();
    assert_eq!(board.activation_count(19), 1);
}
