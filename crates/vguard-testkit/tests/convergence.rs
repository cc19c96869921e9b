//! Multi-peer convergence scenarios on a simulated session.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use proptest::prelude::*;
use vguard_core::{
    EpochMarker, GuardConfig, GuardSignal, NetworkInstant, NotifyTarget, PeerId,
    DEFAULT_SOURCE_PREFIX,
};
use vguard_testkit::{FetchOutcome, SessionOptions, SimulatedSession, SimulationError};

const P1: PeerId = PeerId::new(1);
const P2: PeerId = PeerId::new(2);
const P3: PeerId = PeerId::new(3);
const P4: PeerId = PeerId::new(4);

fn config() -> GuardConfig {
    GuardConfig::new(format!("{DEFAULT_SOURCE_PREFIX}test"))
        .with_notify_target(NotifyTarget::new("version_marker", "show"))
}

fn session_at(clock_ms: i64, remote_ms: i64) -> SimulatedSession {
    let session = SimulatedSession::new(config());
    session.set_clock_ms(clock_ms).unwrap();
    session.set_default_fetch_outcome(FetchOutcome::updated_at(NetworkInstant::from_unix_ms(
        remote_ms,
    )));
    session
}

fn recorded(ms: i64) -> EpochMarker {
    EpochMarker::Recorded(NetworkInstant::from_unix_ms(ms))
}

#[tokio::test]
async fn updated_remote_reaches_every_peer() {
    let mut session = session_at(1000, 1500);

    session.join_and_settle(P1).await.unwrap();
    assert_eq!(session.coordinator(), Some(P1));
    assert_eq!(session.latest_marker(), recorded(1000));

    session.join_and_settle(P2).await.unwrap();
    session.join_and_settle(P3).await.unwrap();

    assert_eq!(session.latest_marker(), EpochMarker::Mismatch);
    for peer in [P1, P2, P3] {
        assert!(session.notifications_for(peer) >= 1, "{peer} not notified");
        assert_eq!(session.marker_seen_by(peer), Some(EpochMarker::Mismatch));
    }

    // A late joiner learns of the mismatch without anyone fetching again.
    let fetches_before = session.fetches_issued_by(P1);
    session.join_and_settle(P4).await.unwrap();
    assert_eq!(session.notifications_for(P4), 1);
    assert_eq!(session.fetches_issued_by(P1), fetches_before);
    assert_eq!(session.fetches_issued_by(P4), 0);
    assert_eq!(
        session.notify_targets_for(P4),
        vec![NotifyTarget::new("version_marker", "show")]
    );
}

#[tokio::test]
async fn unchanged_remote_never_notifies() {
    let mut session = session_at(1000, 1000);
    for peer in [P1, P2, P3] {
        session.join_and_settle(peer).await.unwrap();
    }

    assert_eq!(session.latest_marker(), recorded(1000));
    assert_eq!(session.fetches_issued_by(P1), 2);
    for peer in [P1, P2, P3] {
        assert_eq!(session.notifications_for(peer), 0);
    }
}

#[tokio::test]
async fn marker_is_written_once_before_any_mismatch() {
    let mut session = session_at(1000, 400);
    session.join_and_settle(P1).await.unwrap();
    session.advance_clock_ms(5000).unwrap();
    session.join_and_settle(P2).await.unwrap();
    session.join_and_settle(P3).await.unwrap();

    assert_eq!(session.marker_writes(), vec![(P1, recorded(1000))]);
    assert!(session.sync_requests() >= 1);
}

#[tokio::test]
async fn blocked_coordinator_hands_fetch_to_peers() {
    let mut session = session_at(1000, 1500);
    session.set_fetch_outcome(P1, FetchOutcome::unauthorized());

    session.join_and_settle(P1).await.unwrap();
    session.join_and_settle(P2).await.unwrap();

    assert_eq!(session.is_fetch_disabled(P1), Some(true));
    assert_eq!(session.is_fetch_disabled(P2), Some(false));
    assert!(session
        .broadcasts()
        .contains(&(P1, GuardSignal::AttemptFetch)));

    // The successful fetcher takes over and flags the mismatch.
    assert_eq!(session.coordinator(), Some(P2));
    assert_eq!(session.latest_marker(), EpochMarker::Mismatch);
    assert_eq!(session.notifications_for(P1), 1);
    assert_eq!(session.notifications_for(P2), 1);

    // The disabled peer never fetched a second time.
    session.join_and_settle(P3).await.unwrap();
    assert_eq!(session.fetches_issued_by(P1), 1);
}

#[tokio::test]
async fn nobody_reaching_the_source_means_no_mismatch() {
    let mut session = SimulatedSession::new(config());
    session.set_clock_ms(1000).unwrap();
    session.set_default_fetch_outcome(FetchOutcome::unauthorized());

    for peer in [P1, P2, P3] {
        session.join_and_settle(peer).await.unwrap();
    }

    assert_eq!(session.latest_marker(), recorded(1000));
    for peer in [P1, P2, P3] {
        assert_eq!(session.is_fetch_disabled(peer), Some(true));
        assert_eq!(session.notifications_for(peer), 0);
        assert_eq!(session.fetches_issued_by(peer), 1);
    }
}

#[tokio::test]
async fn dispatch_errors_also_delegate() {
    let mut session = session_at(1000, 1500);
    session.set_fetch_outcome(
        P1,
        FetchOutcome::DispatchError {
            code: -1,
            message: "no route".to_string(),
        },
    );

    session.join_and_settle(P1).await.unwrap();
    session.join_and_settle(P2).await.unwrap();

    assert_eq!(session.is_fetch_disabled(P1), Some(true));
    assert_eq!(session.fetches_issued_by(P1), 0);
    assert_eq!(session.coordinator(), Some(P2));
    assert_eq!(session.latest_marker(), EpochMarker::Mismatch);
}

#[tokio::test]
async fn hanging_fetch_is_retried_on_next_join() {
    let mut session = SimulatedSession::new(config());
    session.set_clock_ms(1000).unwrap();
    session.set_default_fetch_outcome(FetchOutcome::Hang);

    session.join_and_settle(P1).await.unwrap();
    session.join_and_settle(P2).await.unwrap();
    assert_eq!(session.fetches_issued_by(P1), 1);
    assert_eq!(session.is_fetch_disabled(P1), Some(false));

    session.join_and_settle(P3).await.unwrap();
    assert_eq!(session.fetches_issued_by(P1), 2);
    assert_eq!(session.latest_marker(), recorded(1000));
}

#[tokio::test]
async fn successor_coordinator_keeps_the_recorded_instant() {
    let mut session = session_at(1000, 500);
    session.join_and_settle(P1).await.unwrap();
    session.join_and_settle(P2).await.unwrap();

    assert_eq!(session.depart(P1).unwrap(), Some(P2));
    assert_eq!(session.coordinator(), Some(P2));
    assert_eq!(session.marker_seen_by(P2), Some(recorded(1000)));

    session.advance_clock_ms(10_000).unwrap();
    session.set_default_fetch_outcome(FetchOutcome::updated_at(NetworkInstant::from_unix_ms(
        2000,
    )));
    session.join_and_settle(P3).await.unwrap();

    assert_eq!(session.latest_marker(), EpochMarker::Mismatch);
    assert_eq!(session.notifications_for(P2), 1);
    assert_eq!(session.notifications_for(P3), 1);
    assert_eq!(session.peers(), vec![P2, P3]);
}

#[tokio::test]
async fn departed_peers_receive_nothing() {
    let mut session = session_at(1000, 1500);
    session.join(P1).unwrap();
    session.join(P2).unwrap();
    session.depart(P2).unwrap();
    session.run_until_quiet().await.unwrap();

    assert_eq!(session.notifications_for(P2), 0);
    assert!(session.guard(P2).is_none());
    assert_eq!(session.marker_seen_by(P2), None);
}

#[tokio::test]
async fn membership_errors_are_reported() {
    let mut session = SimulatedSession::new(config());
    session.join(P1).unwrap();
    assert_eq!(
        session.join(P1),
        Err(SimulationError::DuplicatePeer { peer: P1 })
    );
    assert_eq!(
        session.depart(P2),
        Err(SimulationError::UnknownPeer { peer: P2 })
    );
}

#[test]
fn clock_refuses_out_of_range_readings() {
    let session = SimulatedSession::new(config());
    session.set_clock_ms(1).unwrap();

    assert_eq!(
        session.advance_clock_ms(i64::MAX),
        Err(SimulationError::ClockOverflow {
            now_ms: 1,
            advance_ms: i64::MAX,
        })
    );
    assert_eq!(
        session.set_clock_ms(i64::MIN),
        Err(SimulationError::ClockOutOfRange { ms: i64::MIN })
    );
    assert_eq!(
        session.advance_clock_ms(499),
        Ok(NetworkInstant::from_unix_ms(500))
    );
}

#[tokio::test]
async fn step_limit_is_enforced() {
    let options = SessionOptions {
        seed: None,
        max_steps: 2,
    };
    let mut session = SimulatedSession::with_options(config(), options);
    session.set_clock_ms(1000).unwrap();
    session.join(P1).unwrap();
    session.join(P2).unwrap();
    session.join(P3).unwrap();

    assert!(matches!(
        session.run_until_quiet().await,
        Err(SimulationError::StepLimitExceeded { steps: 2 })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn unordered_delivery_converges(
        peers in 2u32..6,
        seed in any::<u64>(),
        delta_ms in -500i64..500,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let options = SessionOptions { seed: Some(seed), ..SessionOptions::default() };
            let mut session = SimulatedSession::with_options(config(), options);
            session.set_clock_ms(1000).unwrap();
            session.set_default_fetch_outcome(FetchOutcome::updated_at(
                NetworkInstant::from_unix_ms(1000 + delta_ms),
            ));

            let roster: Vec<PeerId> = (1..=peers).map(PeerId::new).collect();
            for peer in &roster {
                session.join(*peer).unwrap();
            }
            session.run_until_quiet().await.unwrap();

            let expected = if delta_ms > 0 { EpochMarker::Mismatch } else { recorded(1000) };
            prop_assert_eq!(session.latest_marker(), expected);
            for peer in &roster {
                prop_assert_eq!(session.marker_seen_by(*peer), Some(expected));
                prop_assert_eq!(session.notifications_for(*peer) > 0, delta_ms > 0);
            }
            Ok(())
        })?;
    }
}

/// Peer capabilities with at least one capable peer, and a join order.
fn mixed_session() -> impl Strategy<Value = (Vec<bool>, Vec<u32>)> {
    (
        prop::collection::vec(any::<bool>(), 2..6),
        any::<prop::sample::Index>(),
    )
        .prop_flat_map(|(mut capable, forced)| {
            let forced = forced.index(capable.len());
            capable[forced] = true;
            let order: Vec<u32> = (1..=capable.len() as u32).collect();
            (Just(capable), Just(order).prop_shuffle())
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn any_capable_peer_is_enough(
        (capable, order) in mixed_session(),
        seed in any::<u64>(),
        settle_each_join in any::<bool>(),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let options = SessionOptions { seed: Some(seed), ..SessionOptions::default() };
            let mut session = SimulatedSession::with_options(config(), options);
            session.set_clock_ms(1000).unwrap();
            session.set_default_fetch_outcome(FetchOutcome::unauthorized());
            for (index, can_fetch) in capable.iter().enumerate() {
                if *can_fetch {
                    session.set_fetch_outcome(
                        PeerId::new(index as u32 + 1),
                        FetchOutcome::updated_at(NetworkInstant::from_unix_ms(1500)),
                    );
                }
            }

            for raw in &order {
                session.join(PeerId::new(*raw)).unwrap();
                if settle_each_join {
                    session.run_until_quiet().await.unwrap();
                }
            }
            session.run_until_quiet().await.unwrap();

            prop_assert_eq!(session.latest_marker(), EpochMarker::Mismatch);
            for raw in &order {
                let peer = PeerId::new(*raw);
                prop_assert_eq!(session.marker_seen_by(peer), Some(EpochMarker::Mismatch));
                prop_assert!(session.notifications_for(peer) > 0, "{} not notified", peer);
            }
            Ok(())
        })?;
    }
}
