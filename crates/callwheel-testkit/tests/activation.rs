//! Admission scenarios across the full client.

use std::sync::Arc;

use callwheel::{CallOutcome, ClientError, ResumeOutcome, SessionActivator};
use callwheel_core::{Intent, Round, Username};
use callwheel_rounds::RoundError;
use callwheel_testkit::{peer_names, TestFixture};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_pending_call_answered_after_hang_up() {
    init_tracing();
    let fixture = TestFixture::new(1, 100);
    let alice = Username::from("alice");
    let bob = Username::from("bob");

    assert!(fixture.call("alice").await.unwrap().is_activated());

    // Caller chose epoch start 110, which is intent 3 under the standard syncer.
    let outcome = fixture.receive("bob", Intent(3)).await.unwrap();
    assert_eq!(outcome, CallOutcome::Queued { round: Round(110) });

    let bob_convo = fixture.client.conversation(&bob).unwrap();
    assert_eq!(bob_convo.pending_call().unwrap().convo_round, Round(110));
    assert!(!bob_convo.is_active());

    assert!(fixture.client.hang_up(&alice));
    assert_eq!(fixture.client.answer(&bob), ResumeOutcome::Activated(Round(110)));
    assert_eq!(fixture.client.activator().active_peers(), vec![bob]);
    assert!(bob_convo.pending_call().is_none());
}

#[tokio::test]
async fn test_second_rejection_replaces_pending_call() {
    let fixture = TestFixture::new(1, 100);
    fixture.call("alice").await.unwrap();

    fixture.receive("bob", Intent(3)).await.unwrap();
    let first = fixture
        .client
        .conversation(&Username::from("bob"))
        .unwrap()
        .pending_call()
        .unwrap();

    fixture.rounds.set_round(Round(121));
    fixture.receive("bob", Intent(1)).await.unwrap();
    let second = fixture
        .client
        .conversation(&Username::from("bob"))
        .unwrap()
        .pending_call()
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(second.convo_round, Round(130));
}

#[tokio::test]
async fn test_failed_fetch_leaves_state_unchanged() {
    let fixture = TestFixture::new(1, 100);
    fixture.call("alice").await.unwrap();
    fixture.receive("bob", Intent(3)).await.unwrap();

    let convos_before = fixture.client.conversations().snapshot();
    let active_before = fixture.client.activator().active_peers();

    fixture
        .rounds
        .set_outage(Some(RoundError::Unavailable("coordinator unreachable".into())));

    for peer in ["alice", "bob", "carol"] {
        let err = fixture.call(peer).await.unwrap_err();
        assert!(matches!(err, ClientError::RoundFetch(_)));
        let err = fixture.receive(peer, Intent(0)).await.unwrap_err();
        assert!(matches!(err, ClientError::RoundFetch(_)));
    }

    assert_eq!(fixture.client.conversations().snapshot(), convos_before);
    assert_eq!(fixture.client.activator().active_peers(), active_before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_fill_capacity_exactly() {
    const CAPACITY: usize = 4;

    let fixture = Arc::new(TestFixture::new(CAPACITY, 100));
    let names = peer_names(CAPACITY + 1);

    let tasks: Vec<_> = names
        .iter()
        .cloned()
        .map(|name| {
            let fixture = Arc::clone(&fixture);
            tokio::spawn(async move { fixture.receive(&name, Intent(3)).await })
        })
        .collect();

    let mut activated = 0;
    let mut queued = 0;
    for task in tasks {
        match task.await.unwrap().unwrap() {
            CallOutcome::Activated { .. } => activated += 1,
            CallOutcome::Queued { .. } => queued += 1,
        }
    }

    assert_eq!(activated, CAPACITY);
    assert_eq!(queued, 1);
    assert_eq!(fixture.client.activator().active_count(), CAPACITY);

    let pending = fixture
        .client
        .conversations()
        .snapshot()
        .into_iter()
        .filter(|c| c.pending.is_some())
        .count();
    assert_eq!(pending, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_holds_under_mixed_events() {
    const CAPACITY: usize = 2;

    let fixture = Arc::new(TestFixture::new(CAPACITY, 100));
    let names = peer_names(8);

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let fixture = Arc::clone(&fixture);
            let name = names[i % names.len()].clone();
            tokio::spawn(async move {
                match i % 4 {
                    0 => {
                        fixture.call(&name).await.unwrap();
                    }
                    1 => {
                        fixture.receive(&name, Intent(3)).await.unwrap();
                    }
                    2 => {
                        fixture.client.hang_up(&Username::from(name.as_str()));
                    }
                    _ => {
                        fixture.client.answer(&Username::from(name.as_str()));
                    }
                }
                assert!(fixture.client.activator().active_count() <= CAPACITY);
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let active = fixture.client.activator().active_count();
    assert!(active <= CAPACITY);
    let live = fixture
        .client
        .conversations()
        .snapshot()
        .into_iter()
        .filter(|c| c.active.is_some())
        .count();
    assert_eq!(live, active);
}

#[tokio::test]
async fn test_clients_sharing_activator_share_capacity() {
    let activator = Arc::new(SessionActivator::new(1));
    let first = TestFixture::with_activator(Arc::clone(&activator), 100);
    let second = TestFixture::with_activator(Arc::clone(&activator), 100);

    assert!(first.call("alice").await.unwrap().is_activated());
    assert!(!second.call("bob").await.unwrap().is_activated());
    assert_eq!(activator.active_count(), 1);
}

#[tokio::test]
async fn test_benign_fetch_error_still_reported_on_call() {
    let fixture = TestFixture::new(1, 100);
    fixture
        .rounds
        .fail_next(RoundError::NotConfigured { round: Round(101) });

    let err = fixture.call("bob").await.unwrap_err();
    assert!(err.is_benign());

    // The call handler reports every fetch failure; only `error` filters.
    let warnings = fixture.notifier.warnings_for(&Username::from("bob"));
    assert!(warnings[0].ends_with("round 101 not configured"));

    fixture.client.error(&err);
    assert!(fixture.notifier.main_warnings().is_empty());
}

#[tokio::test]
async fn test_error_filter_by_mode() {
    let benign = ClientError::RoundFetch(RoundError::NotConfigured { round: Round(7) });
    let outage = ClientError::RoundFetch(RoundError::Unavailable("no route".into()));

    let quiet = TestFixture::new(1, 100);
    quiet.client.error(&benign);
    quiet.client.error(&outage);
    quiet.client.debug_error(&outage);
    assert_eq!(quiet.notifier.main_warnings(), vec![outage.to_string()]);

    let mut verbose = TestFixture::new(1, 100);
    verbose.client = verbose.client.with_debug(true);
    verbose.client.error(&benign);
    verbose.client.error(&outage);
    verbose.client.debug_error(&outage);
    assert_eq!(
        verbose.notifier.main_warnings(),
        vec![benign.to_string(), outage.to_string(), outage.to_string()]
    );
}
