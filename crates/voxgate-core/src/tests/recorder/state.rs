use crate::{
    RecorderState, SessionToken, Transition,
    recorder::state::SharedState,
};

fn started(shared: &SharedState) -> SessionToken {
    let mut record = shared.lock();
    record.token = record.token.next();
    record.state = RecorderState::Started;
    record.token
}

/// WHAT: Stopping a stopped record is ignored
/// WHY: Stop must be idempotent
#[test]
fn given_stopped_record_when_requesting_stop_then_ignored() {
    // Given: A fresh record
    let shared = SharedState::new();

    // When: Requesting stop
    let transition = shared.request_stop(false);

    // Then: Ignored, still stopped
    assert_eq!(transition, Transition::Ignored);
    assert_eq!(shared.snapshot().state, RecorderState::Stopped);
}

/// WHAT: Frames are only wanted once the session has activated upload
/// WHY: Frames forwarded before the flush completes would be discarded anyway
#[test]
fn given_started_session_when_activating_upload_then_streaming_token_exposed() {
    // Given: A started session
    let shared = SharedState::new();
    let token = started(&shared);
    assert_eq!(shared.streaming_token(), None);

    // When: The session activates upload
    let activated = shared.activate_upload(token);

    // Then: Its token is exposed to the capture side
    assert!(activated);
    assert_eq!(shared.streaming_token(), Some(token));
    assert!(shared.is_live(token));
}

/// WHAT: A session stopped before activating cannot activate
/// WHY: A stop between start and flush must not resurrect streaming
#[test]
fn given_stopped_before_activation_when_activating_then_refused() {
    // Given: A session that was stopped straight away
    let shared = SharedState::new();
    let token = started(&shared);
    assert_eq!(shared.request_stop(false), Transition::Applied);

    // When: The session tries to activate
    let activated = shared.activate_upload(token);

    // Then: Refused, nothing streams
    assert!(!activated);
    assert_eq!(shared.streaming_token(), None);
}

/// WHAT: A finished old session leaves a newer session running
/// WHY: Teardown of session N must not stop session N+1
#[test]
fn given_newer_session_when_old_session_finishes_then_newer_keeps_running() {
    // Given: Session 1 stopped, session 2 started
    let shared = SharedState::new();
    let old = started(&shared);
    shared.request_stop(false);
    let new = started(&shared);

    // When: Session 1 finishes its teardown
    shared.finish(old);

    // Then: Session 2 is untouched
    assert_eq!(shared.snapshot().state, RecorderState::Started);
    assert!(shared.is_live(new));
    assert!(!shared.is_live(old));
}

/// WHAT: An aborting session forces the state back to stopped
/// WHY: A failed upstream must not leave the recorder stuck in Started
#[test]
fn given_running_session_when_finishing_itself_then_stopped() {
    // Given: A running session
    let shared = SharedState::new();
    let token = started(&shared);
    shared.activate_upload(token);

    // When: It finishes without a stop request
    let suspended = shared.finish(token);

    // Then: Stopped, nothing streams, no suspend was pending
    assert!(!suspended);
    assert_eq!(shared.snapshot().state, RecorderState::Stopped);
    assert_eq!(shared.streaming_token(), None);
}

/// WHAT: The suspend flag is consumed once
/// WHY: A suspend applies to one teardown only
#[test]
fn given_suspend_request_when_finishing_twice_then_flag_taken_once() {
    // Given: A suspended session
    let shared = SharedState::new();
    let token = started(&shared);
    assert_eq!(shared.request_stop(true), Transition::Applied);

    // When: Finishing twice
    let first = shared.finish(token);
    let second = shared.finish(token);

    // Then: Only the first sees the suspend
    assert!(first);
    assert!(!second);
}
