use crate::{
    SessionOutcome, SessionToken,
    tests::support::{RecordingUpstream, UpstreamEvent, WAIT_BUDGET, recorder_with, wait_until},
};

use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

const FRAME: [u8; 32] = [3u8; 32];

/// WHAT: Frames queued before a start are flushed, not relayed
/// WHY: Audio from before the hotword must never reach the upstream
#[test]
#[allow(clippy::unwrap_used)]
fn given_stale_backlog_when_session_starts_then_flushed() {
    // Given: Three frames queued while no session ran
    let upstream = Arc::new(RecordingUpstream::default());
    let (recorder, mut sender) = recorder_with(&upstream, 16);
    for _ in 0..3 {
        assert!(sender.try_send(SessionToken::default(), &FRAME));
    }

    // When: A session runs and stops
    recorder.start().unwrap();
    assert!(wait_until(WAIT_BUDGET, || recorder.is_upload_active()));
    recorder.stop();
    let report = recorder.join_session().unwrap().unwrap();

    // Then: All three flushed, none sent
    assert_eq!(report.flushed, 3);
    assert_eq!(report.relayed, 0);
    assert_eq!(upstream.sends(), 0);
}

/// WHAT: Live frames tagged with an earlier session are discarded
/// WHY: Frames in flight across a restart belong to the previous utterance
#[test]
#[allow(clippy::unwrap_used)]
fn given_live_session_when_old_token_frame_arrives_then_discarded() {
    // Given: A live session
    let upstream = Arc::new(RecordingUpstream::default());
    let (recorder, mut sender) = recorder_with(&upstream, 16);
    recorder.start().unwrap();
    assert!(wait_until(WAIT_BUDGET, || recorder.is_upload_active()));
    let token = recorder.current_token();

    // When: One stale frame then one current frame arrive
    assert!(sender.try_send(SessionToken::default(), &FRAME));
    assert!(sender.try_send(token, &FRAME));
    assert!(wait_until(WAIT_BUDGET, || upstream.sends() == 1));
    recorder.stop();
    let report = recorder.join_session().unwrap().unwrap();

    // Then: Only the current frame was relayed, at full length
    assert_eq!(report.discarded_stale, 1);
    assert_eq!(report.relayed, 1);
    assert!(upstream.events().contains(&UpstreamEvent::Send(32)));
}

/// WHAT: A failing send aborts the session but still closes the utterance
/// WHY: The opened utterance must be ended and the recorder left stopped
#[test]
#[allow(clippy::unwrap_used)]
fn given_send_failure_when_relaying_then_aborted_and_ended() {
    // Given: A live session over an upstream that fails sends
    let upstream = Arc::new(RecordingUpstream::default());
    upstream.fail_send.store(true, Ordering::SeqCst);
    let (recorder, mut sender) = recorder_with(&upstream, 16);
    recorder.start().unwrap();
    assert!(wait_until(WAIT_BUDGET, || recorder.is_upload_active()));

    // When: A frame arrives
    assert!(sender.try_send(recorder.current_token(), &FRAME));
    let report = recorder.join_session().unwrap().unwrap();

    // Then: Aborted, utterance ended, recorder stopped
    assert_eq!(report.outcome, SessionOutcome::Aborted);
    assert_eq!(
        upstream.events(),
        vec![UpstreamEvent::Begin(16_000), UpstreamEvent::End]
    );
    assert_eq!(recorder.state(), crate::RecorderState::Stopped);
}

/// WHAT: Live frames reach the upstream byte for byte, in capture order
/// WHY: The relay must not reorder, truncate or alter audio
#[test]
#[allow(clippy::unwrap_used)]
fn given_distinct_frames_when_relaying_then_delivered_verbatim_in_order() {
    // Given: A live session
    let upstream = Arc::new(RecordingUpstream::default());
    let (recorder, mut sender) = recorder_with(&upstream, 64);
    recorder.start().unwrap();
    assert!(wait_until(WAIT_BUDGET, || recorder.is_upload_active()));
    let token = recorder.current_token();

    // When: Twenty frames, each filled with its own index, are captured
    for i in 0..20u8 {
        assert!(sender.try_send(token, &[i; 32]));
    }
    assert!(wait_until(WAIT_BUDGET, || upstream.frames().len() == 20));
    recorder.stop();
    let report = recorder.join_session().unwrap().unwrap();

    // Then: Exactly those frames, unchanged and in order
    let expected: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i; 32]).collect();
    assert_eq!(upstream.frames(), expected);
    assert_eq!(report.relayed, 20);
}

/// WHAT: A frame dropped because the channel was full never reaches the upstream
/// WHY: Dropped frames are lost, never retried or delivered late
#[test]
#[allow(clippy::unwrap_used)]
fn given_full_channel_when_frame_dropped_then_never_relayed() {
    // Given: A live session over a 2-frame channel whose upstream sends slowly
    let upstream = Arc::new(RecordingUpstream::default());
    *upstream.send_delay.lock().unwrap() = Duration::from_millis(300);
    let (recorder, mut sender) = recorder_with(&upstream, 2);
    recorder.start().unwrap();
    assert!(wait_until(WAIT_BUDGET, || recorder.is_upload_active()));
    let token = recorder.current_token();
    assert!(sender.try_send(token, &[1; 32]));
    assert!(wait_until(WAIT_BUDGET, || upstream.frames().len() == 1));

    // When: The channel fills while the upstream is busy, and a marked frame is refused
    assert!(sender.try_send(token, &[2; 32]));
    assert!(sender.try_send(token, &[3; 32]));
    let marked_accepted = sender.try_send(token, &[0xEE; 32]);
    assert!(wait_until(WAIT_BUDGET, || upstream.frames().len() == 3));
    assert!(sender.try_send(token, &[4; 32]));
    assert!(wait_until(WAIT_BUDGET, || upstream.frames().len() == 4));
    recorder.stop();
    let report = recorder.join_session().unwrap().unwrap();

    // Then: The marked frame was refused and is absent; the rest arrived in order
    assert!(!marked_accepted);
    let frames = upstream.frames();
    assert!(frames.iter().all(|f| !f.contains(&0xEE)));
    assert_eq!(
        frames,
        vec![vec![1u8; 32], vec![2u8; 32], vec![3u8; 32], vec![4u8; 32]]
    );
    assert_eq!(report.relayed, 4);
}
