use crate::{
    ControllerOptions, PlaybackOutcome, RecordingController, RecordingMode, SessionError,
    StartOutcome, StopOutcome, TtsAudio, format_duration, tests::mock_device::MockDevice,
};

use std::path::PathBuf;

fn controller(device: MockDevice) -> RecordingController<MockDevice> {
    RecordingController::new(
        device,
        ControllerOptions {
            server_configured: true,
            has_audio_permission: true,
            recording_dir: PathBuf::from("/tmp/voice-coach-tests"),
        },
    )
}

fn controller_with(
    device: MockDevice,
    server_configured: bool,
    has_audio_permission: bool,
) -> RecordingController<MockDevice> {
    RecordingController::new(
        device,
        ControllerOptions {
            server_configured,
            has_audio_permission,
            recording_dir: PathBuf::from("/tmp/voice-coach-tests"),
        },
    )
}

/// WHAT: Press and hold modes are mutually exclusive
/// WHY: The device records one session at a time; overlapping modes would
/// corrupt the session state
#[test]
#[allow(clippy::unwrap_used)]
fn given_press_recording_when_beginning_hold_then_ignored() {
    // Given: An active press-mode recording
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    assert_eq!(ctl.begin_press().unwrap(), StartOutcome::Started);

    // When: A hold gesture arrives
    let outcome = ctl.begin_hold().unwrap();

    // Then: It is ignored and press stays active; the device saw one start
    assert_eq!(outcome, StartOutcome::Ignored);
    assert_eq!(ctl.mode(), RecordingMode::Press);
    assert_eq!(state.lock().unwrap().start_recorder_calls, 1);
}

/// WHAT: Stop requests are validated against the mode-specific flag
/// WHY: Releasing the hold button must not stop a press-mode recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_press_recording_when_ending_hold_then_noop() {
    // Given: An active press-mode recording
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    ctl.begin_press().unwrap();

    // When: A hold release arrives
    let outcome = ctl.end_hold().unwrap();

    // Then: No-op; still recording in press mode, device never stopped
    assert_eq!(outcome, StopOutcome::Ignored);
    assert_eq!(ctl.mode(), RecordingMode::Press);
    assert_eq!(state.lock().unwrap().stop_recorder_calls, 0);
}

/// WHAT: Stopping with no active recording is a no-op
/// WHY: Release events can arrive after a failed or finished start
#[test]
#[allow(clippy::unwrap_used)]
fn given_idle_controller_when_ending_either_mode_then_noop() {
    let mut ctl = controller(MockDevice::new());

    assert_eq!(ctl.end_press().unwrap(), StopOutcome::Ignored);
    assert_eq!(ctl.end_hold().unwrap(), StopOutcome::Ignored);
    assert_eq!(ctl.mode(), RecordingMode::None);
}

/// WHAT: A failed device start rolls the controller back to idle
/// WHY: The mode flag must never claim "recording" after a device failure
#[test]
#[allow(clippy::unwrap_used)]
fn given_failing_device_when_beginning_press_then_state_rolled_back() {
    // Given: A device scripted to fail on start
    let device = MockDevice::new();
    let state = device.handle();
    state.lock().unwrap().fail_start_recorder = true;
    let mut ctl = controller(device);

    // When: Beginning a press recording
    let result = ctl.begin_press();

    // Then: DeviceFailure, no active mode, and the in-progress guard is
    // cleared so a retry can start
    assert!(matches!(result, Err(SessionError::DeviceFailure { .. })));
    assert_eq!(ctl.mode(), RecordingMode::None);
    assert!(!ctl.is_recording());

    state.lock().unwrap().fail_start_recorder = false;
    assert_eq!(ctl.begin_press().unwrap(), StartOutcome::Started);
}

/// WHAT: Rapid duplicate starts are dropped by the synchronous guard
/// WHY: Gesture events can arrive before the first start settles
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_recording_when_starting_again_then_single_device_start() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);

    assert_eq!(ctl.begin_press().unwrap(), StartOutcome::Started);
    assert_eq!(ctl.begin_press().unwrap(), StartOutcome::Ignored);
    assert_eq!(ctl.begin_hold().unwrap(), StartOutcome::Ignored);

    assert_eq!(state.lock().unwrap().start_recorder_calls, 1);
}

/// WHAT: Recording is refused without a configured server URL
/// WHY: There is nowhere to send the audio; the gesture must fail loudly
#[test]
fn given_no_server_url_when_beginning_then_validation_error() {
    let mut ctl = controller_with(MockDevice::new(), false, true);

    let result = ctl.begin_press();

    assert!(matches!(result, Err(SessionError::ServerUrlNotSet { .. })));
    assert_eq!(ctl.mode(), RecordingMode::None);
}

/// WHAT: Recording is refused without microphone permission
/// WHY: Permission is captured once at mount; there is no re-request flow
#[test]
fn given_denied_permission_when_beginning_then_permission_error() {
    let mut ctl = controller_with(MockDevice::new(), true, false);

    let result = ctl.begin_hold();

    assert!(matches!(result, Err(SessionError::PermissionDenied { .. })));
    assert_eq!(ctl.mode(), RecordingMode::None);
}

/// WHAT: Ending a hold recording hands back the file for auto-submit
/// WHY: Hold mode is record-and-auto-send; no user action may be required
#[test]
#[allow(clippy::unwrap_used, clippy::panic)]
fn given_hold_recording_when_released_then_stopped_with_path() {
    let mut ctl = controller(MockDevice::new());
    ctl.begin_hold().unwrap();

    let outcome = ctl.end_hold().unwrap();

    let StopOutcome::Stopped(path) = outcome else {
        panic!("expected Stopped outcome");
    };
    assert_eq!(ctl.recorded_file(), Some(path.as_path()));
    assert_eq!(ctl.mode(), RecordingMode::None);
}

/// WHAT: Ending a press recording retains the file without submitting
/// WHY: Press mode is record, review, then explicit send
#[test]
#[allow(clippy::unwrap_used)]
fn given_press_recording_when_stopped_then_file_retained() {
    let mut ctl = controller(MockDevice::new());
    ctl.begin_press().unwrap();

    let outcome = ctl.end_press().unwrap();

    assert!(matches!(outcome, StopOutcome::Stopped(_)));
    assert!(ctl.recorded_file().is_some());
    assert!(!ctl.is_recording());
}

/// WHAT: A failed device stop still resets the controller to idle
/// WHY: A stuck "recording" flag would deadlock the whole screen
#[test]
#[allow(clippy::unwrap_used)]
fn given_failing_stop_when_ending_then_error_and_idle() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    ctl.begin_press().unwrap();
    state.lock().unwrap().fail_stop_recorder = true;

    let result = ctl.end_press();

    assert!(matches!(result, Err(SessionError::DeviceFailure { .. })));
    assert_eq!(ctl.mode(), RecordingMode::None);
    assert!(!ctl.is_recording());

    // A new recording can start afterwards
    state.lock().unwrap().fail_stop_recorder = false;
    assert_eq!(ctl.begin_hold().unwrap(), StartOutcome::Started);
}

/// WHAT: Starting a new recording invalidates the previous file
/// WHY: The session owns exactly one reviewable recording at a time
#[test]
#[allow(clippy::unwrap_used)]
fn given_finished_recording_when_starting_again_then_previous_file_cleared() {
    let mut ctl = controller(MockDevice::new());
    ctl.begin_press().unwrap();
    ctl.end_press().unwrap();
    assert!(ctl.recorded_file().is_some());

    ctl.begin_hold().unwrap();

    assert!(ctl.recorded_file().is_none());
}

/// WHAT: Playback of the recording is an idempotent toggle
/// WHY: Play while playing stops first; never two concurrent playbacks
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_toggling_playback_then_start_stop_alternate() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    ctl.begin_press().unwrap();
    ctl.end_press().unwrap();

    assert_eq!(ctl.play_recording().unwrap(), PlaybackOutcome::Started);
    assert!(ctl.is_playing());

    assert_eq!(ctl.play_recording().unwrap(), PlaybackOutcome::Stopped);
    assert!(!ctl.is_playing());
    assert_eq!(state.lock().unwrap().stop_player_calls, 1);
}

/// WHAT: Playback without a recording is a validation failure
/// WHY: There is nothing to play; the user needs a clear message
#[test]
fn given_no_recording_when_playing_then_validation_error() {
    let mut ctl = controller(MockDevice::new());

    let result = ctl.play_recording();

    assert!(matches!(
        result,
        Err(SessionError::NoRecordingAvailable { .. })
    ));
}

/// WHAT: Playback requests during a recording are ignored
/// WHY: The single device cannot record and play simultaneously
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_recording_when_playing_then_ignored() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    ctl.begin_press().unwrap();
    ctl.end_press().unwrap();
    ctl.begin_hold().unwrap();

    // Ignored even though begin_hold cleared the previous file; the
    // recording guard runs before the file lookup
    assert_eq!(ctl.play_recording().unwrap(), PlaybackOutcome::Ignored);
    assert!(state.lock().unwrap().played.is_empty());
}

/// WHAT: A play gesture mid-recording is ignored, never a missing-file error
/// WHY: While recording, playback requests are dropped before any file check
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_in_progress_when_playing_then_ignored_not_error() {
    let mut ctl = controller(MockDevice::new());
    ctl.begin_press().unwrap();

    assert_eq!(ctl.play_recording().unwrap(), PlaybackOutcome::Ignored);
}

/// WHAT: Begin requests during playback are silently dropped
/// WHY: Recording controls are disabled while audio is playing
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_playback_when_beginning_then_ignored() {
    let mut ctl = controller(MockDevice::new());
    ctl.begin_press().unwrap();
    ctl.end_press().unwrap();
    ctl.play_recording().unwrap();

    assert_eq!(ctl.begin_press().unwrap(), StartOutcome::Ignored);
    assert_eq!(ctl.begin_hold().unwrap(), StartOutcome::Ignored);
}

/// WHAT: Begin requests while a submission is in flight are dropped
/// WHY: The controller accepts no new work until processing completes
#[test]
#[allow(clippy::unwrap_used)]
fn given_processing_when_beginning_then_ignored() {
    let mut ctl = controller(MockDevice::new());
    ctl.set_processing(true);

    assert_eq!(ctl.begin_press().unwrap(), StartOutcome::Ignored);

    ctl.set_processing(false);
    assert_eq!(ctl.begin_press().unwrap(), StartOutcome::Started);
}

/// WHAT: Replay with no prior TTS audio is a validation failure
/// WHY: The caller needs an error to surface, not a silent no-op
#[test]
fn given_no_tts_when_replaying_then_validation_error() {
    let mut ctl = controller(MockDevice::new());

    let result = ctl.replay_tts();

    assert!(matches!(result, Err(SessionError::NoTtsAudio { .. })));
}

/// WHAT: Replay restarts the last TTS audio after playback stopped
/// WHY: The TTS URL is intentionally retained across recordings
#[test]
#[allow(clippy::unwrap_used)]
fn given_finished_tts_playback_when_replaying_then_same_audio_played() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);

    let audio = TtsAudio {
        url: "http://example.com:8000/tts/out.wav".to_string(),
        local_path: PathBuf::from("/tmp/voice-coach-tests/tts.wav"),
    };
    assert_eq!(ctl.play_tts(audio.clone()).unwrap(), PlaybackOutcome::Started);

    ctl.playback_finished();
    assert!(!ctl.is_playing());

    assert_eq!(ctl.replay_tts().unwrap(), PlaybackOutcome::Started);
    let played = state.lock().unwrap().played.clone();
    assert_eq!(played, vec![audio.local_path.clone(), audio.local_path]);
}

/// WHAT: TTS playback stops any current playback before starting
/// WHY: Never two concurrent playbacks on the shared device
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_playback_when_playing_tts_then_previous_stopped_first() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    ctl.begin_press().unwrap();
    ctl.end_press().unwrap();
    ctl.play_recording().unwrap();

    let audio = TtsAudio {
        url: "http://example.com:8000/tts/out.wav".to_string(),
        local_path: PathBuf::from("/tmp/voice-coach-tests/tts.wav"),
    };
    assert_eq!(ctl.play_tts(audio).unwrap(), PlaybackOutcome::Started);

    assert_eq!(state.lock().unwrap().stop_player_calls, 1);
    assert!(ctl.is_playing());
}

/// WHAT: TTS audio is retained even when playback fails
/// WHY: Partial failure leaves replay available for a manual retry
#[test]
#[allow(clippy::unwrap_used)]
fn given_failing_player_when_playing_tts_then_audio_retained() {
    let device = MockDevice::new();
    let state = device.handle();
    state.lock().unwrap().fail_start_player = true;
    let mut ctl = controller(device);

    let audio = TtsAudio {
        url: "http://example.com:8000/tts/out.wav".to_string(),
        local_path: PathBuf::from("/tmp/voice-coach-tests/tts.wav"),
    };
    let result = ctl.play_tts(audio.clone());

    assert!(matches!(result, Err(SessionError::DeviceFailure { .. })));
    assert!(!ctl.is_playing());
    assert_eq!(ctl.last_tts(), Some(&audio));
}

/// WHAT: Metering readings are accepted only while recording
/// WHY: Stale device callbacks must not repaint an idle waveform
#[test]
#[allow(clippy::unwrap_used)]
fn given_idle_controller_when_pushing_metering_then_window_unchanged() {
    let mut ctl = controller(MockDevice::new());

    ctl.push_metering_db(0.0);
    assert!(ctl.metering().levels().all(|l| (l - 0.1).abs() < f32::EPSILON));

    ctl.begin_press().unwrap();
    ctl.push_metering_db(0.0);
    let last = ctl.metering().levels().last();
    assert_eq!(last, Some(1.0));
}

/// WHAT: Stopping a recording clears the metering window and duration
/// WHY: The next session starts from a clean display
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_recording_when_inspecting_then_display_state_cleared() {
    let mut ctl = controller(MockDevice::new());
    ctl.begin_press().unwrap();
    ctl.push_metering_db(-10.0);
    ctl.tick();
    ctl.end_press().unwrap();

    assert_eq!(ctl.duration_seconds(), 0);
    assert!(ctl.metering().levels().all(|l| (l - 0.1).abs() < f32::EPSILON));
}

/// WHAT: Device events are drained into controller state
/// WHY: The controller is the sole mutator; callbacks flow through it
#[test]
#[allow(clippy::unwrap_used)]
fn given_device_events_when_polling_then_metering_and_finish_applied() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    ctl.begin_press().unwrap();
    state.lock().unwrap().metering.push(0.0);

    assert!(ctl.poll_device_events().is_none());
    let last = ctl.metering().levels().last();
    assert_eq!(last, Some(1.0));

    ctl.end_press().unwrap();
    ctl.play_recording().unwrap();
    state.lock().unwrap().player_finished = true;

    assert!(ctl.poll_device_events().is_some());
    assert!(!ctl.is_playing());
}

/// WHAT: Teardown releases the device from any state
/// WHY: Screen unmount must never leak a dangling native recorder
#[test]
#[allow(clippy::unwrap_used)]
fn given_active_recording_when_tearing_down_then_device_released() {
    let device = MockDevice::new();
    let state = device.handle();
    let mut ctl = controller(device);
    ctl.begin_hold().unwrap();

    ctl.teardown();

    let state = state.lock().unwrap();
    assert!(!state.recording);
    assert_eq!(state.stop_recorder_calls, 1);
    assert_eq!(state.stop_player_calls, 1);
    drop(state);
    assert_eq!(ctl.mode(), RecordingMode::None);
    assert!(!ctl.is_playing());
}

/// WHAT: Duration formats as MM:SS with zero padding
/// WHY: The timer display expects a fixed-width clock
#[test]
fn given_seconds_when_formatting_then_mm_ss() {
    assert_eq!(format_duration(0), "00:00");
    assert_eq!(format_duration(9), "00:09");
    assert_eq!(format_duration(61), "01:01");
    assert_eq!(format_duration(600), "10:00");
}
