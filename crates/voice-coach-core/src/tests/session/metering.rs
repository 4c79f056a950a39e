use crate::MeteringWindow;

/// WHAT: Window always holds exactly 20 levels
/// WHY: The waveform display renders a fixed number of bars
#[test]
fn given_new_window_when_pushing_many_levels_then_length_stays_twenty() {
    // Given: A fresh window
    let mut window = MeteringWindow::new();
    assert_eq!(window.len(), 20);

    // When: Pushing far more levels than the window holds
    for i in 0..100 {
        window.push(i as f32 / 100.0);
        // Then: Length never deviates
        assert_eq!(window.len(), 20);
    }
}

/// WHAT: Each push drops the oldest level and appends the newest
/// WHY: The window is a sliding FIFO, not an accumulating buffer
#[test]
fn given_full_window_when_pushing_then_oldest_dropped_newest_appended() {
    // Given: A window filled with 20 distinct values
    let mut window = MeteringWindow::new();
    for i in 0..20 {
        window.push(i as f32 / 20.0);
    }

    // When: Pushing one more value
    window.push(1.0);

    // Then: The oldest (0.0) is gone, the rest shifted, newest at the end
    let levels: Vec<f32> = window.levels().collect();
    assert_eq!(levels.len(), 20);
    assert!((levels[0] - 1.0 / 20.0).abs() < f32::EPSILON);
    assert!((levels[19] - 1.0).abs() < f32::EPSILON);
}

/// WHAT: Decibel normalization maps [-60, 0] dB onto [0, 1]
/// WHY: Raw metering is in dBFS; the display needs normalized bar heights
#[test]
fn given_db_readings_when_normalizing_then_mapped_and_clamped() {
    assert!((MeteringWindow::normalize_db(-60.0) - 0.0).abs() < f32::EPSILON);
    assert!((MeteringWindow::normalize_db(-30.0) - 0.5).abs() < f32::EPSILON);
    assert!((MeteringWindow::normalize_db(0.0) - 1.0).abs() < f32::EPSILON);

    // Out-of-range readings clamp instead of escaping [0, 1]
    assert!((MeteringWindow::normalize_db(10.0) - 1.0).abs() < f32::EPSILON);
    assert!((MeteringWindow::normalize_db(-120.0) - 0.0).abs() < f32::EPSILON);
}

/// WHAT: Pushed levels are clamped to [0, 1]
/// WHY: Callers must not be able to corrupt the display range
#[test]
fn given_out_of_range_level_when_pushing_then_clamped() {
    let mut window = MeteringWindow::new();

    window.push(2.5);
    let last = window.levels().last();
    assert_eq!(last, Some(1.0));

    window.push(-3.0);
    let last = window.levels().last();
    assert_eq!(last, Some(0.0));
}

/// WHAT: Reset restores the resting baseline in every slot
/// WHY: Stopping a recording clears the waveform back to its idle look
#[test]
fn given_populated_window_when_reset_then_all_baseline() {
    let mut window = MeteringWindow::new();
    for _ in 0..20 {
        window.push(0.9);
    }

    window.reset();

    assert_eq!(window.len(), 20);
    assert!(window.levels().all(|level| (level - 0.1).abs() < f32::EPSILON));
}
