mod controller;
mod metering;

pub use {
    controller::{
        ControllerOptions, PlaybackOutcome, RecordingController, RecordingMode, StartOutcome,
        StopOutcome, TtsAudio, format_duration,
    },
    metering::MeteringWindow,
};
