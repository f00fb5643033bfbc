//! The control loop orchestrator.
//!
//! A [`Controller`] owns everything that lives across control cycles: the selected detector and
//! tracker pair, the error state threaded between [`Tracker::track`] calls, the track-enabled
//! gate, and the background recorder. Each call to [`Controller::tick`] runs one cycle:
//!
//! ```text
//! latest frame ─> Detector::predict ─> Tracker::track ─> Robot::send_velocity
//!                                           ^      │
//!                                           └──────┘ error state
//! ```
//!
//! Selecting a mode always starts with the gate closed. The drone does not move until the
//! operator calls [`Controller::set_track_enabled`], even if a target is visible already.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use crossbeam::channel::{self, Receiver, TryRecvError};

use crate::detection::{
    ClassLabels, Detector, FaceDetector, FaceInference, HumanDetector, ObjectInference,
};
use crate::error::Error;
use crate::frame::Frame;
use crate::recorder::{ImageDirSink, Recorder};
use crate::resolution::Resolution;
use crate::robot::Robot;
use crate::settings::{HumanTrackingSettings, Settings};
use crate::timer::FpsCounter;
use crate::tracking::{
    CircleConfig, ErrorState, FaceTracker, FaceTrackerConfig, HumanCircler, HumanTracker,
    HumanTrackerConfig, LostTargetYaw, Observation, Tracker, VelocityCommand,
};
use crate::video::VideoSource;

/// Command sent right after takeoff to climb to a comfortable tracking altitude.
pub const HOVER_BURST: VelocityCommand = VelocityCommand::new(0, 0, 35, 0);

/// The rate at which the control loop runs by default.
pub const DEFAULT_RATE_HZ: f64 = 60.0;

/// The available tracking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerKind {
    /// [`FaceDetector`] + [`FaceTracker`].
    Face,
    /// [`HumanDetector`] + [`HumanTracker`].
    Human,
    /// [`HumanDetector`] + [`HumanCircler`].
    HumanCircle,
}

impl TrackerKind {
    pub const ALL: [Self; 3] = [Self::Face, Self::Human, Self::HumanCircle];

    /// Returns the name used to select this mode.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Face => "face_tracker",
            Self::Human => "human_tracker",
            Self::HumanCircle => "human_circle_tracker",
        }
    }

    /// Returns whether this mode needs [`HumanTrackingSettings`].
    pub fn needs_human_settings(&self) -> bool {
        !matches!(self, Self::Face)
    }
}

impl FromStr for TrackerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::NotImplemented(s.to_string()))
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability loading the neural networks used by the detectors.
///
/// Load failures are fatal for the mode selection that triggered them.
pub trait ModelProvider {
    fn face_model(&mut self) -> anyhow::Result<Box<dyn FaceInference + Send>>;

    /// Loads the object detection model at `path`, expecting inputs of `input_resolution`.
    fn object_model(
        &mut self,
        path: &Path,
        input_resolution: Resolution,
    ) -> anyhow::Result<Box<dyn ObjectInference + Send>>;

    /// Returns the class table of the object detection models.
    fn class_labels(&mut self) -> anyhow::Result<ClassLabels> {
        Ok(ClassLabels::coco())
    }
}

struct Mode {
    kind: TrackerKind,
    detector: Box<dyn Detector + Send>,
    tracker: Box<dyn Tracker + Send>,
    error: ErrorState,
}

/// Outcome of a single control cycle.
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub detected: bool,
    /// The frame to show to the operator: the annotated frame in debug mode, the raw camera frame
    /// otherwise.
    pub display_frame: Arc<Frame>,
    /// The command that was sent to the drone.
    pub command: VelocityCommand,
    pub error: ErrorState,
}

/// Drives a [`Robot`] based on what a [`VideoSource`] shows.
pub struct Controller<V, R> {
    video: V,
    robot: R,
    models: Box<dyn ModelProvider + Send>,
    resolution: Resolution,
    lost_target_yaw: LostTargetYaw,
    mode: Option<Mode>,
    track_enabled: bool,
    debug: bool,
    recording_dir: Option<PathBuf>,
    recorder: Option<Recorder>,
}

impl<V: VideoSource, R: Robot> Controller<V, R> {
    pub fn new<M: ModelProvider + Send + 'static>(video: V, robot: R, models: M) -> Self {
        Self {
            video,
            robot,
            models: Box::new(models),
            resolution: Resolution::RES_720P,
            lost_target_yaw: LostTargetYaw::default(),
            mode: None,
            track_enabled: false,
            debug: false,
            recording_dir: None,
            recorder: None,
        }
    }

    /// Sets the resolution of the camera frames. Applies to modes selected afterwards.
    ///
    /// Defaults to 1280x720.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    /// Sets what trackers do when the gate is open but no target is visible. Applies to modes
    /// selected afterwards.
    pub fn set_lost_target_yaw(&mut self, policy: LostTargetYaw) {
        self.lost_target_yaw = policy;
    }

    /// In debug mode, [`TickOutput::display_frame`] is the annotated frame.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Enables recording into `dir` for subsequent flights, or disables it when [`None`].
    pub fn set_recording_dir(&mut self, dir: Option<PathBuf>) {
        self.recording_dir = dir;
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn robot(&self) -> &R {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    /// Returns the currently selected tracking mode.
    pub fn mode(&self) -> Option<TrackerKind> {
        self.mode.as_ref().map(|mode| mode.kind)
    }

    /// Returns the error state that will be passed to the next [`Tracker::track`] call.
    pub fn error_state(&self) -> Option<ErrorState> {
        self.mode.as_ref().map(|mode| mode.error)
    }

    /// Tears down the current mode and selects a new one.
    ///
    /// The human modes need `human` settings and fail with [`Error::MissingSetting`] without
    /// them. On error, no mode is selected. Either way, the gate is closed afterwards.
    pub fn select_mode(
        &mut self,
        kind: TrackerKind,
        human: Option<&HumanTrackingSettings>,
    ) -> anyhow::Result<()> {
        self.mode = None;
        self.set_track_enabled(false);

        let (detector, tracker) = self.build(kind, human)?;
        log::info!("selected {kind}");
        self.mode = Some(Mode {
            kind,
            detector,
            tracker,
            error: ErrorState::ZERO,
        });
        Ok(())
    }

    /// Selects a mode by its name, taking human tracking parameters from `settings` if needed.
    ///
    /// Fails with [`Error::NotImplemented`] if `name` is not a known tracker.
    pub fn select_mode_by_name(&mut self, name: &str, settings: &Settings) -> anyhow::Result<()> {
        let kind = name.parse::<TrackerKind>()?;
        if kind.needs_human_settings() {
            let human = HumanTrackingSettings::from_settings(settings)?;
            self.select_mode(kind, Some(&human))
        } else {
            self.select_mode(kind, None)
        }
    }

    fn build(
        &mut self,
        kind: TrackerKind,
        human: Option<&HumanTrackingSettings>,
    ) -> anyhow::Result<(Box<dyn Detector + Send>, Box<dyn Tracker + Send>)> {
        if kind == TrackerKind::Face {
            let detector = FaceDetector::from_boxed(self.models.face_model()?);
            let tracker = FaceTracker::new(FaceTrackerConfig {
                resolution: self.resolution,
                lost_target_yaw: self.lost_target_yaw,
                ..FaceTrackerConfig::default()
            });
            return Ok((Box::new(detector), Box::new(tracker)));
        }

        let human = human.ok_or(Error::MissingSetting("selected_object_detection_model"))?;
        let inference = self
            .models
            .object_model(&human.model_path, human.input_resolution)
            .with_context(|| {
                format!(
                    "failed to load object detection model '{}'",
                    human.model_path.display()
                )
            })?;
        let labels = self.models.class_labels()?;
        let detector = HumanDetector::from_boxed(inference, &labels, human.input_resolution)?;

        let tracker: Box<dyn Tracker + Send> = match kind {
            TrackerKind::Human => {
                let mut config = HumanTrackerConfig::new(
                    human.tracking_distance,
                    human.tracking_height,
                    human.person_height,
                );
                config.resolution = self.resolution;
                config.camera.image_height_px = self.resolution.height();
                config.lost_target_yaw = self.lost_target_yaw;
                Box::new(HumanTracker::new(config))
            }
            _ => Box::new(HumanCircler::new(CircleConfig {
                resolution: self.resolution,
                // The orbit radius is in meters.
                target_distance: human.tracking_distance / 100.0,
                ..CircleConfig::default()
            })),
        };

        Ok((Box::new(detector), tracker))
    }

    /// Opens or closes the track-enabled gate.
    pub fn set_track_enabled(&mut self, enabled: bool) {
        if enabled != self.track_enabled {
            log::info!("tracking {}", if enabled { "enabled" } else { "disabled" });
        }
        self.track_enabled = enabled;
    }

    pub fn track_enabled(&self) -> bool {
        self.track_enabled
    }

    /// Runs one control cycle.
    ///
    /// Fails with [`Error::NoMode`] if no mode is selected, and with the capability's error if
    /// the video source, the detector, or the robot fails. The error state is advanced before the
    /// command is sent.
    pub fn tick(&mut self) -> anyhow::Result<TickOutput> {
        let mode = self.mode.as_mut().ok_or(Error::NoMode)?;
        let frame = self.video.read_latest_frame()?;

        let result = mode.detector.predict(&frame)?;
        let observation = Observation::from(&result);
        let out = mode
            .tracker
            .track(&observation, mode.error, self.track_enabled);
        log::trace!("{observation:?} -> {out:?}");

        mode.error = out.error;
        self.robot.send_velocity(out.command)?;

        let display_frame = if self.debug {
            Arc::new(result.into_annotated_frame())
        } else {
            frame
        };
        Ok(TickOutput {
            detected: observation.detected,
            display_frame,
            command: out.command,
            error: out.error,
        })
    }

    /// Tears down the current mode and stops the drone.
    pub fn stop_tracking(&mut self) -> anyhow::Result<()> {
        if let Some(mode) = self.mode.take() {
            log::info!("stopped {}", mode.kind);
        }
        self.set_track_enabled(false);
        self.robot.send_velocity(VelocityCommand::ZERO)
    }

    /// Connects to the drone, starts the video stream (and the recorder, if enabled), takes off,
    /// and climbs to tracking altitude.
    pub fn start_flight(&mut self) -> anyhow::Result<()> {
        log::info!("starting flight");
        self.robot.connect()?;
        self.robot.stream_on()?;

        if let Some(dir) = self.recording_dir.clone() {
            // A broken recorder must not keep the drone on the ground.
            if let Err(e) = self.start_recording(&dir) {
                log::error!("failed to start recording: {e:#}");
            }
        }

        self.robot.takeoff()?;
        self.robot.send_velocity(HOVER_BURST)
    }

    fn start_recording(&mut self, dir: &Path) -> anyhow::Result<()> {
        let slot = self
            .video
            .frame_slot()
            .context("video source does not support recording")?;
        let sink = ImageDirSink::create(dir)?;
        log::info!("recording to '{}'", sink.dir().display());
        self.recorder = Some(Recorder::start(slot, sink)?);
        Ok(())
    }

    /// Stops the drone, the recorder and the video stream, and lands.
    ///
    /// Landing is attempted even if stopping fails; the first error is returned.
    pub fn land(&mut self) -> anyhow::Result<()> {
        log::info!("landing");
        self.set_track_enabled(false);
        let stopped = self.robot.send_velocity(VelocityCommand::ZERO);

        if let Some(recorder) = self.recorder.take() {
            match recorder.stop() {
                Ok(frames) => log::debug!("recorder stopped after {frames} frames"),
                Err(e) => log::error!("recording failed: {e:#}"),
            }
        }

        let stream = self.robot.stream_off();
        let landed = self.robot.land();
        stopped.and(stream).and(landed)
    }

    /// Runs the control loop at `rate_hz` until `stop` receives a message or is disconnected.
    ///
    /// `on_frame` is invoked after every successful cycle and may reconfigure the controller (eg.
    /// open the gate or switch modes). Failed cycles are logged and skipped.
    pub fn run<F>(&mut self, rate_hz: f64, stop: Receiver<()>, mut on_frame: F) -> anyhow::Result<()>
    where
        F: FnMut(&mut Self, &TickOutput),
    {
        if !(rate_hz > 0.0) || !rate_hz.is_finite() {
            anyhow::bail!("invalid control loop rate {rate_hz}Hz");
        }

        let ticker = channel::tick(Duration::from_secs_f64(1.0 / rate_hz));
        let mut fps = FpsCounter::new("control loop");
        log::info!("control loop running at {rate_hz}Hz");

        loop {
            // A pending stop wins over a ready tick.
            let stopped = crossbeam::select! {
                recv(stop) -> _ => true,
                recv(ticker) -> _ => !matches!(stop.try_recv(), Err(TryRecvError::Empty)),
            };
            if stopped {
                break;
            }

            match self.tick() {
                Ok(out) => {
                    match &self.mode {
                        Some(mode) => fps.tick_with(mode.detector.timers()),
                        None => fps.tick(),
                    };
                    on_frame(&mut *self, &out);
                }
                Err(e) => match e.downcast_ref::<Error>() {
                    Some(Error::NoMode) => log::trace!("no mode selected, skipping cycle"),
                    _ => log::error!("control cycle failed: {e:#}"),
                },
            }
        }

        log::info!("control loop stopped");
        Ok(())
    }
}
