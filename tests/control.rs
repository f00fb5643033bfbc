//! End-to-end control cycles through the public API, with fake models and a fake drone.

use std::{path::Path, sync::Arc, time::Duration};

use crossbeam::channel;
use skyfollow::{
    control::{Controller, ModelProvider, TrackerKind, HOVER_BURST},
    detection::{FaceCandidate, FaceInference, ObjectInference, RawDetections},
    frame::Frame,
    recorder::{FrameSink, ImageDirSink},
    resolution::Resolution,
    robot::Robot,
    settings::{HumanTrackingSettings, Settings},
    tracking::VelocityCommand,
    video::{FrameFeeder, FrameSlot, ImageSequence},
    Error,
};

const PERSON: u32 = 0;
const DOG: u32 = 16;

#[derive(Debug, Default)]
struct Drone {
    commands: Vec<VelocityCommand>,
    airborne: bool,
    streaming: bool,
}

impl Robot for Drone {
    fn connect(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn stream_on(&mut self) -> anyhow::Result<()> {
        self.streaming = true;
        Ok(())
    }

    fn stream_off(&mut self) -> anyhow::Result<()> {
        self.streaming = false;
        Ok(())
    }

    fn takeoff(&mut self) -> anyhow::Result<()> {
        self.airborne = true;
        Ok(())
    }

    fn land(&mut self) -> anyhow::Result<()> {
        self.airborne = false;
        Ok(())
    }

    fn send_velocity(&mut self, command: VelocityCommand) -> anyhow::Result<()> {
        anyhow::ensure!(self.airborne || command.is_zero(), "drone is on the ground");
        self.commands.push(command);
        Ok(())
    }
}

struct Models {
    faces: Vec<FaceCandidate>,
    objects: RawDetections,
}

impl ModelProvider for Models {
    fn face_model(&mut self) -> anyhow::Result<Box<dyn FaceInference + Send>> {
        let faces = self.faces.clone();
        Ok(Box::new(move |_: &Frame| -> anyhow::Result<Vec<FaceCandidate>> {
            Ok(faces.clone())
        }))
    }

    fn object_model(
        &mut self,
        _: &Path,
        _: Resolution,
    ) -> anyhow::Result<Box<dyn ObjectInference + Send>> {
        let objects = self.objects.clone();
        Ok(Box::new(move |_: &Frame| -> anyhow::Result<RawDetections> {
            Ok(objects.clone())
        }))
    }
}

fn airborne_controller(models: Models) -> Controller<Arc<FrameSlot>, Drone> {
    skyfollow::init_logger!();

    let slot = FrameSlot::new();
    slot.publish(Frame::new(1280, 720));
    let mut ctrl = Controller::new(slot, Drone::default(), models);
    ctrl.start_flight().unwrap();
    ctrl
}

fn human_settings() -> HumanTrackingSettings {
    HumanTrackingSettings {
        model_path: "models/ssd".into(),
        input_resolution: Resolution::new(320, 320),
        tracking_distance: 300.0,
        tracking_height: 180.0,
        person_height: 180.0,
    }
}

#[test]
fn follows_person_and_ignores_dog() {
    let mut ctrl = airborne_controller(Models {
        faces: Vec::new(),
        objects: RawDetections {
            boxes: vec![[0.25, 0.5, 0.75, 0.75], [0.0, 0.0, 0.3, 0.3]],
            classes: vec![PERSON, DOG],
            scores: vec![0.9, 0.95],
        },
    });
    ctrl.select_mode(TrackerKind::Human, Some(&human_settings()))
        .unwrap();

    // The gate is closed after selecting a mode.
    let out = ctrl.tick().unwrap();
    assert!(out.detected);
    assert!(out.command.is_zero());

    ctrl.set_track_enabled(true);
    let out = ctrl.tick().unwrap();
    // The person is 160px right of center.
    assert_eq!(out.error.x, 160);
    assert_eq!(out.command.yaw, 50);
    // A 360px tall person is further away than 3m.
    assert!(out.error.z > 0);
    assert!(out.command.forward_backward > 0);
    assert_eq!(out.command.left_right, 0);
}

#[test]
fn centered_face_holds_position() {
    let mut ctrl = airborne_controller(Models {
        faces: vec![FaceCandidate::new(0.4375, 0.4375, 0.125, 0.125, 0.99)],
        objects: RawDetections::default(),
    });
    ctrl.select_mode(TrackerKind::Face, None).unwrap();
    ctrl.set_track_enabled(true);

    for _ in 0..3 {
        let out = ctrl.tick().unwrap();
        assert!(out.detected);
        assert!(out.command.is_zero(), "{}", out.command);
    }
}

#[test]
fn circles_around_person() {
    let mut ctrl = airborne_controller(Models {
        faces: Vec::new(),
        objects: RawDetections {
            boxes: vec![[0.25, 0.375, 0.75, 0.625]],
            classes: vec![PERSON],
            scores: vec![0.8],
        },
    });
    ctrl.select_mode(TrackerKind::HumanCircle, Some(&human_settings()))
        .unwrap();
    ctrl.set_track_enabled(true);

    let out = ctrl.tick().unwrap();
    assert!(out.detected);
    // Strafes sideways, keeping the centered person in view.
    assert!(out.command.left_right < 0);
    assert_eq!(out.command.forward_backward, 0);
    assert_eq!(out.command.yaw, 0);
}

#[test]
fn unknown_tracker_is_rejected() {
    let mut ctrl = airborne_controller(Models {
        faces: Vec::new(),
        objects: RawDetections::default(),
    });
    let err = ctrl
        .select_mode_by_name("pose_tracker", &Settings::default())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::NotImplemented(_))
    ));
    assert_eq!(ctrl.mode(), None);
}

#[test]
fn landing_stops_everything() {
    let mut ctrl = airborne_controller(Models {
        faces: Vec::new(),
        objects: RawDetections::default(),
    });
    assert!(ctrl.robot().airborne);
    assert!(ctrl.robot().streaming);
    assert_eq!(ctrl.robot().commands, [HOVER_BURST]);

    ctrl.land().unwrap();
    assert!(!ctrl.robot().airborne);
    assert!(!ctrl.robot().streaming);
    assert_eq!(ctrl.robot().commands.last(), Some(&VelocityCommand::ZERO));
}

#[test]
fn replays_recorded_flight() {
    skyfollow::init_logger!();

    let dir = tempfile::Builder::new()
        .prefix("skyfollow-replay-")
        .tempdir()
        .unwrap();
    let mut sink = ImageDirSink::create(dir.path()).unwrap();
    for _ in 0..4 {
        sink.write(&Frame::new(1280, 720)).unwrap();
    }
    sink.finish().unwrap();

    let sequence = ImageSequence::open(sink.dir()).unwrap();
    assert_eq!(sequence.len(), 4);
    let feeder = FrameFeeder::spawn(sequence, Duration::from_millis(1)).unwrap();

    let models = Models {
        // Far right, so the drone turns clockwise.
        faces: vec![FaceCandidate::new(0.75, 0.4375, 0.125, 0.125, 0.9)],
        objects: RawDetections::default(),
    };
    let mut drone = Drone::default();
    drone.takeoff().unwrap();
    let mut ctrl = Controller::new(feeder, drone, models);
    ctrl.select_mode(TrackerKind::Face, None).unwrap();
    ctrl.set_track_enabled(true);

    let (stop_sender, stop) = channel::bounded(1);
    let mut cycles = 0;
    ctrl.run(200.0, stop, |_, out| {
        cycles += 1;
        assert!(out.detected);
        assert!(out.command.yaw > 0);
        if cycles == 10 {
            stop_sender.send(()).unwrap();
        }
    })
    .unwrap();

    assert_eq!(cycles, 10);
    assert_eq!(ctrl.robot().commands.len(), 10);
}
