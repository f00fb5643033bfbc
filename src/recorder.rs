//! Background recording of the video stream.

use std::{
    fs,
    panic::resume_unwind,
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Context;
use crossbeam::channel::{self, Sender};

use crate::frame::Frame;
use crate::video::FrameSlot;

/// Default directory recordings are stored in.
pub const VIDEOS_DIR: &str = "videos";

/// Rate at which the recorder samples the frame slot.
pub const RECORDING_FPS: u32 = 30;

/// Destination of recorded frames.
pub trait FrameSink: Send {
    fn write(&mut self, frame: &Frame) -> anyhow::Result<()>;

    /// Finalizes the recording. Called once after the last frame has been written.
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes frames as numbered JPEG files into a fresh directory.
///
/// The directory is named after the local time the recording started, eg.
/// `videos/video_24-05-2023_14-03-59/`, and contains `frame_000000.jpg`, `frame_000001.jpg`, and
/// so on. It can be replayed with [`ImageSequence`](crate::video::ImageSequence).
pub struct ImageDirSink {
    dir: PathBuf,
    frames: u64,
}

impl ImageDirSink {
    /// Creates a new recording directory inside `root`.
    pub fn create<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let name = chrono::Local::now()
            .format("video_%d-%m-%Y_%H-%M-%S")
            .to_string();
        Self::create_named(root.as_ref().join(name))
    }

    fn create_named(dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create recording directory '{}'", dir.display()))?;
        Ok(Self { dir, frames: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for ImageDirSink {
    fn write(&mut self, frame: &Frame) -> anyhow::Result<()> {
        let path = self.dir.join(format!("frame_{:06}.jpg", self.frames));
        frame.save(path)?;
        self.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        log::info!(
            "recorded {} frames to '{}'",
            self.frames,
            self.dir.display()
        );
        Ok(())
    }
}

/// A background thread sampling a [`FrameSlot`] at a fixed rate and writing the frames to a
/// [`FrameSink`].
///
/// The recorder runs independently of the control loop. It is stopped by [`Recorder::stop`] or by
/// dropping it; both wait for the thread to finalize the sink.
pub struct Recorder {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<anyhow::Result<u64>>>,
}

impl Recorder {
    /// Starts recording at [`RECORDING_FPS`].
    pub fn start<S: FrameSink + 'static>(slot: Arc<FrameSlot>, sink: S) -> anyhow::Result<Self> {
        Self::with_interval(slot, sink, Duration::from_secs(1) / RECORDING_FPS)
    }

    /// Starts recording, sampling the slot once every `interval`.
    pub fn with_interval<S: FrameSink + 'static>(
        slot: Arc<FrameSlot>,
        mut sink: S,
        interval: Duration,
    ) -> anyhow::Result<Self> {
        let (stop_sender, stop) = channel::bounded::<()>(0);
        let ticker = channel::tick(interval);

        let handle = thread::Builder::new()
            .name("recorder".into())
            .spawn(move || -> anyhow::Result<u64> {
                log::trace!("recorder starting");
                let mut frames = 0;
                let res = loop {
                    let stopped = crossbeam::select! {
                        recv(stop) -> _ => true,
                        recv(ticker) -> _ => false,
                    };
                    if stopped {
                        break Ok(());
                    }

                    // Nothing to record before the stream delivers its first frame.
                    let Some(frame) = slot.latest() else { continue };
                    if let Err(e) = sink.write(&frame) {
                        break Err(e);
                    }
                    frames += 1;
                };
                log::trace!("recorder exiting after {frames} frames");

                let finished = sink.finish();
                res.and(finished)?;
                Ok(frames)
            })
            .context("failed to spawn recorder thread")?;

        Ok(Self {
            stop: Some(stop_sender),
            handle: Some(handle),
        })
    }

    /// Stops recording and waits for the sink to be finalized.
    ///
    /// Returns the number of recorded frames.
    pub fn stop(mut self) -> anyhow::Result<u64> {
        self.stop_impl().unwrap_or(Ok(0))
    }

    fn stop_impl(&mut self) -> Option<anyhow::Result<u64>> {
        drop(self.stop.take());

        let handle = self.handle.take()?;
        match handle.join() {
            Ok(res) => Some(res),
            Err(payload) => {
                if !thread::panicking() {
                    resume_unwind(payload);
                }
                None
            }
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(Err(e)) = self.stop_impl() {
            log::error!("recording failed: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::test::temp_dir;

    #[derive(Clone, Default)]
    struct CountingSink {
        written: Arc<Mutex<u64>>,
        finished: Arc<Mutex<bool>>,
    }

    impl FrameSink for CountingSink {
        fn write(&mut self, _: &Frame) -> anyhow::Result<()> {
            *self.written.lock().unwrap() += 1;
            Ok(())
        }

        fn finish(&mut self) -> anyhow::Result<()> {
            *self.finished.lock().unwrap() = true;
            Ok(())
        }
    }

    struct FailingSink;

    impl FrameSink for FailingSink {
        fn write(&mut self, _: &Frame) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn records_until_stopped() {
        let slot = FrameSlot::new();
        slot.publish(Frame::new(4, 4));

        let sink = CountingSink::default();
        let recorder =
            Recorder::with_interval(slot, sink.clone(), Duration::from_millis(2)).unwrap();
        thread::sleep(Duration::from_millis(50));
        let frames = recorder.stop().unwrap();

        assert!(frames > 0);
        assert_eq!(*sink.written.lock().unwrap(), frames);
        assert!(*sink.finished.lock().unwrap());
    }

    #[test]
    fn waits_for_first_frame() {
        let sink = CountingSink::default();
        let recorder =
            Recorder::with_interval(FrameSlot::new(), sink.clone(), Duration::from_millis(1))
                .unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(recorder.stop().unwrap(), 0);
        assert!(*sink.finished.lock().unwrap());
    }

    #[test]
    fn sink_errors_stop_recording() {
        let slot = FrameSlot::new();
        slot.publish(Frame::new(4, 4));
        let recorder =
            Recorder::with_interval(slot, FailingSink, Duration::from_millis(1)).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert!(recorder.stop().is_err());
    }

    #[test]
    fn image_dir_sink_numbers_frames() {
        let dir = temp_dir("recorder-sink");
        let mut sink = ImageDirSink::create(dir.path()).unwrap();
        assert!(sink
            .dir()
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.starts_with("video_")));

        sink.write(&Frame::new(8, 8)).unwrap();
        sink.write(&Frame::new(8, 8)).unwrap();
        sink.finish().unwrap();

        assert!(sink.dir().join("frame_000000.jpg").is_file());
        assert!(sink.dir().join("frame_000001.jpg").is_file());
    }
}
