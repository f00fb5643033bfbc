//! Video sources.
//!
//! Frames flow from a producer (the drone's video stream, a directory of images, ...) into a
//! [`FrameSlot`] that only ever holds the most recent frame. Consumers (the control loop and the
//! [`Recorder`](crate::recorder::Recorder)) sample the slot at their own rates: a slow consumer
//! skips frames, a fast one sees the same frame again. Nobody ever waits for anybody, except for
//! the very first frame.

mod sequence;

use std::{
    io,
    panic::resume_unwind,
    sync::{Arc, Condvar, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{self, Sender};

use crate::frame::Frame;

pub use sequence::ImageSequence;

/// A source of video frames.
pub trait VideoSource {
    /// Returns the most recent frame.
    ///
    /// May block until the first frame is available. After that, this returns immediately.
    fn read_latest_frame(&mut self) -> anyhow::Result<Arc<Frame>>;

    /// Returns the slot this source publishes its frames to, if it has one.
    ///
    /// Needed for recording the stream in the background.
    fn frame_slot(&self) -> Option<Arc<FrameSlot>> {
        None
    }
}

/// Holds the most recently published frame.
#[derive(Default)]
pub struct FrameSlot {
    state: Mutex<SlotState>,
    published: Condvar,
}

#[derive(Default)]
struct SlotState {
    frame: Option<Arc<Frame>>,
    closed: bool,
}

impl FrameSlot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replaces the current frame with `frame`.
    pub fn publish(&self, frame: Frame) {
        let mut state = self.state.lock().unwrap();
        state.frame = Some(Arc::new(frame));
        self.published.notify_all();
    }

    /// Marks the stream as ended.
    ///
    /// The last published frame remains available. Threads blocked in
    /// [`FrameSlot::wait_latest`] are woken up.
    pub fn close(&self) {
        self.state.lock().unwrap().closed = true;
        self.published.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Returns the current frame without blocking.
    pub fn latest(&self) -> Option<Arc<Frame>> {
        self.state.lock().unwrap().frame.clone()
    }

    /// Returns the current frame, waiting for the first one to be published if necessary.
    ///
    /// Returns [`None`] if the stream was closed before any frame was published.
    pub fn wait_latest(&self) -> Option<Arc<Frame>> {
        let state = self.state.lock().unwrap();
        let state = self
            .published
            .wait_while(state, |s| s.frame.is_none() && !s.closed)
            .unwrap();
        state.frame.clone()
    }
}

impl VideoSource for Arc<FrameSlot> {
    fn read_latest_frame(&mut self) -> anyhow::Result<Arc<Frame>> {
        self.wait_latest()
            .ok_or_else(|| anyhow::anyhow!("video stream ended before the first frame"))
    }

    fn frame_slot(&self) -> Option<Arc<FrameSlot>> {
        Some(self.clone())
    }
}

/// A background thread feeding frames from an iterator into a [`FrameSlot`].
///
/// When the iterator is exhausted, the slot is closed (keeping the last frame). Dropping the
/// [`FrameFeeder`] stops the thread and waits for it to exit.
pub struct FrameFeeder {
    slot: Arc<FrameSlot>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FrameFeeder {
    /// Spawns a thread that publishes the frames yielded by `frames`.
    ///
    /// After each frame, the thread waits for `interval`. Sources that produce frames in real
    /// time (like a camera stream) block on their own and can use [`Duration::ZERO`].
    pub fn spawn<I>(frames: I, interval: Duration) -> io::Result<Self>
    where
        I: IntoIterator<Item = Frame>,
        I::IntoIter: Send + 'static,
    {
        let slot = FrameSlot::new();
        let (stop_sender, stop) = channel::bounded::<()>(0);
        let frames = frames.into_iter();

        let handle = thread::Builder::new().name("frame feeder".into()).spawn({
            let slot = slot.clone();
            move || {
                log::trace!("frame feeder starting");
                let mut count = 0u64;
                for frame in frames {
                    slot.publish(frame);
                    count += 1;

                    let stopped = crossbeam::select! {
                        recv(stop) -> _ => true,
                        default(interval) => false,
                    };
                    if stopped {
                        log::trace!("frame feeder stopped after {count} frames");
                        return;
                    }
                }

                log::info!("video source exhausted after {count} frames");
                slot.close();
            }
        })?;

        Ok(Self {
            slot,
            stop: Some(stop_sender),
            handle: Some(handle),
        })
    }

    /// Returns the slot the frames are published to.
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }
}

impl VideoSource for FrameFeeder {
    fn read_latest_frame(&mut self) -> anyhow::Result<Arc<Frame>> {
        self.slot.read_latest_frame()
    }

    fn frame_slot(&self) -> Option<Arc<FrameSlot>> {
        Some(self.slot.clone())
    }
}

impl Drop for FrameFeeder {
    fn drop(&mut self) {
        // Disconnecting the channel wakes up the thread.
        drop(self.stop.take());

        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                if !thread::panicking() {
                    resume_unwind(payload);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::frame::Color;
    use crate::resolution::Resolution;

    fn frame(shade: u8) -> Frame {
        Frame::filled(Resolution::new(2, 2), Color::from_rgb8(shade, shade, shade))
    }

    #[test]
    fn slot_keeps_latest() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());

        slot.publish(frame(1));
        slot.publish(frame(2));
        assert_eq!(slot.latest().unwrap().get(0, 0), Color::from_rgb8(2, 2, 2));
        // Reading does not consume the frame.
        assert_eq!(slot.wait_latest().unwrap().get(0, 0), Color::from_rgb8(2, 2, 2));
    }

    #[test]
    fn wait_blocks_until_first_frame() {
        let slot = FrameSlot::new();
        let publisher = thread::spawn({
            let slot = slot.clone();
            move || {
                thread::sleep(Duration::from_millis(20));
                slot.publish(frame(7));
            }
        });

        let frame = slot.wait_latest().unwrap();
        assert_eq!(frame.get(1, 1), Color::from_rgb8(7, 7, 7));
        publisher.join().unwrap();
    }

    #[test]
    fn closed_empty_slot() {
        let mut slot = FrameSlot::new();
        slot.close();
        assert!(slot.wait_latest().is_none());
        assert!(slot.read_latest_frame().is_err());
    }

    #[test]
    fn feeder_publishes_all_frames() {
        let mut feeder = FrameFeeder::spawn((0..5).map(frame), Duration::ZERO).unwrap();

        let start = Instant::now();
        while !feeder.slot().is_closed() {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::sleep(Duration::from_millis(1));
        }

        let last = feeder.read_latest_frame().unwrap();
        assert_eq!(last.get(0, 0), Color::from_rgb8(4, 4, 4));
    }

    #[test]
    fn dropping_feeder_stops_thread() {
        let feeder =
            FrameFeeder::spawn((0..).map(|i| frame(i as u8)), Duration::from_millis(5)).unwrap();
        let slot = feeder.slot().clone();
        slot.wait_latest().unwrap();
        drop(feeder);
        assert!(!slot.is_closed());
    }
}
