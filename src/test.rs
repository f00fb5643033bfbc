//! Shared helpers for the unit tests.

use crate::robot::Robot;
use crate::tracking::VelocityCommand;

/// Creates a scratch directory, removed when the returned handle is dropped.
pub fn temp_dir(name: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(&format!("skyfollow-{name}-"))
        .tempdir()
        .unwrap()
}

/// A call received by a [`FakeRobot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Connect,
    Disconnect,
    StreamOn,
    StreamOff,
    Takeoff,
    Land,
    Velocity(VelocityCommand),
}

/// A drone that records every call it receives.
#[derive(Debug, Default)]
pub struct FakeRobot {
    pub calls: Vec<Call>,
}

impl FakeRobot {
    /// Returns all velocity commands sent so far.
    pub fn velocities(&self) -> Vec<VelocityCommand> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Velocity(cmd) => Some(*cmd),
                _ => None,
            })
            .collect()
    }
}

impl Robot for FakeRobot {
    fn connect(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::Connect);
        Ok(())
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::Disconnect);
        Ok(())
    }

    fn stream_on(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::StreamOn);
        Ok(())
    }

    fn stream_off(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::StreamOff);
        Ok(())
    }

    fn takeoff(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::Takeoff);
        Ok(())
    }

    fn land(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::Land);
        Ok(())
    }

    fn send_velocity(&mut self, command: VelocityCommand) -> anyhow::Result<()> {
        self.calls.push(Call::Velocity(command));
        Ok(())
    }
}
