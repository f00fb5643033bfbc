//! The drone command link.

use crate::tracking::VelocityCommand;

/// A connection to a drone.
///
/// Commands are fire-and-forget: the control loop does not wait for acknowledgements, and errors
/// indicate a failure of the link itself.
pub trait Robot {
    fn connect(&mut self) -> anyhow::Result<()>;

    fn disconnect(&mut self) -> anyhow::Result<()>;

    /// Starts the camera stream.
    fn stream_on(&mut self) -> anyhow::Result<()>;

    fn stream_off(&mut self) -> anyhow::Result<()>;

    fn takeoff(&mut self) -> anyhow::Result<()>;

    fn land(&mut self) -> anyhow::Result<()>;

    /// Sends a velocity command (the "RC" command) to the drone.
    fn send_velocity(&mut self, command: VelocityCommand) -> anyhow::Result<()>;
}

impl<R: Robot + ?Sized> Robot for &mut R {
    fn connect(&mut self) -> anyhow::Result<()> {
        (**self).connect()
    }

    fn disconnect(&mut self) -> anyhow::Result<()> {
        (**self).disconnect()
    }

    fn stream_on(&mut self) -> anyhow::Result<()> {
        (**self).stream_on()
    }

    fn stream_off(&mut self) -> anyhow::Result<()> {
        (**self).stream_off()
    }

    fn takeoff(&mut self) -> anyhow::Result<()> {
        (**self).takeoff()
    }

    fn land(&mut self) -> anyhow::Result<()> {
        (**self).land()
    }

    fn send_velocity(&mut self, command: VelocityCommand) -> anyhow::Result<()> {
        (**self).send_velocity(command)
    }
}
