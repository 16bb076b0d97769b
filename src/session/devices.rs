/// Camera and microphone ownership, held from "start recording" until stop.
pub trait MediaDevices: Send {
    /// Acquire both devices. On error nothing stays held.
    fn acquire(&mut self) -> Result<(), String>;

    fn release(&mut self);

    fn is_held(&self) -> bool;
}

/// Devices that are always available; used by tests and the synthetic demo.
#[derive(Debug, Default)]
pub struct NoopDevices {
    held: bool,
}

impl MediaDevices for NoopDevices {
    fn acquire(&mut self) -> Result<(), String> {
        self.held = true;
        Ok(())
    }

    fn release(&mut self) {
        self.held = false;
    }

    fn is_held(&self) -> bool {
        self.held
    }
}
