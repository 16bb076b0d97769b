pub mod controller;
pub mod devices;
pub mod events;
pub mod state;
pub mod summary;

pub use controller::SessionController;
pub use devices::{MediaDevices, NoopDevices};
pub use events::{EventSender, SessionEvent};
pub use state::{SessionSnapshot, SessionState};
pub use summary::SessionSummary;
