// ── Domain model ──

mod device;
mod event;
mod mac;

pub use device::{ConnectionMedium, Device};
pub use event::{EventKind, NotifyEvent, Transition, TransitionKind};
pub use mac::MacAddress;
