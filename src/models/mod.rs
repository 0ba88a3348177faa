pub mod appointment;
pub mod dialogue;

pub use appointment::Appointment;
pub use dialogue::{DialogueContext, IntentKind, Meridiem, SlotField};
