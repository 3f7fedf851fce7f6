pub mod chat;
pub mod doctor;
pub mod enums;

pub use chat::{ChatMessage, Sender};
pub use doctor::{Doctor, DoctorId};
pub use enums::{AppointmentStatus, CallStatus, ParseTagError, TaskPriority, View};
