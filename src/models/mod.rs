pub mod appointment;
pub mod catalog;
pub mod conversation;
pub mod request;
pub mod settings;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use catalog::{Ad, Catalog, KnowledgeEntry, Partner, Plan, Promotion};
pub use conversation::{
    AppointmentIntent, ChatMessage, ConversationContext, DialogueState, UserInfo,
};
pub use request::{MissingField, ParsedAppointmentRequest};
pub use settings::AcademySettings;
