pub mod audit_event;
pub mod project;
pub mod refresh_token;
pub mod user;

pub use audit_event::AuditEvent;
pub use project::{Participant, Project};
pub use refresh_token::RefreshToken;
pub use user::User;
