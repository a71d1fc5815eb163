mod auth;
mod health_check;
mod notes;

pub use auth::{get_current_user, login, register};
pub use health_check::health_check;
pub use notes::{create_note, delete_note, get_note, list_notes, update_note};
