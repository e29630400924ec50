pub mod session;
pub mod store;

pub use session::{RecordingSession, SessionState};
pub use store::{Recording, RecordingSource, RecordingStore};
