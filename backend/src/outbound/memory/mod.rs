//! In-memory repositories.
//!
//! Used when the server starts without `DATABASE_URL` and by the integration
//! test harness. State lives behind a Tokio `RwLock` per repository and is
//! lost on restart.

mod conversations;
mod feedbacks;
mod itineraries;
mod references;
mod users;

pub use conversations::MemoryConversationRepository;
pub use feedbacks::MemoryFeedbackRepository;
pub use itineraries::MemoryItineraryRepository;
pub use references::MemoryReferenceRepository;
pub use users::MemoryUserRepository;
