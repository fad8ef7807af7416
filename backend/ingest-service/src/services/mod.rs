pub mod enqueuer;
pub mod normalizer;

pub use enqueuer::{AcceptedResponse, Enqueuer, EventQueue, SqsEventQueue};
pub use normalizer::{JsonSubmission, Normalizer, PayloadKind, TENANT_HEADER};
