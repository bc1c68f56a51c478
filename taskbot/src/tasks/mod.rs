//! Owner task lists: projection, index resolution and mutation.

pub mod gate;
pub mod projector;
pub mod service;

pub use gate::OwnerGates;
pub use projector::{ProjectedTask, ProjectedView, Scope};
pub use service::{ChatContext, DEFAULT_STORE_TIMEOUT, TaskService};
