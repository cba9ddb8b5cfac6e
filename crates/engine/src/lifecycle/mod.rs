//! Order lifecycle events and the journal recording them.

mod events;
mod journal;

pub use events::*;
pub use journal::*;
