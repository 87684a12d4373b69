//! Pure data structures stored by the [`ResourceActor`](crate::framework::ResourceActor)s.

pub mod menu;
pub mod order;
pub mod status;

pub use menu::*;
pub use order::*;
pub use status::*;
