pub mod cache;
pub mod error;
pub mod identity;
pub mod model;
pub mod store;
pub mod sync;
pub mod view;

pub use error::*;
pub use sync::SyncEngine;
