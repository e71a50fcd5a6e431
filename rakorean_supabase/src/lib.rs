mod store;
mod util;

pub use store::*;
