mod macros;
pub mod text;
pub mod time;

pub use text::*;
pub use time::*;
