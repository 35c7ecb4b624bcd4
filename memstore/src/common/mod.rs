mod constants;
mod sort_order;
pub(crate) mod stream;
mod util;
mod value;

pub use constants::*;
pub use sort_order::*;
pub use util::*;
pub use value::*;
