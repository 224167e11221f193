//! Chain data module - Block records as reported by a node, and block ranges

mod block;
mod hash;
mod quantity;
mod range;

pub use block::*;
pub use hash::*;
pub use quantity::*;
pub use range::*;

pub use primitive_types::U256;
