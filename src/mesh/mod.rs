mod grid;
mod membership;
mod macro_body;
mod refine;

pub use grid::*;
pub use membership::*;
pub use macro_body::*;
pub use refine::*;
