//! Shared types for the guideline assistant client.

mod backend;
mod feedback;
mod history;
mod outcome;

pub use backend::*;
pub use feedback::*;
pub use history::*;
pub use outcome::*;
