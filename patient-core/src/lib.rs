//! Agentic Patient Core - Entity Types
//!
//! Pure data structures with no behavior beyond constructors and the static
//! visit/level policy table. All other crates depend on this.

mod entities;
mod enums;
mod error;
mod identity;
pub mod policy;
mod state;

pub use entities::*;
pub use enums::*;
pub use error::*;
pub use identity::*;
pub use state::*;
