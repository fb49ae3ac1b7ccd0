#[macro_use]
mod macros;

pub mod cli;
mod context;
pub mod env;
pub mod errors;
pub mod schema;
pub mod util;

pub use context::*;

// Extensions:
pub mod ext {
    pub mod display;
    pub mod profiles;
}
