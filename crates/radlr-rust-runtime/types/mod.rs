mod constants;
mod error;
mod token;

pub use constants::*;
pub use error::*;
pub use token::*;
