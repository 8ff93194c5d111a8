pub mod literal;
pub mod scanner;
pub mod types;

pub use scanner::{Scanner, fragment, scan};
pub use types::{Token, TokenKind};
