mod error;
mod lexer;
mod parser;
mod token;

pub use error::{LexError, ParseError};
pub use lexer::tokenize;
pub use parser::parse;
pub use token::{Token, TokenKind};
