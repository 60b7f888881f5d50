//! Parser dispatch contract: extension→parser registry and the
//! `LanguageParser` trait. Concrete language parsers are out of scope.

mod dispatch;

pub use dispatch::{LanguageParser, ParserRegistry};
