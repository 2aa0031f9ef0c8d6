//! A configurable C89/C99/C11/C17/C23 preprocessor, lexer, and
//! recursive-descent parser.
//!
//! The crate is organized leaf-first, mirroring the dependency order of the
//! twelve components the engine is built from: position/error plumbing
//! ([`position`], [`diagnostics`]) at the bottom, the preprocessor
//! ([`preprocessor`]) and lexer ([`lexer`]) in the middle, the parser
//! ([`parser`]) and [`ast`] on top, wired together by [`engine`].

pub mod ast;
pub mod cli;
pub mod config;
pub mod dialect;
pub mod diagnostics;
pub mod engine;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod preprocessor;

pub use config::EngineConfig;
pub use dialect::CStandard;
pub use engine::{Engine, ProcessingResult, Stage};
