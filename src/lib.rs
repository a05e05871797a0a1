//! An interpreter for MUSYS, Peter Grogono's 1973 control language for
//! driving a hybrid electronic-music studio: an interactive console language
//! that stages device codes and computed values onto six output buses,
//! backed by data paragraphs, macros with positional parameters, and
//! character-at-a-time control flow (conditionals, repeat loops, gotos).

pub mod bus;
pub mod cli;
pub mod config;
pub mod device_table;
pub mod engine;
pub mod error;
pub mod eval;
pub mod frame;
pub mod loader;
pub mod output;
pub mod paragraphs;
pub mod signed12;

pub use config::RunConfig;
pub use engine::Interpreter;
pub use error::{LoadError, LookupError, OutputError, RuntimeError};
