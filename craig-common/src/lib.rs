//! Internal modules for craig

pub use ansi_term;

pub mod config;
#[macro_use]
pub mod macros;
pub mod output;
#[macro_use]
pub mod memory;
pub mod literal;
pub mod clause;
pub mod formula;
pub mod tseitin;
pub mod circuit;
pub mod input;
pub mod parser;
pub mod solver;
pub mod interpolant;
pub mod checker;
pub mod witness;
pub mod bmc;
pub mod imc;
