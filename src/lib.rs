// Library entry exposing header parsing and vector decomposition.
pub mod alias;
pub mod expr;
pub mod header;
pub mod signals;
pub mod symbol_table;
pub mod text_utils;
pub mod tokenizer;
pub mod vectors;

pub use expr::{eval, EvalError};
pub use header::{HeaderCache, HeaderError, ParsedHeader};
pub use symbol_table::Defines;
pub use vectors::{decompose, DecomposeError, PeripheralInterrupt, VectorRow};
