pub mod error;
pub mod errors;
pub mod fs;
pub mod io;
pub mod sparse;

pub mod prelude {
    pub use super::error::{LoomError, Result};
    pub use super::errors::is_broken_pipe;
    pub use super::fs::{is_gzipped, make_parent_dirs, with_output_extension};
    pub use super::io::{open_binary, open_input};
    pub use super::sparse::SparseOps;
}
