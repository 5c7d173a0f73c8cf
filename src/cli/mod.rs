pub mod commands;
pub mod ui;
pub mod util;

pub use util::{InputSource, load_config, read_file, require_arg};
