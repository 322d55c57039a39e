//! Callback-driven command-line option parsing.
//!
//! Options are declared with a small grammar (`-o?`, `--out=?`, `/out:?`) and
//! bound to callbacks. A single left-to-right pass over the arguments invokes
//! the callbacks and collects everything else as positional arguments:
//! - short flags can be bundled (`-vd`)
//! - a value-taking short option takes the rest of its token (`-ofile`) or
//!   the next argument (`-o file`); inside a bundle it must come first
//! - long options take values as `--out=file`, and options declared with a
//!   `/` spelling also accept `/out:file`
//! - `--` ends option parsing
//!
//! ```
//! use gnopt::{OptionParser, ParseOutcome};
//!
//! # fn main() -> gnopt::Result<()> {
//! let mut verbose = false;
//! let mut output = String::from("a.out");
//!
//! let mut parser = OptionParser::new();
//! parser.on_flag(&["-v", "--verbose"], "toggle verbose", || {
//!     verbose = true;
//!     Ok(())
//! })?;
//! parser.on_value(&["-o?", "--out=?"], "set output file", |v| {
//!     output = v.as_str().to_string();
//!     Ok(())
//! })?;
//!
//! let outcome = parser.parse(["-v", "-oresult.bin", "input.c"])?;
//! assert_eq!(outcome, ParseOutcome::Complete);
//! assert_eq!(parser.positional(), ["input.c"]);
//! drop(parser);
//!
//! assert!(verbose);
//! assert_eq!(output, "result.bin");
//! # Ok(())
//! # }
//! ```

mod decl;
mod error;
mod grammar;
mod help;
mod parser;
mod registry;
mod scan;

pub use decl::{Callback, Declaration, Value};
pub use error::{Error, GrammarSide, Result};
pub use grammar::{Grammar, LongName, LongStyle};
pub use help::{render as render_help, write_help};
pub use parser::{OptionParser, ParseOutcome, ParserConfig};
pub use registry::{DeclId, Registry};
pub use scan::ScanState;
