#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::print_stderr)]
#![warn(clippy::print_stdout)]

#[cfg(feature = "color")]
pub use anstream::eprint;
#[cfg(feature = "color")]
pub use anstream::eprintln;
#[cfg(not(feature = "color"))]
pub use std::eprint;
#[cfg(not(feature = "color"))]
pub use std::eprintln;

/// Feature-flag controlled diagnostics of the parsers and the validator
#[cfg(feature = "debug")]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => ({
        $crate::eprint!("[{:>w$}] \t", module_path!(), w = 28);
        $crate::eprintln!($($arg)*);
    })
}

/// Feature-flag controlled diagnostics of the parsers and the validator
#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

/// Like [`format!`] but the result always ends in a `\n`
///
/// ```rust
/// assert_eq!("expected: 0\n", cramdown_macros::formatln!("expected: {}", 0));
/// assert_eq!("done\n", cramdown_macros::formatln!("done\n"));
/// ```
#[macro_export]
macro_rules! formatln {
    ($($arg:tt)*) => ({
        let mut line = format!($($arg)*);
        if !line.ends_with('\n') {
            line.push('\n');
        }
        line
    })
}
