use std::error::Error;
use std::iter;
use std::sync::atomic::AtomicBool;

// macro hygiene: The user might not have direct dependencies on those crates
#[doc(hidden)]
pub use anstream;
#[doc(hidden)]
pub use owo_colors;
use owo_colors::DynColor;

use mincheck_static::EnvVars;

/// Whether user-facing warnings are enabled.
pub static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable user-facing warnings.
pub fn enable() {
    ENABLED.store(true, std::sync::atomic::Ordering::Relaxed);
}

/// Disable user-facing warnings.
pub fn disable() {
    ENABLED.store(false, std::sync::atomic::Ordering::Relaxed);
}

/// Warn a user, if warnings are enabled.
#[macro_export]
macro_rules! warn_user {
    ($($arg:tt)*) => {{
        use $crate::anstream::eprintln;
        use $crate::owo_colors::OwoColorize;

        if $crate::ENABLED.load(std::sync::atomic::Ordering::Relaxed) {
            let message = format!("{}", format_args!($($arg)*));
            let formatted = message.bold();
            eprintln!("{}{} {formatted}", "warning".yellow().bold(), ":".bold());
        }
    }};
}

/// The width to wrap error chains at, if any.
///
/// `MINCHECK_NO_WRAP` disables wrapping; otherwise `COLUMNS` is used when set.
fn wrap_width() -> Option<usize> {
    if std::env::var_os(EnvVars::MINCHECK_NO_WRAP).is_some() {
        return None;
    }
    std::env::var(EnvVars::COLUMNS)
        .ok()
        .and_then(|columns| columns.parse::<usize>().ok())
}

/// Wraps text at word boundaries, indenting continuation lines.
fn wrap_text(text: &str, width: Option<usize>, subsequent_indent: &str) -> String {
    if let Some(width) = width {
        let options = textwrap::Options::new(width)
            .subsequent_indent(subsequent_indent)
            .break_words(false)
            .word_separator(textwrap::WordSeparator::AsciiSpace)
            .word_splitter(textwrap::WordSplitter::NoHyphenation);

        textwrap::fill(text, options)
    } else {
        let mut result = String::with_capacity(2 * text.len());

        for (idx, line) in text.split_terminator('\n').enumerate() {
            if idx > 0 {
                result.push('\n');
                // Don't add indent to empty lines (avoid trailing whitespace)
                if !line.is_empty() {
                    result.push_str(subsequent_indent);
                }
            }
            result.push_str(line);
        }

        result
    }
}

/// Format an error or warning chain.
///
/// ```text
/// error: Failed to parse `requirements.txt`
///   Caused by: Couldn't parse requirement at line 3
/// ```
fn write_error_chain_with_options(
    err: &dyn Error,
    mut stream: impl std::fmt::Write,
    level: impl AsRef<str>,
    color: impl DynColor + Copy,
    width: Option<usize>,
) -> std::fmt::Result {
    use owo_colors::OwoColorize;

    let main_msg = err.to_string();
    let wrapped_main = wrap_text(&main_msg, width, "");
    writeln!(
        &mut stream,
        "{}{} {}",
        level.as_ref().color(color).bold(),
        ":".bold(),
        wrapped_main.trim()
    )?;

    for source in iter::successors(err.source(), |&err| err.source()) {
        let msg = source.to_string();
        let padding = "  ";
        let cause = "Caused by";
        let child_padding = " ".repeat(padding.len() + cause.len() + 2);

        let wrapped = wrap_text(&msg, width, &child_padding);

        let mut lines = wrapped.lines();
        if let Some(first) = lines.next() {
            writeln!(
                &mut stream,
                "{}{}: {}",
                padding,
                cause.color(color).bold(),
                first.trim()
            )?;
            for line in lines {
                let line = line.trim_end();
                if line.is_empty() {
                    writeln!(&mut stream)?;
                } else {
                    writeln!(&mut stream, "{line}")?;
                }
            }
        }
    }

    Ok(())
}

/// Format an error chain with default options (error level, red color, width from the
/// environment).
pub fn write_error_chain(err: &dyn Error, stream: impl std::fmt::Write) -> std::fmt::Result {
    write_error_chain_with_options(
        err,
        stream,
        "error",
        owo_colors::AnsiColors::Red,
        wrap_width(),
    )
}
