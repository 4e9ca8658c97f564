//! Parses pip's requirements file format, for both requirements and constraints files.
//!
//! <https://pip.pypa.io/en/stable/reference/requirements-file-format/>
//!
//! Supported:
//!  * [PEP 508 requirements](https://packaging.python.org/en/latest/specifications/dependency-specifiers/)
//!  * `-r` / `--requirement`
//!  * `-c` / `--constraint`
//!  * `-e` / `--editable`
//!  * `--hash` (postfix)
//!  * Unnamed requirements (`./path`, `https://...`), recorded verbatim
//!  * Global options such as `--index-url` or `--only-binary`, recorded but otherwise unused
//!
//! Grammar as implemented:
//!
//! ```text
//! file = (statement | empty ('#' any*)? '\n')*
//! empty = whitespace*
//! statement = option | unnamed_requirement | requirement
//! option = ('-' | '--') name (('=' | wrappable_whitespaces) value)?
//! # A line starting with `.`, `/`, `~` or containing a URL scheme before any `@` is an unnamed
//! # requirement
//! unnamed_requirement = (path | url) any*
//! requirement = [a-zA-Z0-9] pep508_grammar_tail wrappable_whitespaces hashes
//! hashes = ('--hash' ('=' | wrappable_whitespaces) [a-zA-Z0-9-_]+ ':' [a-zA-Z0-9-_] wrappable_whitespaces+)*
//! # This should indicate a single backslash before a newline
//! wrappable_whitespaces = whitespace ('\\\n' | whitespace)*
//! ```
//!
//! Relative paths in `-r` and `-c` are resolved against the directory of the file that contains
//! them, the same way pip does.

use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::Serialize;
use tracing::{debug, warn};
use unscanny::{Pattern, Scanner};

use pep508_rs::{Pep508Error, Requirement};

pub use crate::options::ParsedOptions;

mod options;

/// We emit one of those for each requirements.txt entry
enum RequirementsTxtStatement {
    /// `-r` inclusion filename
    Requirements { filename: String, start: usize },
    /// `-c` inclusion filename
    Constraint { filename: String, start: usize },
    /// PEP 508 requirement plus metadata
    RequirementEntry {
        requirement: Requirement,
        hashes: Vec<String>,
        start: usize,
    },
    /// `-e`
    EditableRequirement { target: String, start: usize },
    /// A path or URL without a package name
    UnnamedRequirement { target: String, start: usize },
    /// A global option, e.g. `--index-url`
    Option(options::ParsedOption),
}

/// The place in a requirements file where an entry was written.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Origin {
    /// The file containing the entry, as it was reached (relative paths stay relative).
    pub path: PathBuf,
    /// The 1-based line the entry starts on.
    pub line: usize,
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// A [Requirement] with additional metadata from the requirements.txt, currently the hashes
/// and where it was declared
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RequirementEntry {
    /// The actual PEP 508 requirement
    pub requirement: Requirement,
    /// Hashes of the downloadable packages
    pub hashes: Vec<String>,
    /// Where the requirement was declared
    pub origin: Origin,
}

impl Display for RequirementEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.requirement)?;
        for hash in &self.hashes {
            write!(f, " --hash {hash}")?;
        }
        Ok(())
    }
}

/// An editable install (`-e ./path`), see e.g. <https://stackoverflow.com/q/35064426/3549270>
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EditableEntry {
    /// The path or URL, verbatim.
    pub target: String,
    pub origin: Origin,
}

/// A requirement given as a bare path or URL, without a package name.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnnamedEntry {
    /// The line content without comments or hashes, verbatim.
    pub target: String,
    pub origin: Origin,
}

/// Parsed and flattened requirements.txt with requirements and constraints
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RequirementsTxt {
    /// The actual requirements with the hashes
    pub requirements: Vec<RequirementEntry>,
    /// Constraints included with `-c`
    pub constraints: Vec<RequirementEntry>,
    /// Editables with `-e`
    pub editables: Vec<EditableEntry>,
    /// Paths and URLs without a package name
    pub unnamed: Vec<UnnamedEntry>,
    /// Global options such as `--index-url`
    pub options: ParsedOptions,
}

impl RequirementsTxt {
    /// Read and parse a requirements file, following its includes.
    ///
    /// See module level documentation
    pub fn parse(requirements_txt: impl AsRef<Path>) -> Result<Self, RequirementsTxtFileError> {
        let mut stack = Vec::new();
        Self::parse_file(requirements_txt.as_ref(), &mut stack)
    }

    /// Parse the content of a requirements file that lives at `requirements_txt`.
    ///
    /// The path is used for origins and to resolve relative includes; it is not read.
    pub fn parse_str(
        content: &str,
        requirements_txt: impl AsRef<Path>,
    ) -> Result<Self, RequirementsTxtFileError> {
        let path = requirements_txt.as_ref();
        let mut stack = vec![file_identity(path)];
        Self::parse_inner(content, path, &mut stack).map_err(|err| RequirementsTxtFileError {
            file: path.to_path_buf(),
            error: err,
        })
    }

    fn parse_file(
        requirements_txt: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Self, RequirementsTxtFileError> {
        let content =
            fs::read_to_string(requirements_txt).map_err(|err| RequirementsTxtFileError {
                file: requirements_txt.to_path_buf(),
                error: RequirementsTxtParserError::Io(err),
            })?;

        debug!("Parsing requirements from `{}`", requirements_txt.display());
        stack.push(file_identity(requirements_txt));
        let data = Self::parse_inner(&content, requirements_txt, stack);
        stack.pop();

        let data = data.map_err(|err| RequirementsTxtFileError {
            file: requirements_txt.to_path_buf(),
            error: err,
        })?;
        if data.is_empty() {
            warn!(
                "Requirements file `{}` does not contain any dependencies",
                requirements_txt.display()
            );
        }
        Ok(data)
    }

    fn parse_inner(
        content: &str,
        requirements_txt: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Self, RequirementsTxtParserError> {
        let mut s = Scanner::new(content);

        let mut data = Self::default();
        while let Some(statement) = parse_entry(&mut s, content)? {
            match statement {
                RequirementsTxtStatement::Requirements { filename, start } => {
                    let line = line_number(&content[..start]);
                    let sub_requirements =
                        Self::parse_include(requirements_txt, &filename, line, stack)?;
                    // Add each to the correct category
                    data.update_from(sub_requirements);
                }
                RequirementsTxtStatement::Constraint { filename, start } => {
                    let line = line_number(&content[..start]);
                    let sub_constraints =
                        Self::parse_include(requirements_txt, &filename, line, stack)?;
                    // Treat any nested requirements or constraints as constraints. pip
                    // does the same for `-r` lines inside a constraints file.
                    data.constraints.extend(sub_constraints.requirements);
                    data.constraints.extend(sub_constraints.constraints);
                    data.options.update_from(sub_constraints.options);
                }
                RequirementsTxtStatement::RequirementEntry {
                    requirement,
                    hashes,
                    start,
                } => {
                    data.requirements.push(RequirementEntry {
                        requirement,
                        hashes,
                        origin: origin(requirements_txt, content, start),
                    });
                }
                RequirementsTxtStatement::EditableRequirement { target, start } => {
                    data.editables.push(EditableEntry {
                        target,
                        origin: origin(requirements_txt, content, start),
                    });
                }
                RequirementsTxtStatement::UnnamedRequirement { target, start } => {
                    data.unnamed.push(UnnamedEntry {
                        target,
                        origin: origin(requirements_txt, content, start),
                    });
                }
                RequirementsTxtStatement::Option(option) => {
                    data.options.apply(option);
                }
            }
        }
        Ok(data)
    }

    /// Parse a file referenced by `-r` or `-c` in `requirements_txt`.
    fn parse_include(
        requirements_txt: &Path,
        filename: &str,
        line: usize,
        stack: &mut Vec<PathBuf>,
    ) -> Result<Self, RequirementsTxtParserError> {
        let sub_file = requirements_txt
            .parent()
            .map(|parent| parent.join(filename))
            .unwrap_or_else(|| PathBuf::from(filename));
        if stack.contains(&file_identity(&sub_file)) {
            return Err(RequirementsTxtParserError::IncludeCycle {
                path: sub_file,
                line,
            });
        }
        Self::parse_file(&sub_file, stack).map_err(|err| RequirementsTxtParserError::Subfile {
            source: Box::new(err),
            line,
        })
    }

    /// Merges other into self
    pub fn update_from(&mut self, other: Self) {
        self.requirements.extend(other.requirements);
        self.constraints.extend(other.constraints);
        self.editables.extend(other.editables);
        self.unnamed.extend(other.unnamed);
        self.options.update_from(other.options);
    }

    /// Returns `true` if the file declared no requirements of any kind.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
            && self.constraints.is_empty()
            && self.editables.is_empty()
            && self.unnamed.is_empty()
    }
}

/// The path used to detect include cycles.
fn file_identity(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn origin(requirements_txt: &Path, content: &str, start: usize) -> Origin {
    Origin {
        path: requirements_txt.to_path_buf(),
        line: line_number(&content[..start]),
    }
}

/// The 1-based line and column at the end of `before`.
///
/// `\n`, `\r\n` and a lone `\r` each end a line.
fn line_column(before: &str) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    let mut chars = before.chars().peekable();
    while let Some(char) = chars.next() {
        match char {
            '\n' => {
                line += 1;
                column = 1;
            }
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    line += 1;
                    column = 1;
                }
            }
            _ => column += 1,
        }
    }
    (line, column)
}

fn line_number(before: &str) -> usize {
    line_column(before).0
}

/// Parse a single entry, that is a requirement, an inclusion or a comment line
///
/// Consumes all preceding trivia (whitespace and comments). If it returns None, we've reached
/// the end of file
fn parse_entry(
    s: &mut Scanner,
    content: &str,
) -> Result<Option<RequirementsTxtStatement>, RequirementsTxtParserError> {
    // Eat all preceding whitespace, this may run us to the end of file
    eat_wrappable_whitespace(s);
    while s.at(['\n', '\r', '#']) {
        // skip comments
        eat_trailing_line(s)?;
        eat_wrappable_whitespace(s);
    }

    let start = s.cursor();
    Ok(Some(if s.at('-') {
        let name = s.eat_while(|c: char| !c.is_whitespace() && c != '=');
        match name {
            "-r" | "--requirement" => {
                let filename = parse_value(s, |c: char| !['\n', '\r', '#'].contains(&c))?;
                let filename = filename.to_string();
                eat_trailing_line(s)?;
                RequirementsTxtStatement::Requirements { filename, start }
            }
            "-c" | "--constraint" => {
                let filename = parse_value(s, |c: char| !['\n', '\r', '#'].contains(&c))?;
                let filename = filename.to_string();
                eat_trailing_line(s)?;
                RequirementsTxtStatement::Constraint { filename, start }
            }
            "-e" | "--editable" => {
                // URLs may contain `#egg=...`, so only whitespace ends the value
                let target = parse_value(s, |c: char| !c.is_whitespace())?.to_string();
                eat_trailing_line(s)?;
                RequirementsTxtStatement::EditableRequirement { target, start }
            }
            name => {
                let Some(kind) = options::OptionKind::from_name(name) else {
                    let (line, _) = line_column(s.before());
                    return Err(RequirementsTxtParserError::UnsupportedOption {
                        option: name.to_string(),
                        line,
                    });
                };
                let value = if kind.takes_value() {
                    Some(parse_value(s, |c: char| !c.is_whitespace())?.to_string())
                } else {
                    None
                };
                eat_trailing_line(s)?;
                RequirementsTxtStatement::Option(options::ParsedOption { kind, value })
            }
        }
    } else if is_unnamed(s.after()) {
        let (end, has_hashes) = find_requirement_end(s);
        let target = strip_continuations(&content[start..end]).trim().to_string();
        if has_hashes {
            // Hashes of unnamed requirements are not recorded.
            parse_hashes(s)?;
            eat_trailing_line(s)?;
        }
        RequirementsTxtStatement::UnnamedRequirement { target, start }
    } else if s.at(char::is_ascii_alphanumeric) {
        let (requirement, hashes) = parse_requirement_and_hashes(s, content)?;
        RequirementsTxtStatement::RequirementEntry {
            requirement,
            hashes,
            start,
        }
    } else if let Some(char) = s.peek() {
        let (line, column) = line_column(s.before());
        return Err(RequirementsTxtParserError::Parser {
            message: format!(
                "Unexpected '{char}', expected an option, a path, a URL or the start of a requirement"
            ),
            line,
            column,
        });
    } else {
        // EOF
        return Ok(None);
    }))
}

/// Whether the line starting at the cursor is a path or URL rather than a named requirement.
fn is_unnamed(rest: &str) -> bool {
    let token = rest
        .split(|c: char| c.is_whitespace() || c == ';')
        .next()
        .unwrap_or_default();
    if token.starts_with(['.', '/', '~', '\\']) {
        return true;
    }
    if token.starts_with("file:") {
        return true;
    }
    match (token.find("://"), token.find('@')) {
        // `name@https://...` is a named requirement with a direct URL
        (Some(scheme), Some(at)) => scheme < at,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Eat whitespace and ignore newlines escaped with a backslash
fn eat_wrappable_whitespace<'a>(s: &mut Scanner<'a>) -> &'a str {
    let start = s.cursor();
    s.eat_while([' ', '\t']);
    // Allow multiple escaped line breaks
    // With the order we support `\n`, `\r`, `\r\n` without accidentally eating a `\n\r`
    while s.eat_if("\\\n") || s.eat_if("\\\r\n") || s.eat_if("\\\r") {
        s.eat_while([' ', '\t']);
    }
    s.from(start)
}

/// Remove escaped line breaks from a multi-line statement.
fn strip_continuations(text: &str) -> String {
    text.replace("\\\r\n", "")
        .replace("\\\n", "")
        .replace("\\\r", "")
}

/// Eats the end of line or a potential trailing comment
fn eat_trailing_line(s: &mut Scanner) -> Result<(), RequirementsTxtParserError> {
    s.eat_while([' ', '\t']);
    match s.eat() {
        None | Some('\n') => {} // End of file or end of line, nothing to do
        Some('\r') => {
            s.eat_if('\n'); // `\r\n`, but just `\r` is also accepted
        }
        Some('#') => {
            s.eat_until(['\r', '\n']);
            if s.at('\r') {
                s.eat_if('\r');
            }
            s.eat_if('\n');
        }
        Some(other) => {
            s.uneat();
            let (line, column) = line_column(s.before());
            return Err(RequirementsTxtParserError::Parser {
                message: format!("Expected comment or end-of-line, found '{other}'"),
                line,
                column,
            });
        }
    }
    Ok(())
}

/// Advance to the end of the current statement.
///
/// Returns the byte offset where the statement text ends and whether `--hash` options follow.
fn find_requirement_end(s: &mut Scanner) -> (usize, bool) {
    // Termination: s.eat() eventually becomes None
    loop {
        let end = s.cursor();

        //  We look for the end of the line ...
        if s.eat_if('\n') {
            break (end, false);
        }
        if s.eat_if('\r') {
            s.eat_if('\n'); // Support `\r\n` but also accept stray `\r`
            break (end, false);
        }
        // ... or `--hash`, an escaped newline or a comment separated by whitespace ...
        if !eat_wrappable_whitespace(s).is_empty() {
            if s.after().starts_with("--") {
                break (end, true);
            } else if s.eat_if('#') {
                s.eat_until(['\r', '\n']);
                if s.at('\r') {
                    s.eat_if('\r');
                }
                s.eat_if('\n');
                break (end, false);
            }
            continue;
        }
        // ... or the end of the file, which works like the end of line
        if s.eat().is_none() {
            break (end, false);
        }
    }
}

/// Parse a PEP 508 requirement with optional trailing hashes
fn parse_requirement_and_hashes(
    s: &mut Scanner,
    content: &str,
) -> Result<(Requirement, Vec<String>), RequirementsTxtParserError> {
    let start = s.cursor();
    let (end, has_hashes) = find_requirement_end(s);
    let text = strip_continuations(&content[start..end]);
    let requirement = text.trim().parse::<Requirement>().map_err(|err| {
        RequirementsTxtParserError::Pep508 {
            source: Box::new(err),
            line: line_number(&content[..start]),
        }
    })?;
    let hashes = if has_hashes {
        let hashes = parse_hashes(s)?;
        eat_trailing_line(s)?;
        hashes
    } else {
        Vec::new()
    };
    Ok((requirement, hashes))
}

/// Parse `--hash=... --hash ...` after a requirement
fn parse_hashes(s: &mut Scanner) -> Result<Vec<String>, RequirementsTxtParserError> {
    let mut hashes = Vec::new();
    if !s.eat_if("--hash") {
        let found = s.eat_while(|c: char| !c.is_whitespace());
        let (line, column) = line_column(s.before());
        return Err(RequirementsTxtParserError::Parser {
            message: format!("Expected '--hash', found '{found}'"),
            line,
            column,
        });
    }
    let hash = parse_value(s, |c: char| !c.is_whitespace())?;
    hashes.push(hash.to_string());
    loop {
        eat_wrappable_whitespace(s);
        if !s.eat_if("--hash") {
            break;
        }
        let hash = parse_value(s, |c: char| !c.is_whitespace())?;
        hashes.push(hash.to_string());
    }
    Ok(hashes)
}

/// In `-<key>=<value>` or `-<key> value`, this parses the part after the key
fn parse_value<'a, T>(
    s: &mut Scanner<'a>,
    while_pattern: impl Pattern<T>,
) -> Result<&'a str, RequirementsTxtParserError> {
    let value = if s.eat_if('=') {
        // Explicit equals sign
        s.eat_while(while_pattern).trim_end()
    } else if s.at([' ', '\t']) {
        // Key and value are separated by whitespace instead
        s.eat_while([' ', '\t']);
        s.eat_while(while_pattern).trim_end()
    } else {
        let (line, column) = line_column(s.before());
        return Err(RequirementsTxtParserError::Parser {
            message: format!("Expected '=' or whitespace, found {:?}", s.peek()),
            line,
            column,
        });
    };
    if value.is_empty() {
        let (line, column) = line_column(s.before());
        return Err(RequirementsTxtParserError::Parser {
            message: "Expected a value after the option".to_string(),
            line,
            column,
        });
    }
    Ok(value)
}

/// Error parsing requirements.txt, wrapper with filename
#[derive(Debug)]
pub struct RequirementsTxtFileError {
    file: PathBuf,
    error: RequirementsTxtParserError,
}

impl RequirementsTxtFileError {
    /// The file in which the error occurred.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The underlying error.
    pub fn error(&self) -> &RequirementsTxtParserError {
        &self.error
    }
}

/// Error parsing requirements.txt, error disambiguation
#[derive(Debug)]
pub enum RequirementsTxtParserError {
    Io(io::Error),
    Parser {
        message: String,
        line: usize,
        column: usize,
    },
    UnsupportedOption {
        option: String,
        line: usize,
    },
    Pep508 {
        source: Box<Pep508Error>,
        line: usize,
    },
    IncludeCycle {
        path: PathBuf,
        line: usize,
    },
    Subfile {
        source: Box<RequirementsTxtFileError>,
        line: usize,
    },
}

impl Display for RequirementsTxtFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.error {
            RequirementsTxtParserError::Io(err) => err.fmt(f),
            RequirementsTxtParserError::Parser {
                message,
                line,
                column,
            } => {
                write!(
                    f,
                    "{message} in `{}` at line {line}, column {column}",
                    self.file.display(),
                )
            }
            RequirementsTxtParserError::UnsupportedOption { option, line } => {
                write!(
                    f,
                    "Unsupported option `{option}` in `{}` at line {line}",
                    self.file.display(),
                )
            }
            RequirementsTxtParserError::Pep508 { line, .. } => {
                write!(
                    f,
                    "Couldn't parse requirement in `{}` at line {line}",
                    self.file.display(),
                )
            }
            RequirementsTxtParserError::IncludeCycle { path, line } => {
                write!(
                    f,
                    "`{}` includes `{}` at line {line}, which is already being parsed",
                    self.file.display(),
                    path.display(),
                )
            }
            RequirementsTxtParserError::Subfile { line, .. } => {
                write!(
                    f,
                    "Error parsing file included into `{}` at line {line}",
                    self.file.display(),
                )
            }
        }
    }
}

impl std::error::Error for RequirementsTxtFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.error {
            RequirementsTxtParserError::Io(err) => err.source(),
            RequirementsTxtParserError::Pep508 { source, .. } => Some(source.as_ref()),
            RequirementsTxtParserError::Subfile { source, .. } => Some(source.as_ref()),
            RequirementsTxtParserError::Parser { .. }
            | RequirementsTxtParserError::UnsupportedOption { .. }
            | RequirementsTxtParserError::IncludeCycle { .. } => None,
        }
    }
}

impl From<io::Error> for RequirementsTxtParserError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
