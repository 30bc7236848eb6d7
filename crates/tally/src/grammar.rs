//! The argument grammar: a static table mapping argument names to arity,
//! plus the tokenizer that turns a flat token list into flags, variables
//! and positional arguments.
//!
//! The table is the single source of truth for which arguments exist; the
//! dispatcher only ever reads flags and variables that are declared here.

use crate::error::ArgError;
use crate::session::SessionContext;

/// One row of the grammar table.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    /// Long name, written `--name` on the command line.
    pub long: &'static str,
    /// Optional single-character short name, written `-n`.
    pub short: Option<char>,
    /// Number of value tokens the argument consumes; 0 makes it a flag.
    pub arity: usize,
}

/// The shipped grammar.
///
/// `date` backdates `add`; `color` and `all` only affect formatting.
pub const ARG_SPECS: &[ArgSpec] = &[
    ArgSpec { long: "date", short: Some('d'), arity: 1 },
    ArgSpec { long: "color", short: Some('c'), arity: 0 },
    ArgSpec { long: "all", short: Some('a'), arity: 0 },
];

fn lookup_long(name: &str) -> Option<&'static ArgSpec> {
    ARG_SPECS.iter().find(|spec| spec.long == name)
}

fn lookup_short(short: char) -> Option<&'static ArgSpec> {
    ARG_SPECS.iter().find(|spec| spec.short == Some(short))
}

/// A fully parsed invocation: the (possibly extended) session context plus
/// the positional arguments, which are never inherited.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Flags and variables: inherited from the parent context and extended
    /// by this invocation's own arguments.
    pub context: SessionContext,
    /// Free tokens in input order, `[command, args...]`.
    pub positional: Vec<String>,
}

/// Parse a token list against the grammar, seeded from `base`.
///
/// Works on a private clone of `base`: on error nothing leaks back into the
/// session, and `base` itself is never mutated either way.
///
/// A token starting with `--` is a long argument. A token starting with a
/// single `-`, longer than one character and whose second character is not
/// a digit, is a cluster of short names; the digit exception lets negative
/// amounts like `-20` parse as positional arguments.
pub fn parse(tokens: &[String], base: &SessionContext) -> Result<Invocation, ArgError> {
    let mut context = base.clone();
    let mut positional = Vec::new();

    let mut input = tokens.iter();
    while let Some(token) = input.next() {
        if let Some(name) = token.strip_prefix("--") {
            apply_long(&mut context, name, &mut input)?;
        } else if is_short_cluster(token) {
            for short in token[1..].chars() {
                let spec = lookup_short(short)
                    .ok_or_else(|| ArgError::UnknownArgument(format!("-{short}")))?;
                apply(&mut context, spec, &mut input)?;
            }
        } else {
            positional.push(token.clone());
        }
    }

    Ok(Invocation { context, positional })
}

fn is_short_cluster(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next() == Some('-')
        && chars
            .next()
            .is_some_and(|second| !second.is_ascii_digit())
}

fn apply_long<'a>(
    context: &mut SessionContext,
    name: &str,
    input: &mut impl Iterator<Item = &'a String>,
) -> Result<(), ArgError> {
    let spec =
        lookup_long(name).ok_or_else(|| ArgError::UnknownArgument(format!("--{name}")))?;
    apply(context, spec, input)
}

fn apply<'a>(
    context: &mut SessionContext,
    spec: &ArgSpec,
    input: &mut impl Iterator<Item = &'a String>,
) -> Result<(), ArgError> {
    if spec.arity == 0 {
        return context.set_flag(spec.long);
    }

    let mut values = Vec::with_capacity(spec.arity);
    for _ in 0..spec.arity {
        let value = input
            .next()
            .ok_or_else(|| ArgError::MissingArgumentValue(spec.long.to_string()))?;
        values.push(value.clone());
    }
    context.bind_var(spec.long, values)
}

/// Split an interactive line into tokens following shell-style quoting.
///
/// Single and double quotes group words; a backslash escapes the next
/// character except inside single quotes. An unterminated quote is an
/// error.
pub fn split_line(line: &str) -> Result<Vec<String>, ArgError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;

    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                in_word = true;
                consume_quoted(&mut chars, c, &mut current)?;
            }
            '\\' => {
                in_word = true;
                // A trailing backslash stands for itself.
                current.push(chars.next().unwrap_or('\\'));
            }
            c if c.is_whitespace() => {
                if in_word {
                    tokens.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        tokens.push(current);
    }

    Ok(tokens)
}

fn consume_quoted(
    chars: &mut std::str::Chars<'_>,
    quote: char,
    current: &mut String,
) -> Result<(), ArgError> {
    loop {
        match chars.next() {
            Some(c) if c == quote => return Ok(()),
            // Inside double quotes a backslash still escapes.
            Some('\\') if quote == '"' => {
                current.push(chars.next().ok_or(ArgError::UnmatchedQuote(quote))?);
            }
            Some(c) => current.push(c),
            None => return Err(ArgError::UnmatchedQuote(quote)),
        }
    }
}
