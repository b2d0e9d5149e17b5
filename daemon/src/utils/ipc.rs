//! Parses request lines sent by clients.
//!
//! A request is a command name followed by whitespace-separated arguments. An empty line means
//! `next`.

use nom::bytes::complete::take_till1;
use nom::character::complete::{multispace0, multispace1};
use nom::multi::separated_list0;
use nom::{IResult, Parser};
use std::convert::Infallible;
use std::str::FromStr;

/// The command used when a client sends a blank line.
pub const DEFAULT_COMMAND: &str = "next";

/// One parsed request line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Request {
    pub name: String,
    pub args: Vec<String>,
}

impl Request {
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }
}

fn parse_words(input: &str) -> IResult<&str, Vec<&str>> {
    let (input, _) = multispace0(input)?;
    let (input, words) =
        separated_list0(multispace1, take_till1(char::is_whitespace)).parse(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, words))
}

/// Parse a request line.
///
/// This never fails: anything that is not whitespace is a word, and no words at all falls back
/// to [`DEFAULT_COMMAND`]. Whether the command exists is decided at dispatch.
#[must_use]
pub fn parse(input: &str) -> Request {
    let words = match parse_words(input) {
        Ok((_, words)) => words,
        Err(_) => Vec::new(),
    };
    match words.split_first() {
        Some((name, args)) => Request::new(name, args),
        None => Request::new(DEFAULT_COMMAND, &[]),
    }
}

impl FromStr for Request {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(parse(value))
    }
}
