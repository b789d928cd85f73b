//! Parsing for the tagged lines that the game writes into each run log.
//!
//! A recognized record has the shape `TAG,...,value`: the leading field is
//! one of the [RecordTag]s and the value is whatever follows the final comma.
//! Anything else in a log is noise and parses to [LogRecord::Unrecognized].

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, i64},
    combinator::{all_consuming, value},
    number::complete::double,
    sequence::terminated,
    Finish, IResult,
};

use std::{fmt, str::FromStr};

/// The four tags we know how to read out of a run log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordTag {
    /// Seconds the player survived, a float
    TimeAlive,
    /// Points collected, an integer
    Score,
    /// Highest velocity reached during the run, a float
    MaxVelocity,
    /// Total distance covered during the run, a float
    DistanceTravelled,
}

impl RecordTag {
    /// The tag exactly as it appears at the start of a log line.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordTag::TimeAlive => "TIME_ALIVE",
            RecordTag::Score => "SCORE",
            RecordTag::MaxVelocity => "MAX_VELOCITY",
            RecordTag::DistanceTravelled => "DISTANCE_TRAVELLED",
        }
    }
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of a run log, after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogRecord {
    /// `TIME_ALIVE,...,<seconds>`
    TimeAlive(f64),
    /// `SCORE,...,<points>`
    Score(i64),
    /// `MAX_VELOCITY,...,<velocity>`
    MaxVelocity(f64),
    /// `DISTANCE_TRAVELLED,...,<distance>`
    DistanceTravelled(f64),
    /// Any line whose leading field is not a known tag
    Unrecognized,
}

/// Returned when a line carries a known tag but its value is not a number
/// of the right kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The text after the final comma could not be parsed for this tag.
    InvalidValue {
        /// The tag that introduced the record
        tag: RecordTag,
        /// The offending value text, already trimmed
        text: String,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordError::InvalidValue { tag, text } => {
                write!(f, "invalid value {:?} for {} record", text, tag)
            }
        }
    }
}

impl std::error::Error for RecordError {}

fn parse_tag(s: &str) -> IResult<&str, RecordTag> {
    terminated(
        alt((
            value(RecordTag::TimeAlive, tag("TIME_ALIVE")),
            value(RecordTag::Score, tag("SCORE")),
            value(RecordTag::MaxVelocity, tag("MAX_VELOCITY")),
            value(RecordTag::DistanceTravelled, tag("DISTANCE_TRAVELLED")),
        )),
        char(','),
    )(s)
}

fn parse_float(s: &str) -> IResult<&str, f64> {
    all_consuming(double)(s)
}

fn parse_int(s: &str) -> IResult<&str, i64> {
    all_consuming(i64)(s)
}

/// The value of a record is the text after the last comma on the line.
fn value_field(rest: &str) -> &str {
    match rest.rsplit_once(',') {
        Some((_, last)) => last.trim(),
        None => rest.trim(),
    }
}

impl FromStr for LogRecord {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, tag) = match parse_tag(s.trim()).finish() {
            Ok(parsed) => parsed,
            Err(_) => return Ok(LogRecord::Unrecognized),
        };

        let text = value_field(rest);
        let invalid = || RecordError::InvalidValue {
            tag,
            text: text.to_owned(),
        };

        let float = || parse_float(text).finish().map(|(_, x)| x).map_err(|_| invalid());

        Ok(match tag {
            RecordTag::TimeAlive => LogRecord::TimeAlive(float()?),
            RecordTag::MaxVelocity => LogRecord::MaxVelocity(float()?),
            RecordTag::DistanceTravelled => LogRecord::DistanceTravelled(float()?),
            RecordTag::Score => {
                let (_, n) = parse_int(text).finish().map_err(|_| invalid())?;
                LogRecord::Score(n)
            }
        })
    }
}

/// Round to two decimal places, the precision every metric is stored at.
/// The exact binary value is rounded, so `2.675` (stored as 2.67499...)
/// becomes `2.67`, and exact ties go to the even digit. Rounding a value that
/// has already been rounded gives the same value back.
pub fn round2(x: f64) -> f64 {
    format!("{:.2}", x).parse().unwrap_or(x)
}
