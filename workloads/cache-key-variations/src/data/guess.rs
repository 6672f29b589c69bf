//! Guess buckets.

use std::fmt;

/// Where a guess falls relative to the answer.
///
/// The bucket, not the raw number, is what reaches the page and the cache
/// key, so the unbounded input collapses into four cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuessBucket {
    /// Below the answer.
    TooLow,
    /// Above the answer.
    TooHigh,
    /// Equal to the answer.
    Correct,
    /// No usable guess: absent, empty or not a number.
    None,
}

impl GuessBucket {
    /// Classify a raw submitted value against the answer.
    ///
    /// Values that do not parse as a number land in [`GuessBucket::None`]
    /// rather than in any of the three comparison buckets.
    pub fn classify(raw: Option<&str>, answer: i64) -> Self {
        let Some(guess) = raw.and_then(parse_guess) else {
            return Self::None;
        };

        let answer = answer as f64;
        if guess < answer {
            Self::TooLow
        } else if guess > answer {
            Self::TooHigh
        } else if guess == answer {
            Self::Correct
        } else {
            Self::None
        }
    }

    /// Tag carried in the rewritten query.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::TooLow => "too_low",
            Self::TooHigh => "too_high",
            Self::Correct => "correct",
            Self::None => "",
        }
    }

    /// Read a tag back. Anything unrecognized is [`GuessBucket::None`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "too_low" => Self::TooLow,
            "too_high" => Self::TooHigh,
            "correct" => Self::Correct,
            _ => Self::None,
        }
    }
}

impl fmt::Display for GuessBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

fn parse_guess(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}
