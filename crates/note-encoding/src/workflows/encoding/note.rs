use std::fmt;

use serde::{Deserialize, Serialize};

/// Credit weight from which a course accepts fractional scores.
pub const DEFAULT_DECIMAL_CREDIT_THRESHOLD: f32 = 15.0;

const HUNDREDTHS_PER_POINT: u32 = 100;

/// Non-numeric grade explaining why no score exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Justification {
    Cheating,
    AbsenceUnjustified,
    AbsenceJustified,
}

impl Justification {
    pub const fn ordered() -> [Self; 3] {
        [
            Self::Cheating,
            Self::AbsenceUnjustified,
            Self::AbsenceJustified,
        ]
    }

    /// Short code written on score sheets.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Cheating => "T",
            Self::AbsenceUnjustified => "A",
            Self::AbsenceJustified => "M",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Cheating => "CHEATING",
            Self::AbsenceUnjustified => "ABSENCE_UNJUSTIFIED",
            Self::AbsenceJustified => "ABSENCE_JUSTIFIED",
        }
    }

    /// Match a short code or full name, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        let upper = token.trim().to_ascii_uppercase();
        Self::ordered()
            .into_iter()
            .find(|justification| upper == justification.code() || upper == justification.name())
    }
}

/// Numeric score kept in hundredths of a point so equality and rendering stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Score(u16);

impl Score {
    pub const MAX: Score = Score(2000);

    pub fn from_hundredths(hundredths: u16) -> Option<Self> {
        (hundredths <= Self::MAX.0).then_some(Self(hundredths))
    }

    pub fn from_points(points: u16) -> Option<Self> {
        points
            .checked_mul(HUNDREDTHS_PER_POINT as u16)
            .and_then(Self::from_hundredths)
    }

    pub fn hundredths(self) -> u16 {
        self.0
    }

    pub fn is_integral(self) -> bool {
        u32::from(self.0) % HUNDREDTHS_PER_POINT == 0
    }
}

impl TryFrom<u16> for Score {
    type Error = String;

    fn try_from(hundredths: u16) -> Result<Self, Self::Error> {
        Self::from_hundredths(hundredths)
            .ok_or_else(|| format!("score of {hundredths} hundredths exceeds 20 points"))
    }
}

impl From<Score> for u16 {
    fn from(value: Score) -> Self {
        value.hundredths()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = u32::from(self.0) / HUNDREDTHS_PER_POINT;
        let fraction = u32::from(self.0) % HUNDREDTHS_PER_POINT;
        match fraction {
            0 => write!(f, "{whole}"),
            tenths if tenths % 10 == 0 => write!(f, "{whole}.{}", tenths / 10),
            _ => write!(f, "{whole}.{fraction:02}"),
        }
    }
}

/// Value held by a note record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NoteValue {
    #[default]
    Missing,
    Numeric(Score),
    Justification(Justification),
}

impl NoteValue {
    /// Parse a raw token using the default decimal threshold.
    pub fn parse(raw: &str, credit_weight: f32) -> Result<Self, NoteError> {
        Self::parse_with_threshold(raw, credit_weight, DEFAULT_DECIMAL_CREDIT_THRESHOLD)
    }

    /// Parse a raw token: blank is `Missing`, then justification codes, then scores.
    pub fn parse_with_threshold(
        raw: &str,
        credit_weight: f32,
        decimal_credit_threshold: f32,
    ) -> Result<Self, NoteError> {
        let token = raw.trim();
        if token.is_empty() {
            return Ok(Self::Missing);
        }

        if let Some(justification) = Justification::from_token(token) {
            return Ok(Self::Justification(justification));
        }

        let numeral = Numeral::parse(token).ok_or_else(|| NoteError::Malformed {
            raw: token.to_string(),
        })?;
        let score = numeral.to_score().ok_or_else(|| NoteError::OutOfRange {
            raw: token.to_string(),
        })?;

        if !score.is_integral() && credit_weight < decimal_credit_threshold {
            return Err(NoteError::DecimalNotAllowed {
                raw: token.to_string(),
                credit_weight,
            });
        }

        Ok(Self::Numeric(score))
    }

    pub fn render(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Numeric(score) => score.to_string(),
            Self::Justification(justification) => justification.code().to_string(),
        }
    }

    pub fn is_valued(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Rejection raised while parsing a raw note token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoteError {
    #[error("note '{raw}' is neither a score nor a known justification code")]
    Malformed { raw: String },
    #[error("note '{raw}' must be between 0 and 20")]
    OutOfRange { raw: String },
    #[error("note '{raw}' has decimals but the course weighs {credit_weight} credits")]
    DecimalNotAllowed { raw: String, credit_weight: f32 },
}

/// Syntactically valid decimal numeral, not yet range checked.
struct Numeral {
    negative: bool,
    whole: u32,
    hundredths: u32,
}

impl Numeral {
    const MAX_WHOLE_DIGITS: usize = 6;

    fn parse(token: &str) -> Option<Self> {
        let (negative, unsigned) = match token.as_bytes().first()? {
            b'-' => (true, &token[1..]),
            b'+' => (false, &token[1..]),
            _ => (false, token),
        };

        let (whole_digits, fraction_digits) = match unsigned.find(['.', ',']) {
            Some(index) => (&unsigned[..index], Some(&unsigned[index + 1..])),
            None => (unsigned, None),
        };

        if whole_digits.is_empty() || !whole_digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let whole_digits = whole_digits.trim_start_matches('0');
        if whole_digits.len() > Self::MAX_WHOLE_DIGITS {
            // Too large to be a score, but still a number.
            return Some(Self {
                negative,
                whole: u32::MAX,
                hundredths: 0,
            });
        }
        let whole = if whole_digits.is_empty() {
            0
        } else {
            whole_digits.parse().ok()?
        };

        let hundredths = match fraction_digits {
            None => 0,
            Some(digits) => {
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let significant = digits.trim_end_matches('0');
                if significant.len() > 2 {
                    return None;
                }
                let padded = format!("{significant:0<2}");
                padded.parse().ok()?
            }
        };

        Some(Self {
            negative,
            whole,
            hundredths,
        })
    }

    fn to_score(&self) -> Option<Score> {
        let is_zero = self.whole == 0 && self.hundredths == 0;
        if self.negative && !is_zero {
            return None;
        }
        let total = self
            .whole
            .checked_mul(HUNDREDTHS_PER_POINT)?
            .checked_add(self.hundredths)?;
        u16::try_from(total).ok().and_then(Score::from_hundredths)
    }
}
