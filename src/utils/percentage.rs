use std::{fmt::Display, ops::Deref};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `part` in `whole`. An empty whole is 0% rather than NaN so the result can always be
/// printed.
pub fn count_percentage(part: usize, whole: usize) -> Percentage {
    if whole == 0 {
        return Percentage::ZERO;
    }
    Percentage(part as f64 / whole as f64 * 100.)
}

#[cfg(test)]
mod percentage_tests {
    use super::{count_percentage, Percentage};

    #[test]
    fn empty_whole_is_zero() {
        assert_eq!(count_percentage(0, 0), Percentage::ZERO);
        assert_eq!(*count_percentage(6, 8), 75.);
    }

    #[test]
    fn displays_one_decimal() {
        assert_eq!(count_percentage(5, 7).to_string(), "71.4%");
        assert_eq!(count_percentage(3, 3).to_string(), "100.0%");
    }
}
