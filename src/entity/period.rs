use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive span of calendar days carried by date mentions, events and
/// reference annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Builds a period, swapping the bounds if they are given backwards.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Period { start, end }
        } else {
            Period {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(date: NaiveDate) -> Self {
        Period {
            start: date,
            end: date,
        }
    }

    /// Parses `yyyy-MM-dd`, `yyyy-MM` or `yyyy`, producing the smallest period
    /// covering the stated precision.
    pub fn parse_partial(text: &str) -> Result<Self> {
        let text = text.trim();
        let parts: Vec<&str> = text.split('-').collect();
        let year: i32 = parts
            .first()
            .ok_or_else(|| anyhow!("Empty date"))?
            .parse()
            .map_err(|_| anyhow!("Invalid year in date '{}'", text))?;

        match parts.len() {
            1 => {
                let start = ymd(year, 1, 1, text)?;
                let end = ymd(year, 12, 31, text)?;
                Ok(Period::new(start, end))
            }
            2 => {
                let month: u32 = parts[1]
                    .parse()
                    .map_err(|_| anyhow!("Invalid month in date '{}'", text))?;
                let start = ymd(year, month, 1, text)?;
                let next = if month == 12 {
                    ymd(year + 1, 1, 1, text)?
                } else {
                    ymd(year, month + 1, 1, text)?
                };
                let end = next
                    .pred_opt()
                    .ok_or_else(|| anyhow!("Date out of range '{}'", text))?;
                Ok(Period::new(start, end))
            }
            3 => {
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map_err(|e| anyhow!("Invalid date '{}': {}", text, e))?;
                Ok(Period::single(date))
            }
            _ => Err(anyhow!("Unrecognized date format '{}'", text)),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Extends this period so that it also encloses `other`.
    pub fn merge(&mut self, other: &Period) {
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start.format("%Y-%m-%d"))
        } else {
            write!(
                f,
                "{}/{}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            )
        }
    }
}

fn ymd(year: i32, month: u32, day: u32, text: &str) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| anyhow!("Invalid date '{}'", text))
}

/// The period requested by the user. Either bound may be missing, in which
/// case it places no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateWindow { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive check of a single day against both bounds.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// The bounds that are actually set, in order.
    pub fn bounds(&self) -> Vec<NaiveDate> {
        self.start.iter().chain(self.end.iter()).copied().collect()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |d: Option<NaiveDate>| d.map_or("*".to_string(), |d| d.to_string());
        write!(f, "[{} .. {}]", show(self.start), show(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_partial_precisions() {
        assert_eq!(
            Period::parse_partial("2012-05-06").unwrap(),
            Period::single(d(2012, 5, 6))
        );
        assert_eq!(
            Period::parse_partial("2012-02").unwrap(),
            Period::new(d(2012, 2, 1), d(2012, 2, 29))
        );
        assert_eq!(
            Period::parse_partial("2012").unwrap(),
            Period::new(d(2012, 1, 1), d(2012, 12, 31))
        );
        assert!(Period::parse_partial("May 2012").is_err());
        assert!(Period::parse_partial("").is_err());
    }

    #[test]
    fn test_merge_and_contains() {
        let mut p = Period::single(d(2012, 5, 6));
        p.merge(&Period::single(d(2012, 5, 1)));
        p.merge(&Period::new(d(2012, 5, 3), d(2012, 5, 10)));
        assert_eq!(p, Period::new(d(2012, 5, 1), d(2012, 5, 10)));
        assert!(p.contains(d(2012, 5, 1)));
        assert!(p.contains(d(2012, 5, 10)));
        assert!(!p.contains(d(2012, 5, 11)));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = DateWindow::new(Some(d(2012, 1, 1)), Some(d(2012, 12, 31)));
        assert!(w.contains(d(2012, 1, 1)));
        assert!(w.contains(d(2012, 12, 31)));
        assert!(!w.contains(d(2013, 1, 1)));
        assert!(DateWindow::default().contains(d(1900, 1, 1)));
        assert_eq!(w.bounds().len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::single(d(2012, 5, 6)).to_string(), "2012-05-06");
        assert_eq!(
            Period::new(d(2012, 5, 6), d(2012, 5, 8)).to_string(),
            "2012-05-06/2012-05-08"
        );
    }
}
