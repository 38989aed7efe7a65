//! Periods: the time keys variables are computed for.
//!
//! A `Period` is an immutable `(unit, start, size)` triple. Periods are totally
//! ordered (by start instant first) and know their predecessor, which is all the
//! evaluator needs. Parsing follows the usual `2013`, `2013-01`, `2013-01-15`
//! notation, ISO weeks (`2013-W05`, `2013-W05-3`), `month:2013-01:3` for
//! multi-unit periods and `ETERNITY`.
//!
//! Shifting a period never saturates: a shift past the calendar bounds is an
//! error, so a period and its predecessor are always distinct (eternity
//! aside, which has no predecessor other than itself).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

fn instant_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").expect("instant pattern is valid")
    })
}

fn week_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4})-W(\d{2})(?:-(\d))?$").expect("week pattern is valid"))
}

fn invalid(input: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidPeriod {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Granularity of a period.
///
/// Units are ordered from finest to coarsest, the ISO-calendar units first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateUnit {
    /// One day addressed by ISO week and weekday.
    WeekDay,
    /// One ISO week, Monday to Sunday.
    Week,
    /// One calendar day.
    Day,
    /// One calendar month.
    Month,
    /// One calendar year.
    Year,
    /// A single timeless period.
    Eternity,
}

impl DateUnit {
    /// Units addressed through the ISO week calendar.
    #[must_use]
    pub const fn is_isocalendar(self) -> bool {
        matches!(self, Self::WeekDay | Self::Week)
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WeekDay => write!(f, "week_day"),
            Self::Week => write!(f, "week"),
            Self::Day => write!(f, "day"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
            Self::Eternity => write!(f, "eternity"),
        }
    }
}

impl FromStr for DateUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week_day" | "weekday" => Ok(Self::WeekDay),
            "week" => Ok(Self::Week),
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "eternity" => Ok(Self::Eternity),
            other => Err(invalid(s, format!("unknown date unit '{other}'"))),
        }
    }
}

/// A calendar date at which a period starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instant(NaiveDate);

impl Instant {
    /// Creates an instant from year, month and day.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the date does not exist.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| invalid(&format!("{year:04}-{month:02}-{day:02}"), "no such date"))
    }

    /// Creates an instant from an ISO year, week and weekday (1 = Monday).
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the week or weekday does
    /// not exist.
    pub fn from_iso_week(year: i32, week: u32, weekday: u32) -> Result<Self, ValidationError> {
        let label = format!("{year:04}-W{week:02}-{weekday}");
        let weekday = match weekday {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            7 => Weekday::Sun,
            _ => return Err(invalid(&label, "weekday must be between 1 and 7")),
        };
        NaiveDate::from_isoywd_opt(year, week, weekday)
            .map(Self)
            .ok_or_else(|| invalid(&label, "no such week"))
    }

    /// Earliest representable instant, used as the start of eternity.
    #[must_use]
    pub const fn origin() -> Self {
        Self(NaiveDate::MIN)
    }

    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Calendar month, 1 to 12.
    #[must_use]
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of the month, 1 to 31.
    #[must_use]
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// ISO week number, 1 to 53.
    #[must_use]
    pub fn week(&self) -> u32 {
        self.0.iso_week().week()
    }

    /// ISO weekday, 1 (Monday) to 7 (Sunday).
    #[must_use]
    pub fn weekday(&self) -> u32 {
        self.0.weekday().number_from_monday()
    }

    /// Returns the underlying date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    /// Shifts the instant by `n` units. Month and year shifts clamp the day to
    /// the end of the target month. Eternity shifts are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the result falls outside
    /// the representable calendar.
    pub fn offset(&self, n: i64, unit: DateUnit) -> Result<Self, ValidationError> {
        let magnitude = n.unsigned_abs();
        let shifted = match unit {
            DateUnit::Eternity => Some(self.0),
            DateUnit::Day | DateUnit::WeekDay | DateUnit::Week => {
                let factor = if unit == DateUnit::Week { 7 } else { 1 };
                magnitude.checked_mul(factor).map(Days::new).and_then(|days| {
                    if n >= 0 {
                        self.0.checked_add_days(days)
                    } else {
                        self.0.checked_sub_days(days)
                    }
                })
            }
            DateUnit::Month | DateUnit::Year => {
                let factor = if unit == DateUnit::Year { 12 } else { 1 };
                magnitude
                    .checked_mul(factor)
                    .and_then(|months| u32::try_from(months).ok())
                    .and_then(|months| {
                        if n >= 0 {
                            self.0.checked_add_months(Months::new(months))
                        } else {
                            self.0.checked_sub_months(Months::new(months))
                        }
                    })
            }
        };
        shifted
            .map(Self)
            .ok_or_else(|| invalid(&format!("{self}{n:+}{unit}"), "out of calendar range"))
    }

    /// The first day of the enclosing `unit`: Monday for weeks, the 1st for
    /// months, January 1st for years. Day units and eternity return `self`.
    #[must_use]
    pub fn first_of(&self, unit: DateUnit) -> Self {
        let date = match unit {
            DateUnit::Week => self
                .0
                .checked_sub_days(Days::new(u64::from(self.0.weekday().num_days_from_monday()))),
            DateUnit::Month => self.0.with_day(1),
            DateUnit::Year => NaiveDate::from_ymd_opt(self.0.year(), 1, 1),
            DateUnit::WeekDay | DateUnit::Day | DateUnit::Eternity => Some(self.0),
        };
        Self(date.unwrap_or(self.0))
    }

    /// The last day of the enclosing `unit`: Sunday for weeks, the month's
    /// last day, December 31st for years. Day units and eternity return `self`.
    #[must_use]
    pub fn last_of(&self, unit: DateUnit) -> Self {
        let date = match unit {
            DateUnit::Week => self
                .0
                .checked_add_days(Days::new(u64::from(6 - self.0.weekday().num_days_from_monday()))),
            DateUnit::Month => self
                .0
                .with_day(1)
                .and_then(|first| first.checked_add_months(Months::new(1)))
                .and_then(|next| next.pred_opt()),
            DateUnit::Year => NaiveDate::from_ymd_opt(self.0.year(), 12, 31),
            DateUnit::WeekDay | DateUnit::Day | DateUnit::Eternity => Some(self.0),
        };
        Self(date.unwrap_or(self.0))
    }
}

impl From<NaiveDate> for Instant {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// An immutable, totally ordered time key.
///
/// # Examples
///
/// ```
/// use lazycalc::Period;
///
/// let january: Period = "2013-01".parse().unwrap();
/// let december = january.predecessor().unwrap();
/// assert_eq!(december.to_string(), "2012-12");
/// assert!(december < january);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    unit: DateUnit,
    start: Instant,
    size: u32,
}

/// Unchecked wire form; every deserialized period goes through `Period::new`.
#[derive(Deserialize)]
struct RawPeriod {
    unit: DateUnit,
    start: Instant,
    size: u32,
}

impl TryFrom<RawPeriod> for Period {
    type Error = ValidationError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.unit, raw.start, raw.size)
    }
}

impl Period {
    /// Creates a period of `size` units starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if `size` is zero or if a
    /// dated unit starts at the eternity origin.
    pub fn new(unit: DateUnit, start: Instant, size: u32) -> Result<Self, ValidationError> {
        if unit == DateUnit::Eternity {
            return Ok(Self::eternity());
        }
        if size == 0 {
            return Err(invalid(&format!("{unit}:{start}:0"), "size must be > 0"));
        }
        if start == Instant::origin() {
            return Err(invalid(&format!("{unit}:{start}:{size}"), "no such start instant"));
        }
        Ok(Self { unit, start, size })
    }

    /// A single calendar year.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` for an unrepresentable year.
    pub fn year(year: i32) -> Result<Self, ValidationError> {
        Self::new(DateUnit::Year, Instant::new(year, 1, 1)?, 1)
    }

    /// A single calendar month.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the month does not exist.
    pub fn month(year: i32, month: u32) -> Result<Self, ValidationError> {
        Self::new(DateUnit::Month, Instant::new(year, month, 1)?, 1)
    }

    /// A single calendar day.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the date does not exist.
    pub fn day(year: i32, month: u32, day: u32) -> Result<Self, ValidationError> {
        Self::new(DateUnit::Day, Instant::new(year, month, day)?, 1)
    }

    /// A single ISO week.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the week does not exist.
    pub fn week(year: i32, week: u32) -> Result<Self, ValidationError> {
        Self::new(DateUnit::Week, Instant::from_iso_week(year, week, 1)?, 1)
    }

    /// A single day addressed by ISO week and weekday.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the day does not exist.
    pub fn week_day(year: i32, week: u32, weekday: u32) -> Result<Self, ValidationError> {
        Self::new(DateUnit::WeekDay, Instant::from_iso_week(year, week, weekday)?, 1)
    }

    /// The timeless period. There is exactly one.
    #[must_use]
    pub const fn eternity() -> Self {
        Self {
            unit: DateUnit::Eternity,
            start: Instant::origin(),
            size: 1,
        }
    }

    /// Granularity of the period.
    #[must_use]
    pub const fn unit(&self) -> DateUnit {
        self.unit
    }

    /// First day covered.
    #[must_use]
    pub const fn start(&self) -> Instant {
        self.start
    }

    /// Number of units covered.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Returns true for the timeless period.
    #[must_use]
    pub fn is_eternity(&self) -> bool {
        self.unit == DateUnit::Eternity
    }

    /// Last day covered by the period, saturating at the end of the calendar.
    #[must_use]
    pub fn stop(&self) -> Instant {
        if self.is_eternity() {
            return Instant(NaiveDate::MAX);
        }
        self.start
            .offset(i64::from(self.size), self.unit)
            .and_then(|next| next.offset(-1, DateUnit::Day))
            .unwrap_or(Instant(NaiveDate::MAX))
    }

    /// The same-sized period shifted `n` units.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if the shifted start falls
    /// outside the representable calendar.
    pub fn offset(&self, n: i64) -> Result<Self, ValidationError> {
        if self.is_eternity() {
            return Ok(Self::eternity());
        }
        Self::new(self.unit, self.start.offset(n, self.unit)?, self.size)
    }

    /// The period immediately before this one, of the same unit and size.
    /// Eternity is its own predecessor.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` at the start of the calendar.
    pub fn predecessor(&self) -> Result<Self, ValidationError> {
        self.offset(-i64::from(self.size))
    }

    /// The calendar month preceding the start of this period.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` at the start of the calendar.
    pub fn last_month(&self) -> Result<Self, ValidationError> {
        let start = self.start.first_of(DateUnit::Month).offset(-1, DateUnit::Month)?;
        Self::new(DateUnit::Month, start, 1)
    }

    /// The calendar year preceding the start of this period.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` at the start of the calendar.
    pub fn last_year(&self) -> Result<Self, ValidationError> {
        let start = self.start.first_of(DateUnit::Year).offset(-1, DateUnit::Year)?;
        Self::new(DateUnit::Year, start, 1)
    }

    /// Returns true if `other` lies entirely within this period.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.is_eternity() || (self.start <= other.start && other.stop() <= self.stop())
    }

    fn is_canonical(&self) -> bool {
        let start = self.start;
        self.size == 1
            && match self.unit {
                DateUnit::Day | DateUnit::WeekDay | DateUnit::Eternity => true,
                DateUnit::Week => start.weekday() == 1,
                DateUnit::Month => start.day() == 1,
                DateUnit::Year => start.day() == 1 && start.month() == 1,
            }
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then(self.unit.cmp(&other.unit))
            .then(self.size.cmp(&other.size))
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_canonical() {
            return write!(f, "{}:{}:{}", self.unit, self.start, self.size);
        }
        let start = self.start.date();
        match self.unit {
            DateUnit::Eternity => write!(f, "ETERNITY"),
            DateUnit::Year => write!(f, "{}", start.format("%Y")),
            DateUnit::Month => write!(f, "{}", start.format("%Y-%m")),
            DateUnit::Day => write!(f, "{}", start.format("%Y-%m-%d")),
            DateUnit::Week => write!(f, "{}", start.format("%G-W%V")),
            DateUnit::WeekDay => write!(f, "{}", start.format("%G-W%V-%u")),
        }
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.eq_ignore_ascii_case("eternity") {
            return Ok(Self::eternity());
        }

        // `unit:start[:size]`
        if let Some((unit, rest)) = input.split_once(':') {
            let unit: DateUnit = unit.parse()?;
            let (start, size) = match rest.split_once(':') {
                Some((start, size)) => {
                    let size = size
                        .parse::<u32>()
                        .map_err(|e| invalid(s, format!("bad size: {e}")))?;
                    (start, size)
                }
                None => (rest, 1),
            };
            let base: Self = start.parse()?;
            if base.is_eternity() {
                return Err(invalid(s, "eternity cannot start a dated period"));
            }
            return Self::new(unit, base.start, size);
        }

        if let Some(caps) = week_pattern().captures(input) {
            let number = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());
            let year = number(1)
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| invalid(s, "bad year"))?;
            let week = number(2).ok_or_else(|| invalid(s, "bad week"))?;
            return match number(3) {
                None => Self::week(year, week),
                Some(weekday) => Self::week_day(year, week, weekday),
            }
            .map_err(|_| invalid(s, "no such week"));
        }

        let caps = instant_pattern()
            .captures(input)
            .ok_or_else(|| invalid(s, "expected YYYY, YYYY-MM, YYYY-MM-DD or YYYY-Www[-d]"))?;
        let number = |idx: usize| -> Result<Option<u32>, ValidationError> {
            caps.get(idx)
                .map(|m| m.as_str().parse::<u32>().map_err(|e| invalid(s, e.to_string())))
                .transpose()
        };
        let year = i32::try_from(number(1)?.unwrap_or_default())
            .map_err(|e| invalid(s, e.to_string()))?;
        match (number(2)?, number(3)?) {
            (None, _) => Self::year(year),
            (Some(month), None) => Self::month(year, month).map_err(|_| invalid(s, "no such month")),
            (Some(month), Some(day)) => {
                Self::day(year, month, day).map_err(|_| invalid(s, "no such date"))
            }
        }
    }
}

impl TryFrom<&str> for Period {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Period {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_month_year_day() {
        let month = p("2013-01");
        assert_eq!(month.unit(), DateUnit::Month);
        assert_eq!(month.start().month(), 1);
        assert_eq!(month.to_string(), "2013-01");

        assert_eq!(p("2014").unit(), DateUnit::Year);
        assert_eq!(p("2014").to_string(), "2014");
        assert_eq!(p("2014-02-28").unit(), DateUnit::Day);
        assert_eq!(p("2014-02-28").to_string(), "2014-02-28");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("2013-13".parse::<Period>().is_err());
        assert!("2013-02-30".parse::<Period>().is_err());
        assert!("13-01".parse::<Period>().is_err());
        assert!("month:2013-01:0".parse::<Period>().is_err());
        assert!("week:2013-01".parse::<Period>().is_ok());
        assert!("fortnight:2013-01".parse::<Period>().is_err());
        assert!("2013-W54".parse::<Period>().is_err());
        assert!("2013-W05-8".parse::<Period>().is_err());
    }

    #[test]
    fn test_unit_prefix_rejects_eternity_start() {
        let err = "month:ETERNITY".parse::<Period>().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPeriod { .. }));
        assert!("year:eternity:2".parse::<Period>().is_err());
        assert!(Period::new(DateUnit::Month, Instant::origin(), 1).is_err());
    }

    #[test]
    fn test_parse_sized_period() {
        let quarter = p("month:2013-01:3");
        assert_eq!(quarter.size(), 3);
        assert_eq!(quarter.stop().to_string(), "2013-03-31");
        assert_eq!(quarter.to_string(), "month:2013-01-01:3");
        assert_eq!(p(&quarter.to_string()), quarter);
    }

    #[test]
    fn test_parse_iso_weeks() {
        let week = p("2013-W05");
        assert_eq!(week.unit(), DateUnit::Week);
        assert_eq!(week.start().to_string(), "2013-01-28");
        assert_eq!(week.stop().to_string(), "2013-02-03");
        assert_eq!(week.to_string(), "2013-W05");

        let wednesday = p("2013-W05-3");
        assert_eq!(wednesday.unit(), DateUnit::WeekDay);
        assert_eq!(wednesday.start().to_string(), "2013-01-30");
        assert_eq!(wednesday.to_string(), "2013-W05-3");
        assert!(week.contains(&wednesday));

        // ISO week 1 of 2015 starts in 2014.
        assert_eq!(p("2015-W01").start().to_string(), "2014-12-29");
        assert_eq!(p("2015-W01").to_string(), "2015-W01");
    }

    #[test]
    fn test_week_predecessor() {
        assert_eq!(p("2013-W01").predecessor().unwrap(), p("2012-W52"));
        assert_eq!(p("2013-W01-1").predecessor().unwrap(), p("2012-W52-7"));
        assert!(DateUnit::Week.is_isocalendar());
        assert!(!DateUnit::Month.is_isocalendar());
    }

    #[test]
    fn test_eternity() {
        let eternity = p("ETERNITY");
        assert!(eternity.is_eternity());
        assert_eq!(eternity.predecessor().unwrap(), eternity);
        assert_eq!(eternity.to_string(), "ETERNITY");
        assert!(eternity.contains(&p("2013-01")));
    }

    #[test]
    fn test_predecessor_crosses_year_boundary() {
        assert_eq!(p("2013-01").predecessor().unwrap(), p("2012-12"));
        assert_eq!(p("2013").predecessor().unwrap(), p("2012"));
        assert_eq!(p("2013-03-01").predecessor().unwrap(), p("2013-02-28"));
        assert_eq!(p("month:2013-04:3").predecessor().unwrap(), p("month:2013-01:3"));
    }

    #[test]
    fn test_last_month_and_last_year() {
        assert_eq!(p("2013-01").last_month().unwrap(), p("2012-12"));
        assert_eq!(p("2013").last_month().unwrap(), p("2012-12"));
        assert_eq!(p("2013-06-15").last_month().unwrap(), p("2013-05"));
        assert_eq!(p("2013-06").last_year().unwrap(), p("2012"));
    }

    #[test]
    fn test_first_of_and_last_of() {
        let instant = Instant::new(2020, 12, 31).unwrap();
        assert_eq!(instant.first_of(DateUnit::Month), Instant::new(2020, 12, 1).unwrap());
        assert_eq!(instant.first_of(DateUnit::Year), Instant::new(2020, 1, 1).unwrap());
        // 2020-12-31 is a Thursday.
        assert_eq!(instant.first_of(DateUnit::Week), Instant::new(2020, 12, 28).unwrap());
        assert_eq!(instant.last_of(DateUnit::Week), Instant::new(2021, 1, 3).unwrap());

        let leap = Instant::new(2020, 2, 10).unwrap();
        assert_eq!(leap.last_of(DateUnit::Month), Instant::new(2020, 2, 29).unwrap());
        assert_eq!(leap.last_of(DateUnit::Year), Instant::new(2020, 12, 31).unwrap());
        assert_eq!(leap.first_of(DateUnit::Day), leap);
    }

    #[test]
    fn test_instant_offset() {
        let start = Instant::new(2020, 1, 1).unwrap();
        assert_eq!(start.offset(1, DateUnit::Year).unwrap(), Instant::new(2021, 1, 1).unwrap());
        assert_eq!(start.offset(-3, DateUnit::Day).unwrap(), Instant::new(2019, 12, 29).unwrap());
        assert_eq!(start.offset(2, DateUnit::Week).unwrap(), Instant::new(2020, 1, 15).unwrap());
        let jan31 = Instant::new(2020, 1, 31).unwrap();
        assert_eq!(jan31.offset(1, DateUnit::Month).unwrap(), Instant::new(2020, 2, 29).unwrap());
    }

    #[test]
    fn test_ordering_is_by_start_first() {
        let mut periods = vec![p("2013-02"), p("2012"), p("2013-01"), p("2013")];
        periods.sort();
        assert_eq!(periods, vec![p("2012"), p("2013-01"), p("2013"), p("2013-02")]);
    }

    #[test]
    fn test_contains() {
        assert!(p("2013").contains(&p("2013-07")));
        assert!(!p("2013-07").contains(&p("2013")));
        assert!(!p("2013").contains(&p("2014-01")));
    }

    #[test]
    fn test_offset_past_calendar_bounds_is_an_error() {
        let eternity = Period::eternity();
        assert_eq!(eternity.offset(-5).unwrap(), eternity);

        let err = p("2013-01").offset(-1_000_000_000).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPeriod { .. }));
        assert!(p("2013-01-01").offset(i64::MIN).is_err());

        let first = Period::new(DateUnit::Day, Instant(NaiveDate::MIN.succ_opt().unwrap()), 1).unwrap();
        assert!(first.predecessor().is_err());
    }

    #[test]
    fn test_period_serialization() {
        let period = p("2013-01");
        let json = serde_json::to_string(&period).unwrap();
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }

    #[test]
    fn test_deserialization_validates() {
        let zero = r#"{"unit":"month","start":"2013-01-01","size":0}"#;
        assert!(serde_json::from_str::<Period>(zero).is_err());

        let week = r#"{"unit":"week","start":"2013-01-28","size":2}"#;
        let period: Period = serde_json::from_str(week).unwrap();
        assert_eq!(period.stop().to_string(), "2013-02-10");
    }
}
