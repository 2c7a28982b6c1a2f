//! # Derived Values
//!
//! Pure functions that turn stored records into display values: ages, dates
//! rendered in the user's preferred format, currency amounts, species and
//! event labels, unit conversions, and contact validation. Nothing here does
//! I/O; callers pass `today` explicitly so results are reproducible.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    CurrencyPosition, CurrencySettings, DateFormat, EventType, HeightUnit, Species, WeightUnit,
};

////////////////////////////////////////////////// Age /////////////////////////////////////////////////

/// An age broken into years, months, and (approximate) days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedAge {
    /// Whole years.
    pub years: u32,
    /// Whole months past the last full year.
    pub months: u32,
    /// Total days modulo 30.
    pub days: u32,
}

fn end_of_life(death: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    death.unwrap_or(today)
}

fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months = (end.year() as i64 - start.year() as i64) * 12 + end.month() as i64
        - start.month() as i64;
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

/// Whole years between `birth` and `death` (or `today` when still alive).
///
/// Returns 0 when the birth date is unknown or lies after the end date.
pub fn calculate_age(birth: Option<NaiveDate>, death: Option<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(birth) = birth else {
        return 0;
    };
    let end = end_of_life(death, today);
    if birth > end {
        return 0;
    }
    (whole_months_between(birth, end) / 12) as u32
}

/// Years, months modulo 12, and total days modulo 30.
pub fn calculate_detailed_age(
    birth: Option<NaiveDate>,
    death: Option<NaiveDate>,
    today: NaiveDate,
) -> DetailedAge {
    let Some(birth) = birth else {
        return DetailedAge::default();
    };
    let end = end_of_life(death, today);
    if birth > end {
        return DetailedAge::default();
    }
    let months = whole_months_between(birth, end);
    DetailedAge {
        years: (months / 12) as u32,
        months: (months % 12) as u32,
        days: ((end - birth).num_days() % 30) as u32,
    }
}

/// The next anniversary of `birth` on or after `today`.
///
/// February 29 birthdays fall on February 28 in common years.
pub fn next_birthday(birth: NaiveDate, today: NaiveDate) -> NaiveDate {
    let in_year = |year: i32| {
        NaiveDate::from_ymd_opt(year, birth.month(), birth.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, birth.month(), 28))
            .unwrap_or(today)
    };
    let this_year = in_year(today.year());
    if this_year < today {
        in_year(today.year() + 1)
    } else {
        this_year
    }
}

/// Short relative label for an upcoming birthday.
pub fn birthday_label(next: NaiveDate, today: NaiveDate) -> String {
    match (next - today).num_days() {
        0 => "Today!".to_string(),
        1 => "Tomorrow".to_string(),
        n if (2..=7).contains(&n) => format!("In {} days", n),
        _ => next.format("%b %-d").to_string(),
    }
}

///////////////////////////////////////////////// Dates ////////////////////////////////////////////////

/// Parses a timestamp given either as RFC 3339 or as a bare calendar date.
///
/// Bare dates (`2024-03-01`) and `datetime-local` values (`2024-03-01T09:30`)
/// are taken as UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses a calendar date, accepting full timestamps too.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(input).map(|ts| ts.date_naive()))
}

/// `Jan 05, 2024`, or `Unknown` when there is no date.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%b %d, %Y").to_string(),
        None => "Unknown".to_string(),
    }
}

/// `Jan 05, 2024 14:30`, or `Unknown` when there is no timestamp.
pub fn format_date_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%b %d, %Y %H:%M").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Renders a date in the user's chosen numeric format.
pub fn format_date_with(date: NaiveDate, format: DateFormat) -> String {
    let pattern = match format {
        DateFormat::MonthDayYear => "%m/%d/%Y",
        DateFormat::DayMonthYear => "%d/%m/%Y",
        DateFormat::YearMonthDay => "%Y-%m-%d",
    };
    date.format(pattern).to_string()
}

//////////////////////////////////////////////// Currency //////////////////////////////////////////////

/// Formats an amount with the user's currency symbol, placement, and precision.
pub fn format_currency(amount: f64, currency: &CurrencySettings) -> String {
    if !amount.is_finite() {
        let fraction = if currency.decimals > 0 { ".00" } else { "" };
        return format!("{}0{}", currency.symbol, fraction);
    }

    let absolute = amount.abs();
    let digits = if currency.decimals == 0 {
        format!("{}", absolute.round())
    } else {
        format!("{:.*}", currency.decimals as usize, absolute)
    };
    let sign = if amount < 0.0 { "-" } else { "" };

    match currency.position {
        CurrencyPosition::Before => format!("{}{}{}", sign, currency.symbol, digits),
        CurrencyPosition::After => format!("{}{}{}", sign, digits, currency.symbol),
    }
}

///////////////////////////////////////////////// Labels ///////////////////////////////////////////////

impl Species {
    /// Human-readable species name.
    pub fn label(&self) -> &'static str {
        match self {
            Species::Horse => "Horse",
            Species::Dog => "Dog",
            Species::Cat => "Cat",
            Species::Pig => "Pig",
            Species::Goat => "Goat",
            Species::Llama => "Llama",
            Species::Alpaca => "Alpaca",
            Species::Ferret => "Ferret",
            Species::Parrot => "Parrot",
            Species::BirdOfPrey => "Bird of Prey",
            Species::Rabbit => "Rabbit",
            Species::Sheep => "Sheep",
            Species::Cow => "Cow",
            Species::Chicken => "Chicken",
            Species::Duck => "Duck",
            Species::Other => "Other",
        }
    }

    /// Badge color classes for this species.
    pub fn badge_class(&self) -> &'static str {
        match self {
            Species::Horse => "bg-amber-100 text-amber-800",
            Species::Dog => "bg-blue-100 text-blue-800",
            Species::Cat => "bg-purple-100 text-purple-800",
            Species::Pig => "bg-pink-100 text-pink-800",
            Species::Goat => "bg-green-100 text-green-800",
            Species::Llama => "bg-yellow-100 text-yellow-800",
            Species::Alpaca => "bg-indigo-100 text-indigo-800",
            Species::Ferret => "bg-gray-100 text-gray-800",
            Species::Parrot => "bg-red-100 text-red-800",
            Species::BirdOfPrey => "bg-orange-100 text-orange-800",
            Species::Rabbit => "bg-emerald-100 text-emerald-800",
            Species::Sheep => "bg-slate-100 text-slate-800",
            Species::Cow => "bg-stone-100 text-stone-800",
            Species::Chicken => "bg-lime-100 text-lime-800",
            Species::Duck => "bg-cyan-100 text-cyan-800",
            Species::Other => "bg-neutral-100 text-neutral-800",
        }
    }
}

impl EventType {
    /// Human-readable event category.
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Medical => "Medical",
            EventType::Surgical => "Surgical",
            EventType::Behavioral => "Behavioral",
            EventType::Lifecycle => "Lifecycle",
            EventType::Grooming => "Grooming",
            EventType::Nutrition => "Nutrition",
            EventType::Exercise => "Exercise",
            EventType::General => "General",
        }
    }

    /// Badge color classes for this event category.
    pub fn badge_class(&self) -> &'static str {
        match self {
            EventType::Medical => "bg-red-100 text-red-800 border-red-200",
            EventType::Surgical => "bg-orange-100 text-orange-800 border-orange-200",
            EventType::Behavioral => "bg-purple-100 text-purple-800 border-purple-200",
            EventType::Lifecycle => "bg-pink-100 text-pink-800 border-pink-200",
            EventType::Grooming => "bg-blue-100 text-blue-800 border-blue-200",
            EventType::Nutrition => "bg-green-100 text-green-800 border-green-200",
            EventType::Exercise => "bg-yellow-100 text-yellow-800 border-yellow-200",
            EventType::General => "bg-gray-100 text-gray-800 border-gray-200",
        }
    }
}

////////////////////////////////////////////////// Units ///////////////////////////////////////////////

const KG_PER_LB: f64 = 0.453592;
const LBS_PER_KG: f64 = 2.20462;
const CM_PER_INCH: f64 = 2.54;
const INCHES_PER_HAND: f64 = 4.0;

/// Converts a weight between units.
pub fn convert_weight(value: f64, from: WeightUnit, to: WeightUnit) -> f64 {
    match (from, to) {
        (WeightUnit::Lbs, WeightUnit::Kg) => value * KG_PER_LB,
        (WeightUnit::Kg, WeightUnit::Lbs) => value * LBS_PER_KG,
        _ => value,
    }
}

/// Converts a height between units, going through inches.
pub fn convert_height(value: f64, from: HeightUnit, to: HeightUnit) -> f64 {
    if from == to {
        return value;
    }
    let inches = match from {
        HeightUnit::Inches => value,
        HeightUnit::Cm => value / CM_PER_INCH,
        HeightUnit::Hands => value * INCHES_PER_HAND,
    };
    match to {
        HeightUnit::Inches => inches,
        HeightUnit::Cm => inches * CM_PER_INCH,
        HeightUnit::Hands => inches / INCHES_PER_HAND,
    }
}

/// Horses are measured in hands; everything else in inches.
pub fn default_height_unit(species: Species) -> HeightUnit {
    match species {
        Species::Horse => HeightUnit::Hands,
        _ => HeightUnit::Inches,
    }
}

/// Pounds regardless of species.
pub fn default_weight_unit(_species: Species) -> WeightUnit {
    WeightUnit::Lbs
}

///////////////////////////////////////////////// Contact //////////////////////////////////////////////

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{0,15}$").expect("phone pattern compiles"));

/// Loose `local@domain.tld` check.
pub fn validate_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Accepts up to 16 digits with an optional leading `+`, ignoring punctuation.
pub fn validate_phone_number(phone: &str) -> bool {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    PHONE.is_match(&cleaned)
}

/// Formats ten-digit numbers as `(555) 123-4567`; anything else is returned as-is.
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        phone.to_string()
    }
}

////////////////////////////////////////////// Serde helpers ///////////////////////////////////////////

/// Optional calendar date stored as `YYYY-MM-DD`; unparseable input reads as absent.
pub(crate) mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_date))
    }
}

/// Timestamp written as RFC 3339 but read from RFC 3339 or a bare date.
pub(crate) mod flexible_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp {:?}", raw)))
    }
}

/// Optional enum field where a blank string reads as absent.
pub(crate) mod blank_as_none {
    use serde::de::value::{Error as ValueError, StrDeserializer};
    use serde::de::{DeserializeOwned, Error as _, IntoDeserializer};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => {
                let text: StrDeserializer<'_, ValueError> = raw.trim().into_deserializer();
                T::deserialize(text).map(Some).map_err(D::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

/// Optional number sent either as a number or as text.
///
/// Blank text reads as absent. Text that is not a number reads as NaN, so range
/// checks downstream reject it with their own message.
pub(crate) mod form_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
            None => None,
            Some(NumberOrText::Number(n)) => Some(n),
            Some(NumberOrText::Text(text)) if text.trim().is_empty() => None,
            Some(NumberOrText::Text(text)) => Some(text.trim().parse().unwrap_or(f64::NAN)),
        })
    }
}
