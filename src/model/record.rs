use crate::error::{ErrorType, IntoResult, Res};
use crate::model::Amount;
use crate::Result;
use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// The canonical textual form of a date in the backing file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The header row of the backing file. Columns are always written in this order.
pub const HEADERS: [&str; 5] = ["date", "sales", "expenses", "region", "product"];

/// Times of day that may follow a date after a space, e.g. `2023-01-05 13:45:00`.
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Parses `s` into a date, discarding any time-of-day that follows the date.
///
/// Accepts `2023-01-05`, `2023-01-05T13:45:00` and `2023-01-05 13:45:00`. Whatever follows a `T`
/// is dropped, but text after a space must be a time of day. Anything else is an
/// `ErrorType::MalformedDate`.
pub fn normalize_date(s: &str) -> Result<NaiveDate> {
    parse_date(s).pub_result(ErrorType::MalformedDate)
}

fn parse_date(s: &str) -> Res<NaiveDate> {
    let trimmed = s.trim();
    let day = match trimmed.split_once('T') {
        Some((day, _)) => day,
        None => match trimmed.split_once(' ') {
            Some((day, time)) => {
                parse_time(time.trim()).with_context(|| {
                    format!("Unable to parse '{trimmed}' as a date followed by a time of day")
                })?;
                day
            }
            None => trimmed,
        },
    };
    if day.is_empty() {
        bail!("An empty date cannot be parsed");
    }
    NaiveDate::parse_from_str(day, DATE_FORMAT)
        .with_context(|| format!("Unable to parse '{trimmed}' as a YYYY-MM-DD date"))
}

fn parse_time(s: &str) -> Res<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(s, format).ok())
        .with_context(|| format!("'{s}' is not a time of day"))
}

/// A single sales/expenses transaction as it is stored in the backing file.
///
/// `profit` is never stored, it is derived with `Record::profit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    sales: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    expenses: Decimal,
    region: String,
    product: String,
}

impl Record {
    pub fn new(
        date: NaiveDate,
        sales: Decimal,
        expenses: Decimal,
        region: impl Into<String>,
        product: impl Into<String>,
    ) -> Self {
        Self {
            date,
            sales,
            expenses,
            region: region.into(),
            product: product.into(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sales(&self) -> Decimal {
        self.sales
    }

    pub fn expenses(&self) -> Decimal {
        self.expenses
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    /// `sales - expenses`. Returns `None` on overflow.
    pub fn profit(&self) -> Option<Decimal> {
        self.sales.checked_sub(self.expenses)
    }

    /// The values of this record in `HEADERS` order, as they are written to the backing file.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.date.format(DATE_FORMAT).to_string(),
            self.sales.to_string(),
            self.expenses.to_string(),
            self.region.clone(),
            self.product.clone(),
        ]
    }
}

/// A row of the backing file before any of its values have been interpreted. Missing trailing
/// columns come through as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawRow {
    date: String,
    sales: String,
    expenses: String,
    region: String,
    product: String,
}

impl TryFrom<RawRow> for Record {
    type Error = anyhow::Error;

    fn try_from(row: RawRow) -> Res<Self> {
        let date = parse_date(&row.date)?;
        let sales = parse_amount("sales", &row.sales)?;
        let expenses = parse_amount("expenses", &row.expenses)?;
        if row.region.trim().is_empty() {
            bail!("The region is empty");
        }
        if row.product.trim().is_empty() {
            bail!("The product is empty");
        }
        Ok(Record::new(date, sales, expenses, row.region, row.product))
    }
}

fn parse_amount(name: &str, value: &str) -> Res<Decimal> {
    Amount::from_str(value)
        .map(|a| a.value())
        .with_context(|| format!("Unable to parse {name} '{value}' as a number"))
}

/// A candidate record that is ready to be appended. The date is still in the form it was
/// received in and is normalized by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub date: String,
    pub sales: Decimal,
    pub expenses: Decimal,
    pub region: String,
    pub product: String,
}

impl Entry {
    /// Normalizes the date and produces the `Record` that should be stored.
    pub fn record(&self) -> Result<Record> {
        let date = normalize_date(&self.date)?;
        Ok(Record::new(
            date,
            self.sales,
            self.expenses,
            self.region.trim(),
            self.product.trim(),
        ))
    }
}

/// The raw data entry form as the dashboard receives it. Every field is optional here because the
/// browser sends whatever the person has filled in so far.
///
/// Amounts may arrive as JSON numbers or strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    #[serde(deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub sales: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub expenses: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub region: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub product: Option<String>,
}

impl Submission {
    /// Returns the `Entry` if every field is present, non-blank, and the amounts are numbers.
    /// Otherwise the submission is incomplete and `None` is returned.
    pub fn entry(&self) -> Option<Entry> {
        let date = non_blank(&self.date)?;
        let sales = Amount::from_str(non_blank(&self.sales)?).ok()?.value();
        let expenses = Amount::from_str(non_blank(&self.expenses)?).ok()?.value();
        let region = non_blank(&self.region)?;
        let product = non_blank(&self.product)?;
        Some(Entry {
            date: date.to_string(),
            sales,
            expenses,
            region: region.to_string(),
            product: product.to_string(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
