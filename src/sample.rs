//! Sample data for the dashboard: a seeded random generator and an interactive prompt.

use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Amount, Entry, Product, Record, Region, DATE_FORMAT};
use crate::store::Store;
use crate::Result;
use anyhow::bail;
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::debug;

/// The seed used when none is given, so that repeated runs produce the same data.
pub const DEFAULT_SEED: u64 = 42;

/// The number of records generated when no count is given.
pub const DEFAULT_COUNT: usize = 1000;

/// Dates are drawn from the 365 days starting on this date.
const WINDOW_START: (i32, u32, u32) = (2023, 1, 1);
const WINDOW_DAYS: u64 = 365;

/// Produces `count` random records. The same `seed` always produces the same records.
///
/// Sales are whole amounts in `[1000, 5000)` and expenses in `[500, 2500)`. Regions and products
/// are drawn evenly from `Region::ALL` and `Product::ALL`.
pub fn generate(count: usize, seed: u64) -> Vec<Record> {
    let (y, m, d) = WINDOW_START;
    let start = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let date = start + Days::new(rng.gen_range(0..WINDOW_DAYS));
            let sales = Decimal::from(rng.gen_range(1000..5000_i64));
            let expenses = Decimal::from(rng.gen_range(500..2500_i64));
            let region = Region::ALL[rng.gen_range(0..Region::ALL.len())];
            let product = Product::ALL[rng.gen_range(0..Product::ALL.len())];
            Record::new(date, sales, expenses, region.to_string(), product.to_string())
        })
        .collect()
}

/// Prompts for records on `output` and reads the answers from `input` until the input ends.
///
/// Each record is appended to `store` as soon as it has been entered. A bad answer prints an error
/// and starts the record over. Region and product answers are capitalized, so `north` is stored
/// as `North`. Returns the number of records appended.
pub async fn interactive<S, R, W>(store: &S, input: R, output: &mut W) -> Result<usize>
where
    S: Store + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();
    let mut count = 0;
    loop {
        let entry = match read_entry(&mut lines, output).pub_result(ErrorType::Input)? {
            Prompted::Entry(entry) => entry,
            Prompted::Invalid(message) => {
                say(output, &format!("Error: {message}. Please try again."))
                    .pub_result(ErrorType::Input)?;
                continue;
            }
            Prompted::Finished => break,
        };
        match store.append(&entry).await {
            Ok(record) => {
                debug!("Interactive entry appended: {record:?}");
                count += 1;
            }
            Err(e) if e.error_type() == ErrorType::MalformedDate => {
                say(output, &format!("Error: {e}. Please try again."))
                    .pub_result(ErrorType::Input)?
            }
            Err(e) => return Err(e),
        }
    }
    say(output, &format!("\nAdded {count} new records")).pub_result(ErrorType::Input)?;
    Ok(count)
}

enum Prompted {
    Entry(Entry),
    Invalid(String),
    Finished,
}

fn read_entry<I, W>(lines: &mut I, output: &mut W) -> Res<Prompted>
where
    I: Iterator<Item = std::io::Result<String>>,
    W: Write,
{
    say(output, "\nNew entry (end the input, e.g. Ctrl-D, to finish):")?;

    macro_rules! ask {
        ($question:expr) => {
            match prompt(lines, output, $question)? {
                Some(answer) => answer,
                None => return Ok(Prompted::Finished),
            }
        };
    }

    let date = ask!("Date (YYYY-MM-DD): ");
    let date = match NaiveDate::parse_from_str(date.trim(), DATE_FORMAT) {
        Ok(d) => d,
        Err(e) => return Ok(Prompted::Invalid(format!("invalid date '{}': {e}", date.trim()))),
    };
    let sales = match parse_amount("sales", &ask!("Sales amount: ")) {
        Ok(v) => v,
        Err(e) => return Ok(Prompted::Invalid(e.to_string())),
    };
    let expenses = match parse_amount("expenses", &ask!("Expenses amount: ")) {
        Ok(v) => v,
        Err(e) => return Ok(Prompted::Invalid(e.to_string())),
    };
    let region = capitalize(&ask!(&format!("Region ({}): ", options(&Region::ALL))));
    if region.is_empty() {
        return Ok(Prompted::Invalid("the region cannot be empty".into()));
    }
    let product = capitalize(&ask!(&format!("Product ({}): ", options(&Product::ALL))));
    if product.is_empty() {
        return Ok(Prompted::Invalid("the product cannot be empty".into()));
    }

    Ok(Prompted::Entry(Entry {
        date: date.format(DATE_FORMAT).to_string(),
        sales,
        expenses,
        region,
        product,
    }))
}

/// Writes `question` and reads one line. `None` means the input has ended.
fn prompt<I, W>(lines: &mut I, output: &mut W, question: &str) -> Res<Option<String>>
where
    I: Iterator<Item = std::io::Result<String>>,
    W: Write,
{
    write!(output, "{question}")?;
    output.flush()?;
    Ok(lines.next().transpose()?)
}

fn say<W: Write>(output: &mut W, message: &str) -> Res<()> {
    writeln!(output, "{message}")?;
    Ok(())
}

fn parse_amount(name: &str, answer: &str) -> Res<Decimal> {
    if answer.trim().is_empty() {
        bail!("the {name} amount cannot be empty");
    }
    match Amount::from_str(answer) {
        Ok(amount) => Ok(amount.value()),
        Err(e) => bail!("invalid {name} amount '{}': {e}", answer.trim()),
    }
}

fn options<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

/// `nORTH` -> `North`.
fn capitalize(s: &str) -> String {
    let lower = s.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::io::Cursor;

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(50, DEFAULT_SEED);
        let b = generate(50, DEFAULT_SEED);
        assert_eq!(a.len(), 50);
        assert_eq!(a, b);
        assert_ne!(a, generate(50, 7));
    }

    #[test]
    fn test_generate_ranges() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        for record in generate(500, 1) {
            assert!(record.date() >= start && record.date() <= end);
            assert!(record.sales() >= Decimal::from(1000) && record.sales() < Decimal::from(5000));
            assert!(
                record.expenses() >= Decimal::from(500) && record.expenses() < Decimal::from(2500)
            );
            assert!(record.region().parse::<Region>().is_ok());
            assert!(record.product().parse::<Product>().is_ok());
        }
    }

    #[test]
    fn test_generate_zero() {
        assert!(generate(0, DEFAULT_SEED).is_empty());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("nORTH"), "North");
        assert_eq!(capitalize("  electronics "), "Electronics");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn test_interactive_appends_until_end_of_input() {
        let store = MemoryStore::new();
        let input = "2023-01-05\n1000\n400\nnorth\nelectronics\n\
                     2023-13-01\n\
                     2023-02-01\nabc\n\
                     2023-02-01\n500\n100\nSOUTH\napparel\n\
                     2023-03-01\n10\n";
        let mut output = Vec::new();
        let count = interactive(&store, Cursor::new(input), &mut output)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let records = store.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.records()[0].region(), "North");
        assert_eq!(records.records()[0].product(), "Electronics");
        assert_eq!(records.records()[1].region(), "South");
        assert_eq!(records.records()[1].sales(), Decimal::from(500));

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Region (North/South/East/West): "));
        assert!(text.contains("Error: invalid date '2023-13-01'"));
        assert!(text.contains("Error: invalid sales amount 'abc'"));
        assert!(text.ends_with("Added 2 new records\n"));
    }

    #[tokio::test]
    async fn test_interactive_empty_input() {
        let store = MemoryStore::new();
        let mut output = Vec::new();
        let count = interactive(&store, Cursor::new(""), &mut output)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(store.contents().await.is_none());
    }
}
