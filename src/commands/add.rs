use crate::args::AddArgs;
use crate::commands::Out;
use crate::error::{Error, ErrorType};
use crate::model::{Record, Submission};
use crate::store::Store;
use crate::{Config, Result};
use anyhow::anyhow;

/// Appends one record to the data file.
///
/// # Errors
/// - `ErrorType::Input` if the sales or expenses are not numbers, or a field is blank.
/// - `ErrorType::MalformedDate` if the date is not `YYYY-MM-DD`. Nothing is written.
/// - `ErrorType::Store` if the data file cannot be written.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<Record>> {
    let submission = Submission {
        date: Some(args.date),
        sales: Some(args.sales),
        expenses: Some(args.expenses),
        region: Some(args.region),
        product: Some(args.product),
    };
    let entry = submission.entry().ok_or_else(|| {
        Error::new(
            ErrorType::Input,
            anyhow!("Every field must be filled in and sales and expenses must be numbers"),
        )
    })?;
    let record = config.store().append(&entry).await?;
    let [date, sales, expenses, region, product] = record.to_row();
    Ok(Out::new(
        format!("Added {date}: sales {sales}, expenses {expenses}, {region}, {product}"),
        record,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    fn args(date: &str, sales: &str) -> AddArgs {
        AddArgs {
            date: date.into(),
            sales: sales.into(),
            expenses: "400".into(),
            region: "North".into(),
            product: "Electronics".into(),
        }
    }

    #[tokio::test]
    async fn test_add() {
        let env = TestEnv::new().await;
        let out = add(env.config(), args("2023-01-05T09:00:00", "$1,000"))
            .await
            .unwrap();
        assert_eq!(
            out.message(),
            "Added 2023-01-05: sales 1000, expenses 400, North, Electronics"
        );
        let records = env.config().store().read_all().await.unwrap();
        assert_eq!(records.records(), &[out.structure().unwrap().clone()]);
    }

    #[tokio::test]
    async fn test_add_bad_amount() {
        let env = TestEnv::new().await;
        let err = add(env.config(), args("2023-01-05", "lots")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Input);
    }

    #[tokio::test]
    async fn test_add_bad_date() {
        let env = TestEnv::new().await;
        let err = add(env.config(), args("yesterday", "1")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::MalformedDate);
        assert!(env.config().store().read_all().await.unwrap().is_empty());
    }
}
