use crate::args::GenerateArgs;
use crate::commands::Out;
use crate::sample;
use crate::store::Store;
use crate::{Config, Result};

/// Replaces the data file with `args.num()` sample records generated from `args.seed()`.
pub async fn generate(config: Config, args: GenerateArgs) -> Result<Out<usize>> {
    let records = sample::generate(args.num(), args.seed());
    config.store().replace_all(&records).await?;
    Ok(Out::new(
        format!(
            "Generated {} sample records in {}",
            records.len(),
            config.data_path().display()
        ),
        records.len(),
    ))
}
