use crate::commands::Out;
use crate::{sample, Config, Result};

/// Prompts on stdout for records typed on stdin and appends each one to the data file until stdin
/// is closed.
pub async fn interactive(config: Config) -> Result<Out<usize>> {
    let store = config.store();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let count = sample::interactive(&store, stdin.lock(), &mut stdout).await?;
    Ok(Out::new(
        format!(
            "Added {count} new records to {}",
            config.data_path().display()
        ),
        count,
    ))
}
