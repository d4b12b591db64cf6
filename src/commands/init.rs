use crate::args::InitArgs;
use crate::commands::Out;
use crate::store::Store;
use crate::{Config, Result};
use std::path::{Path, PathBuf};

/// Creates the kpi home directory and:
/// - Writes `config.json` using the data file and listen address from `args`, or their defaults
/// - Creates the data file with its header row, unless it already exists
///
/// # Arguments
/// - `kpi_home` - The directory that will be the root of data directory, e.g. `$HOME/kpi`
/// - `args` - Optional overrides for the data file location and the server address.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(kpi_home: &Path, args: &InitArgs) -> Result<Out<PathBuf>> {
    let config = Config::create(kpi_home, args.data_file(), args.listen()).await?;
    config.store().initialize().await?;
    let data_path = config.data_path().to_path_buf();
    Ok(Out::new(
        format!(
            "Successfully created the kpi directory at {} with data file {}",
            config.root().display(),
            data_path.display()
        ),
        data_path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_everything() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("kpi");
        let out = init(&home, &InitArgs::new(None, None)).await.unwrap();
        let data_path = out.structure().unwrap();
        assert_eq!(
            std::fs::read_to_string(data_path).unwrap(),
            "date,sales,expenses,region,product\n"
        );
        assert!(home.join("config.json").is_file());
        assert!(out.message().contains("Successfully created"));
    }

    #[tokio::test]
    async fn test_init_twice_keeps_data() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("kpi");
        let out = init(&home, &InitArgs::new(None, None)).await.unwrap();
        let data_path = out.structure().unwrap().clone();
        std::fs::write(
            &data_path,
            "date,sales,expenses,region,product\n2023-01-05,1,1,North,Apparel\n",
        )
        .unwrap();
        init(&home, &InitArgs::new(None, None)).await.unwrap();
        assert!(std::fs::read_to_string(&data_path)
            .unwrap()
            .contains("2023-01-05"));
    }
}
