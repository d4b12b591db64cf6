use crate::args::ServeArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{server, Config, Result};
use tracing::info;

/// Serves the dashboard until Ctrl-C is pressed. The data file is created if it does not exist.
pub async fn serve(config: Config, args: ServeArgs) -> Result<Out<()>> {
    let addr = args.listen().unwrap_or_else(|| config.listen());
    info!("Serving {}", config.data_path().display());
    server::run(config.store(), addr)
        .await
        .pub_result(ErrorType::Service)?;
    Ok(Out::new_message("Dashboard stopped"))
}
