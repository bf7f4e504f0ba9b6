//! `prodev serve`.

use console::style;

use pd_core::config::AppConfig;
use pd_core::error::PdResult;

pub async fn run(mut config: AppConfig, bind: Option<String>) -> PdResult<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    println!(
        "  {} Serving on http://{}",
        style("=>").cyan().bold(),
        config.server.bind
    );
    pd_server::run_server(config).await
}
