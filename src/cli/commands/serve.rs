use std::net::SocketAddr;

use clap::Args;

use crate::app;

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, help = "Bind address, overrides API_HOST/API_PORT (e.g. 0.0.0.0:3000)")]
    pub bind: Option<SocketAddr>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    crate::logging::init();

    let addr = match args.bind {
        Some(addr) => addr,
        None => app::bind_addr()?,
    };
    let state = app::build_state().await?;
    app::serve(addr, state).await
}
