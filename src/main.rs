mod app;
mod notify;
mod settings;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = settings::load_settings();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("n8n-command")
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(app::run(settings))
}
