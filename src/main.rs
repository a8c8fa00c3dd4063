use anyhow::Context;
use shelf_app::modules;
use shelf_kernel::{InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = shelf_kernel::settings::Settings::load()
        .with_context(|| "failed to load SHELF settings")?;

    shelf_telemetry::init(&settings.telemetry);

    tracing::info!(env = ?settings.environment, "shelf-app bootstrap starting");

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    shelf_http::start_server(&registry, &settings).await?;

    registry.stop_modules().await?;
    tracing::info!("shelf-app shutdown complete");

    Ok(())
}
