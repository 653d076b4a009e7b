use anyhow::Context;
use eframe::CreationContext;
use log::info;
use parking_sign_analyzer::{AppConfig, ParkingAnalyzer, ProviderKind};
use tokio::runtime::Runtime;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let provider = config.build_provider()?;
    let runtime = Runtime::new().context("failed to start async runtime")?;

    let endpoint_label = match config.provider {
        ProviderKind::Remote => config.endpoint.clone(),
        ProviderKind::Simulated => "offline demo".to_string(),
    };
    info!(
        "Using {} provider ({}), language '{}'",
        provider.name(),
        endpoint_label,
        config.language
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([520.0, 760.0])
            .with_min_inner_size([400.0, 560.0]),
        ..Default::default()
    };

    let language = config.language;
    eframe::run_native(
        "Parking Sign Analyzer",
        options,
        Box::new(move |cc: &CreationContext| {
            Box::new(ParkingAnalyzer::new(
                cc,
                provider,
                endpoint_label,
                language,
                runtime,
            ))
        }),
    )
    .map_err(|e| anyhow::anyhow!("failed to open window: {}", e))
}
