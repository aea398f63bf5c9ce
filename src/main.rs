use mettle_ratatui::{app::App, logging, settings::Settings};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let settings = Settings::load();
    let data_dir = settings.data_dir()?;
    logging::init(data_dir, settings.debug_mode)?;
    log::info!("Mettle start: {}", chrono::Local::now());

    // First run: write the defaults out so there is a file to edit.
    if !Settings::default_path()?.exists() {
        if let Err(e) = settings.save() {
            log::warn!("Could not write default settings: {e}");
        }
    }

    let mut app = App::new(settings)?;
    let result = app.run().await;
    if let Err(e) = &result {
        log::error!("Mettle stopped with an error: {e:?}");
    }
    result
}
