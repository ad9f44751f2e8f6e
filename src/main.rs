use color_eyre::Result;
use encore_tui::{
    api::DiscoveryClient,
    app::App,
    config::{ApiKey, Config, ProviderKind},
    events::{AppEvent, EventHandler},
    location::{GeolocationProvider, IpGeolocator, ManualGeolocator, PositionOptions, PositionResolver},
    logging,
    orchestrator::Orchestrator,
    ui,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging("logs");
    color_eyre::install()?;
    // After color_eyre, which replaces the panic hook
    install_panic_hook();

    // Configuration problems abort before the terminal is touched
    let config = Config::load();
    config.validate()?;
    let api_key = ApiKey::from_env().map_err(|e| {
        error!("{}", e);
        e
    })?;

    let resolver = PositionResolver::new(geolocation_provider(&config), config.fallback_position())
        .with_options(PositionOptions {
            timeout: Duration::from_millis(config.location.timeout_ms),
            ..PositionOptions::default()
        });
    let client = DiscoveryClient::new(&config.catalog, api_key)?;
    info!(
        provider = ?config.location.provider,
        classification = %config.catalog.classification,
        "Starting event discovery"
    );

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut event_handler = EventHandler::new(config.ui.tick_rate_ms);
    let orchestrator = Orchestrator::new(Arc::new(resolver), Arc::new(client), event_handler.tx.clone());
    let mut app = App::new(orchestrator, config.ui.zoom);
    app.orchestrator.start();

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        match event_handler.next().await {
            Some(AppEvent::Tick) => app.on_tick(),
            Some(AppEvent::Input(key)) => app.handle_key(key),
            Some(event) => app.orchestrator.handle(event),
            None => break,
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

fn geolocation_provider(config: &Config) -> Option<Arc<dyn GeolocationProvider>> {
    let provider: Arc<dyn GeolocationProvider> = match config.location.provider {
        ProviderKind::Ip => Arc::new(IpGeolocator::new(config.location.lookup_ip.clone())),
        ProviderKind::Manual => Arc::new(ManualGeolocator::new(config.manual_position())),
        ProviderKind::None => return None,
    };
    Some(provider)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen, crossterm::cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
        original_hook(panic_info);
    }));
}
