use std::env;
use std::path::PathBuf;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{AudioSignalChain, FileDecoder, RodioChain, RodioOutput};
use crate::player::Player;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_warning) = settings::load_settings();

    if let Err(e) = logging::init(&settings.logging, &settings.log_file()) {
        eprintln!("logging disabled: {e}");
    }
    if let Some(msg) = settings_warning {
        warn!("{msg}");
    }

    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.library.music_dir.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("Music"));
    info!(dir = %dir.display(), "starting");

    let catalog = startup::load_catalog(&dir, &settings.library);
    let store = startup::open_store(&settings);
    let chain: RodioChain = AudioSignalChain::new(
        FileDecoder::new(dir.clone()),
        RodioOutput::open()?,
        settings.audio.eq_q,
    );
    let mut engine: Player = Player::new(chain, catalog, store, &settings);

    let mut app = App::new();
    app.set_current_dir(dir.display().to_string());
    startup::apply_startup_defaults(&mut engine, &mut app, &settings);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &settings, &mut app, &mut engine);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("exiting");
    run_result
}
