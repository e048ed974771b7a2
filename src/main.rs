mod app;
mod audio;
mod config;
mod equalizer;
mod error;
mod library;
mod player;
mod playlist;
mod runtime;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
