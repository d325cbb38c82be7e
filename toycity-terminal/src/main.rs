/// Toycity - the planned city in your terminal
///
/// Controls:
///   - WASD / Arrow Keys: Move the camera
///   - Q/ESC: Quit

use log::{error, info};
use std::io;
use toycity_core::City;
use toycity_terminal::{init_logging, AppConfig, TerminalApp, View};

fn main() -> io::Result<()> {
    init_logging();

    let config = AppConfig::discover().map_err(|e| {
        error!("{e}");
        io::Error::new(io::ErrorKind::InvalidData, format!("Failed to load config: {}", e))
    })?;

    let city = City::planned();
    info!("built city with {} nodes", city.graph.len());

    let mut app = TerminalApp::new(View::city(city), config)?;
    app.run()?;

    println!("Thank you for visiting Toycity!");
    Ok(())
}
