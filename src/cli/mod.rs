use crossterm::{execute, style::Color, terminal::{Clear, ClearType}};
use std::{error::Error, io::stdout};

use crate::{logs, monitor, settings};

const BANNER: &str = r#"
 ___      _    _            ___
| _ )_ _ (_)__| |__ _ ___  / __| __ __ _ _ _  _ _  ___ _ _
| _ \ '_|| / _` / _` / -_) \__ \/ _/ _` | ' \| ' \/ -_) '_|
|___/_|  |_\__,_\__, \___| |___/\__\__,_|_||_|_||_\___|_|
                |___/
"#;

pub async fn start() -> Result<(), Box<dyn Error>> {
    if let Err(e) = execute!(stdout(), Clear(ClearType::All)) {
        logs::error(&e.to_string());
    }

    logs::form_message(BANNER, Color::Grey);

    let settings = match settings::setup() {
        Ok(settings) => settings,
        Err(e) => {
            logs::error(&e.to_string());
            return Err(e.into());
        }
    };

    logs::info("SETTINGS LOADED");

    if let Err(e) = monitor::start(settings).await {
        logs::error(&e.to_string());
        return Err(e);
    }

    Ok(())
}
