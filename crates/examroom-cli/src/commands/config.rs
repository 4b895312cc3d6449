use clap::Subcommand;
use examroom_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "pomodoro.focus_duration", "audio.style")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let listing = dotted_listing(&config)?;
            print!("{listing}");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

/// One `section.key = value` line per setting, in key order.
fn dotted_listing(config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let json = serde_json::to_value(config)?;
    let mut out = String::new();
    if let serde_json::Value::Object(sections) = json {
        for (section, fields) in sections {
            if let serde_json::Value::Object(fields) = fields {
                for (key, value) in fields {
                    out.push_str(&format!("{section}.{key} = {value}\n"));
                }
            }
        }
    }
    Ok(out)
}
