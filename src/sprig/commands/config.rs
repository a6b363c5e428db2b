use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(dir: &Path, action: ConfigAction) -> Result<CmdResult> {
    let mut config = SprigConfig::load(dir)?;
    match action {
        ConfigAction::ShowAll => Ok(CmdResult::default().with_config(config)),
        ConfigAction::ShowKey(key) => {
            let mut result = CmdResult::default();
            result.add_message(CmdMessage::info(config.get(&key)?));
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            config.set(&key, &value)?;
            config.save(dir)?;

            let mut result = CmdResult::default();
            result.add_message(CmdMessage::success(format!(
                "{} set to {}",
                key,
                config.get(&key)?
            )));
            if key == "order-field" || key == "label-roots" {
                result.add_message(CmdMessage::info(
                    "Run `sprig renumber` to relabel the outline.",
                ));
            }
            Ok(result.with_config(config))
        }
    }
}
