use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::Result;
use crate::store::fs::JsonFileSource;
use std::path::Path;

pub fn run(dir: &Path) -> Result<CmdResult> {
    let source = JsonFileSource::new(dir);
    let mut result = CmdResult::default();

    if !source.init()? {
        result.add_message(CmdMessage::info(format!(
            "Outline already exists at {}",
            dir.display()
        )));
        return Ok(result);
    }

    let config = SprigConfig::load(dir)?;
    config.save(dir)?;
    result.add_message(CmdMessage::success(format!(
        "Initialized sprig outline at {}",
        dir.display()
    )));
    Ok(result.with_config(config))
}
