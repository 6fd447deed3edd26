//! `toolbridge config`: inspect and edit the YAML config file

use std::io::Write;

use anyhow::{bail, Context, Result};
use toolbridge_core::{ConfigLayer, FileConfigProvider};

use crate::commands::{ConfigAction, ConfigArgs, GlobalArgs};

pub fn run_config<W: Write>(args: &ConfigArgs, global: &GlobalArgs, out: &mut W) -> Result<()> {
    let file = match global.config.as_deref() {
        Some(path) => FileConfigProvider::new(path),
        None => FileConfigProvider::user(),
    };

    match args.action {
        ConfigAction::Path => writeln!(out, "{}", file.path().display())?,
        ConfigAction::Show => {
            let layer = file.reload()?;
            if layer == ConfigLayer::default() {
                writeln!(out, "No settings in {}", file.path().display())?;
            } else {
                writeln!(out, "{}", serde_json::to_string_pretty(&masked(layer))?)?;
            }
        }
        ConfigAction::Set => {
            let updates = global.to_layer();
            if updates == ConfigLayer::default() {
                bail!("nothing to set; pass flags such as --provider or --model");
            }
            let layer = file.reload()?.merge(updates);
            file.save(&layer)
                .with_context(|| format!("could not write {}", file.path().display()))?;
            writeln!(out, "Saved {}", file.path().display())?;
        }
    }
    Ok(())
}

fn masked(mut layer: ConfigLayer) -> ConfigLayer {
    if layer.api_key.is_some() {
        layer.api_key = Some("****".to_string());
    }
    layer
}
