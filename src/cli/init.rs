use std::path::PathBuf;

use crate::error::Result;
use crate::rules::{save_rules, RuleStore};
use crate::session::DataPaths;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let paths = DataPaths::in_dir(&resolved);
    if !paths.rules.exists() {
        save_rules(&paths.rules, &RuleStore::default())?;
    }

    println!("Initialized penny at {}", resolved.display());
    Ok(())
}
