//! Settings commands.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use super::Session;

/// Changes requested by `settings set`; `None` leaves a value alone.
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdate {
    pub save_layout: Option<bool>,
    pub mark_low_stock: Option<bool>,
    pub show_containers: Option<bool>,
    pub skip_bom: Option<bool>,
    /// An empty path restores the default profile directory
    pub profile_dir: Option<PathBuf>,
}

fn on_off(value: bool) -> colored::ColoredString {
    if value {
        "on".green()
    } else {
        "off".dimmed()
    }
}

pub fn execute_show(session: &Session) -> Result<()> {
    let s = &session.settings;
    println!("{}", "Settings".bold());
    println!("  Data directory:  {}", session.data_dir.root().display());
    println!("  Save layout:     {}", on_off(s.save_layout));
    println!("  Mark low stock:  {}", on_off(s.mark_low_stock));
    println!("  Show containers: {}", on_off(s.show_containers));
    println!("  Skip BOM:        {}", on_off(s.skip_bom));
    println!(
        "  Profiles:        {}",
        session.data_dir.profile_dir(s).display()
    );
    Ok(())
}

pub fn execute_set(session: &mut Session, update: SettingsUpdate) -> Result<()> {
    let s = &mut session.settings;
    if let Some(v) = update.save_layout {
        s.save_layout = v;
    }
    if let Some(v) = update.mark_low_stock {
        s.mark_low_stock = v;
    }
    if let Some(v) = update.show_containers {
        s.show_containers = v;
    }
    if let Some(v) = update.skip_bom {
        s.skip_bom = v;
    }
    if let Some(dir) = update.profile_dir {
        s.profile_dir = (!dir.as_os_str().is_empty()).then_some(dir);
    }

    session.data_dir.save_settings(&session.settings)?;
    tracing::info!(settings = ?session.settings, "settings saved");
    println!("{} Settings saved", "✓".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataDir;
    use tempfile::TempDir;

    #[test]
    fn test_set_persists_and_resets_profile_dir() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = DataDir::resolve(Some(temp_dir.path().to_path_buf()));
        let mut session = Session::open(data_dir.clone()).unwrap();

        execute_set(
            &mut session,
            SettingsUpdate {
                skip_bom: Some(true),
                profile_dir: Some(PathBuf::from("/opt/profiles")),
                ..Default::default()
            },
        )
        .unwrap();

        let loaded = data_dir.load_settings().unwrap();
        assert!(loaded.skip_bom);
        assert!(loaded.mark_low_stock);
        assert_eq!(loaded.profile_dir, Some(PathBuf::from("/opt/profiles")));

        execute_set(
            &mut session,
            SettingsUpdate {
                profile_dir: Some(PathBuf::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(data_dir.load_settings().unwrap().profile_dir, None);
        assert_eq!(data_dir.profile_dir(&session.settings), temp_dir.path().join("profiles"));
    }
}
