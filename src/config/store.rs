//! Named model directories on disk.
//!
//! Each model lives in `<root>/<name>/config.json`.

use crate::config::InspectionConfig;
use crate::trace::log_info;
use crate::util::{MarkAlignError, MarkAlignResult};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the configuration inside a model directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Directory of named inspection models.
#[derive(Clone, Debug)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Creates a store rooted at `root` without touching the filesystem.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Creates a store and makes sure its root directory exists.
    pub fn open<P: Into<PathBuf>>(root: P) -> MarkAlignResult<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the configuration file for `name`.
    pub fn config_path(&self, name: &str) -> MarkAlignResult<PathBuf> {
        check_name(name)?;
        Ok(self.root.join(name).join(CONFIG_FILE_NAME))
    }

    /// Names of all directories holding a configuration file, sorted.
    ///
    /// A missing root yields an empty list.
    pub fn list_models(&self) -> MarkAlignResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if !entry.path().join(CONFIG_FILE_NAME).is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Returns true when the named model has a configuration file.
    pub fn exists(&self, name: &str) -> bool {
        self.config_path(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Loads and validates the named model.
    pub fn load(&self, name: &str) -> MarkAlignResult<InspectionConfig> {
        let path = self.config_path(name)?;
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(MarkAlignError::ModelNotFound {
                    name: name.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };
        InspectionConfig::from_json_str(&text)
    }

    /// Validates and writes the named model, creating its directory.
    pub fn save(&self, name: &str, config: &InspectionConfig) -> MarkAlignResult<PathBuf> {
        config.validate()?;
        let path = self.config_path(name)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, config.to_json_pretty()?)?;
        log_info!("saved model {name} to {}", path.display());
        Ok(path)
    }

    /// Removes the named model directory. Returns false when it did not exist.
    pub fn delete(&self, name: &str) -> MarkAlignResult<bool> {
        check_name(name)?;
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        log_info!("deleted model {name}");
        Ok(true)
    }
}

fn check_name(name: &str) -> MarkAlignResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(MarkAlignError::InvalidModelName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::check_name;

    #[test]
    fn names_with_separators_are_rejected() {
        assert!(check_name("part-a").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("..").is_err());
        assert!(check_name("a/b").is_err());
        assert!(check_name("a\\b").is_err());
    }
}
