//! Infrastructure implementation of the `InventoryWriter` port.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::InventoryWriter;

/// Writes the inventory to a fixed path, readable by the owner only.
pub struct FileInventoryWriter {
    path: PathBuf,
}

impl FileInventoryWriter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InventoryWriter for FileInventoryWriter {
    fn write(&self, contents: &str) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("cannot open {}", self.path.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("cannot write {}", self.path.display()))?;

        // `mode` only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", self.path.display()))?;
        }
        Ok(self.path.clone())
    }
}
