use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{RegistryError, Result};

/// Loads a JSON table from `path`, returning `default()` if the file does
/// not exist yet.
///
/// `.tmp` files are never read: a `.tmp` file that survived is a crashed
/// partial write, and the last successfully renamed file is authoritative.
pub fn load<T: DeserializeOwned>(path: &Path, default: impl FnOnce() -> T) -> Result<T> {
	match std::fs::read_to_string(path) {
		Ok(text) => serde_json::from_str(&text).map_err(|e| RegistryError::Corruption {
			path: path.to_path_buf(),
			reason: e.to_string(),
		}),
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(default()),
		Err(error) => Err(RegistryError::Io {
			path: path.to_path_buf(),
			error,
		}),
	}
}

/// Writes `value` to `path` atomically: serialize to a sibling `.tmp` file,
/// then rename over the destination. A reader never observes a partial
/// write.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(|error| RegistryError::Io {
			path: parent.to_path_buf(),
			error,
		})?;
	}

	let tmp = path.with_extension("tmp");
	let text = serde_json::to_string_pretty(value).expect("registry tables are always serializable");
	std::fs::write(&tmp, text).map_err(|error| RegistryError::Io {
		path: tmp.clone(),
		error,
	})?;
	std::fs::rename(&tmp, path).map_err(|error| RegistryError::Io {
		path: path.to_path_buf(),
		error,
	})
}
