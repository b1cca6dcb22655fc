use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{QueueError, Result};

pub fn load<T: DeserializeOwned>(path: &Path, default: impl FnOnce() -> T) -> Result<T> {
	match std::fs::read_to_string(path) {
		Ok(text) => serde_json::from_str(&text).map_err(|e| QueueError::Corruption {
			path: path.to_path_buf(),
			reason: e.to_string(),
		}),
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(default()),
		Err(error) => Err(QueueError::Io {
			path: path.to_path_buf(),
			error,
		}),
	}
}

pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(|error| QueueError::Io {
			path: parent.to_path_buf(),
			error,
		})?;
	}

	let tmp = path.with_extension("tmp");
	let text = serde_json::to_string_pretty(value).expect("queue state is always serializable");
	std::fs::write(&tmp, text).map_err(|error| QueueError::Io {
		path: tmp.clone(),
		error,
	})?;
	std::fs::rename(&tmp, path).map_err(|error| QueueError::Io {
		path: path.to_path_buf(),
		error,
	})
}

pub fn remove_if_exists(path: &Path) -> Result<()> {
	match std::fs::remove_file(path) {
		Ok(()) => Ok(()),
		Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
		Err(error) => Err(QueueError::Io {
			path: path.to_path_buf(),
			error,
		}),
	}
}
