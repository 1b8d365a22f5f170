use std::{
	fs,
	io::{self, Write},
	path::{Path, PathBuf},
};

use anyhow::Context;
use vigil::Frames;

/// A file holding a single persisted observation column.
#[derive(Debug, Clone)]
pub struct Store {
	path: PathBuf,
}

impl Store {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Read the column, returning `None` if the file is missing or blank.
	pub fn load(&self) -> anyhow::Result<Option<Frames>> {
		let column = match fs::read_to_string(&self.path) {
			Ok(column) => column,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(err).with_context(|| format!("failed to read {}", self.path.display())),
		};

		let frames = vigil::decode(Some(column.as_str())).with_context(|| format!("failed to decode {}", self.path.display()))?;
		Ok(frames)
	}

	/// Write the column, replacing the file in a single rename.
	///
	/// The column is first written to a uniquely named file next to the store,
	/// which is removed again if anything fails.
	/// `None` leaves an empty file, which loads back as `None`.
	pub fn save(&self, frames: Option<&Frames>) -> anyhow::Result<()> {
		let column = vigil::encode(frames)?.unwrap_or_default();

		let dir = match self.path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir,
			_ => Path::new("."),
		};

		let mut tmp = tempfile::Builder::new()
			.prefix(".vigil-")
			.suffix(".tmp")
			.tempfile_in(dir)
			.with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;

		tmp.write_all(column.as_bytes())
			.with_context(|| format!("failed to write {}", tmp.path().display()))?;

		// On failure the temporary file is dropped, which deletes it.
		tmp.persist(&self.path)
			.map_err(|err| err.error)
			.with_context(|| format!("failed to replace {}", self.path.display()))?;

		tracing::debug!(path = %self.path.display(), size = column.len(), "saved frames");

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use vigil::ActionObservation;

	fn entries(dir: &Path) -> Vec<String> {
		let mut names: Vec<String> = fs::read_dir(dir)
			.unwrap()
			.map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
			.collect();
		names.sort();
		names
	}

	#[test]
	fn test_missing() {
		let dir = tempfile::tempdir().unwrap();
		let store = Store::new(dir.path().join("frames.json"));

		assert_eq!(store.load().unwrap(), None);
	}

	#[test]
	fn test_save_load() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frames.json");
		let store = Store::new(&path);

		let mut frames = Frames::new();
		frames.push(7, ActionObservation::new("open door", 0.75));
		store.save(Some(&frames)).unwrap();

		assert_eq!(store.load().unwrap(), Some(frames));
		assert_eq!(entries(dir.path()), ["frames.json"]);

		store.save(None).unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "");
		assert_eq!(store.load().unwrap(), None);
	}

	#[test]
	fn test_corrupt() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frames.json");
		fs::write(&path, r#"{"1":[{"probability":0.5}]}"#).unwrap();

		let err = Store::new(&path).load().unwrap_err();
		assert!(matches!(
			err.downcast_ref::<vigil::Error>(),
			Some(vigil::Error::Malformed(_))
		));
	}

	#[test]
	fn test_failed_replace() {
		let dir = tempfile::tempdir().unwrap();

		// A directory can't be replaced by a file.
		let path = dir.path().join("frames.json");
		fs::create_dir(&path).unwrap();

		let mut frames = Frames::new();
		frames.push(1, ActionObservation::new("open door", 0.5));

		assert!(Store::new(&path).save(Some(&frames)).is_err());
		assert_eq!(entries(dir.path()), ["frames.json"]);
		assert!(path.is_dir());
	}

	#[test]
	fn test_concurrent_save() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("frames.json");

		let columns: Vec<Frames> = (0..4)
			.map(|writer| {
				let mut frames = Frames::new();
				frames.push(writer, ActionObservation::new(format!("writer {writer}"), 0.5));
				frames
			})
			.collect();

		std::thread::scope(|scope| {
			for frames in &columns {
				let store = Store::new(&path);
				scope.spawn(move || {
					for _ in 0..25 {
						store.save(Some(frames)).unwrap();
					}
				});
			}
		});

		// The store holds one writer's column in full, and no temporary files are left.
		let loaded = Store::new(&path).load().unwrap().unwrap();
		assert!(columns.contains(&loaded));
		assert_eq!(entries(dir.path()), ["frames.json"]);
	}
}
