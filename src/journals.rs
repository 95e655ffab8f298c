use std::env;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

const RECENTS_FILE: &str = "recent_journals.txt";
const RECENTS_CAP: usize = 20;

/// Per-user application state: the recently-opened journal list and the
/// log directory. The state directory is fixed at construction so the rest
/// of the app never re-resolves it, and tests can point a registry at a
/// scratch directory.
pub struct JournalRegistry {
	state_dir: PathBuf,
}

impl JournalRegistry {
	pub fn from_env() -> Self {
		Self {
			state_dir: default_state_dir(),
		}
	}

	#[cfg(test)]
	fn with_state_dir(state_dir: PathBuf) -> Self {
		Self { state_dir }
	}

	pub fn log_dir(&self) -> PathBuf {
		self.state_dir.join("logs")
	}

	/// Resolution order: the `--journal` flag, then `EMBER_JOURNAL`, then
	/// the most recently opened journal.
	pub fn resolve(&self, flag: Option<PathBuf>) -> Result<PathBuf, Error> {
		let env_path = env::var_os("EMBER_JOURNAL")
			.map(PathBuf::from)
			.filter(|path| !path.as_os_str().is_empty());
		self.resolve_from(flag, env_path)
	}

	fn resolve_from(
		&self,
		flag: Option<PathBuf>,
		env_path: Option<PathBuf>,
	) -> Result<PathBuf, Error> {
		if let Some(path) = flag.or(env_path) {
			return Ok(absolutize(path));
		}

		self.recent(1)?.pop().ok_or_else(|| {
			Error::new(
				ErrorKind::NotFound,
				"no journal selected: pass --journal <path>, set EMBER_JOURNAL, or open one listed by `journals`",
			)
		})
	}

	/// Moves `path` to the front of the recents list. Duplicates collapse
	/// into the front entry and anything past the cap falls off the end.
	pub fn touch(&self, path: &Path) -> Result<(), Error> {
		let path = absolutize(path.to_path_buf());
		let mut entries = self.recent(RECENTS_CAP)?;
		entries.retain(|entry| entry != &path);
		entries.insert(0, path);
		entries.truncate(RECENTS_CAP);

		fs::create_dir_all(&self.state_dir)?;
		let body = entries
			.iter()
			.map(|entry| format!("{}\n", entry.display()))
			.collect::<String>();
		fs::write(self.recents_path(), body)
	}

	pub fn recent(&self, limit: usize) -> Result<Vec<PathBuf>, Error> {
		let raw = match fs::read_to_string(self.recents_path()) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(err) => return Err(err),
		};

		Ok(raw
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.take(limit)
			.map(PathBuf::from)
			.collect())
	}

	fn recents_path(&self) -> PathBuf {
		self.state_dir.join(RECENTS_FILE)
	}
}

fn default_state_dir() -> PathBuf {
	if let Some(path) = env::var_os("EMBER_STATE_DIR") {
		return PathBuf::from(path);
	}

	let base = env::var_os("XDG_STATE_HOME")
		.map(PathBuf::from)
		.or_else(|| env::var_os("LOCALAPPDATA").map(PathBuf::from))
		.or_else(|| {
			env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
		});

	match base {
		Some(base) => base.join("ember_daybook"),
		None => PathBuf::from(".ember_daybook"),
	}
}

fn absolutize(path: PathBuf) -> PathBuf {
	let absolute = if path.is_absolute() {
		path
	} else {
		match env::current_dir() {
			Ok(cwd) => cwd.join(path),
			Err(_) => path,
		}
	};
	fs::canonicalize(&absolute).unwrap_or(absolute)
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::io::ErrorKind;
	use std::path::PathBuf;

	use super::{JournalRegistry, RECENTS_CAP};

	fn scratch_registry(name: &str) -> JournalRegistry {
		let dir = std::env::temp_dir().join(format!("{}_{}", name, std::process::id()));
		let _ = fs::remove_dir_all(&dir);
		JournalRegistry::with_state_dir(dir)
	}

	fn cleanup(registry: &JournalRegistry) {
		let _ = fs::remove_dir_all(&registry.state_dir);
	}

	#[test]
	fn touch_moves_the_latest_journal_to_the_front() {
		let registry = scratch_registry("ember_recents_front");
		for path in ["/tmp/a.journal", "/tmp/b.journal", "/tmp/a.journal"] {
			registry
				.touch(&PathBuf::from(path))
				.expect("touch should work");
		}

		let recent = registry.recent(10).expect("recents should load");
		assert_eq!(
			recent,
			vec![
				PathBuf::from("/tmp/a.journal"),
				PathBuf::from("/tmp/b.journal")
			]
		);
		cleanup(&registry);
	}

	#[test]
	fn recents_cap_drops_the_oldest_entries() {
		let registry = scratch_registry("ember_recents_cap");
		for index in 0..RECENTS_CAP + 10 {
			registry
				.touch(&PathBuf::from(format!("/tmp/j{index}.journal")))
				.expect("touch should work");
		}

		let recent = registry.recent(usize::MAX).expect("recents should load");
		assert_eq!(recent.len(), RECENTS_CAP);
		assert_eq!(
			recent[0],
			PathBuf::from(format!("/tmp/j{}.journal", RECENTS_CAP + 9))
		);
		cleanup(&registry);
	}

	#[test]
	fn explicit_flag_wins_over_env_and_recents() {
		let registry = scratch_registry("ember_resolve_flag");
		registry
			.touch(&PathBuf::from("/tmp/old.journal"))
			.expect("touch should work");

		let resolved = registry
			.resolve_from(
				Some(PathBuf::from("/tmp/new.journal")),
				Some(PathBuf::from("/tmp/env.journal")),
			)
			.expect("flag should resolve");
		assert_eq!(resolved, PathBuf::from("/tmp/new.journal"));
		cleanup(&registry);
	}

	#[test]
	fn env_path_wins_over_recents() {
		let registry = scratch_registry("ember_resolve_env");
		registry
			.touch(&PathBuf::from("/tmp/old.journal"))
			.expect("touch should work");

		let resolved = registry
			.resolve_from(None, Some(PathBuf::from("/tmp/env.journal")))
			.expect("env path should resolve");
		assert_eq!(resolved, PathBuf::from("/tmp/env.journal"));
		cleanup(&registry);
	}

	#[test]
	fn resolution_falls_back_to_the_most_recent_journal() {
		let registry = scratch_registry("ember_resolve_recent");
		registry
			.touch(&PathBuf::from("/tmp/older.journal"))
			.expect("touch should work");
		registry
			.touch(&PathBuf::from("/tmp/newest.journal"))
			.expect("touch should work");

		let resolved = registry
			.resolve_from(None, None)
			.expect("recents should resolve");
		assert_eq!(resolved, PathBuf::from("/tmp/newest.journal"));
		cleanup(&registry);
	}

	#[test]
	fn resolution_without_any_candidate_is_not_found() {
		let registry = scratch_registry("ember_resolve_empty");
		let err = registry
			.resolve_from(None, None)
			.expect_err("nothing should resolve");
		assert_eq!(err.kind(), ErrorKind::NotFound);
	}
}
