use core::ffi::c_int;
use std::time::Duration;

use crate::ffi;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Parameters for [`Database::open_with`](crate::Database::open_with).
///
/// `filename_given` and `verbose` are accepted for signature compatibility and
/// have no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
	pub filename_given: bool,
	pub anonymous: bool,
	pub readonly: bool,
	pub file_must_exist: bool,
	pub timeout: Duration,
	pub verbose: bool,
	pub buffer: Option<Vec<u8>>,
}

impl Default for OpenOptions {
	fn default() -> Self {
		Self {
			filename_given: true,
			anonymous: false,
			readonly: false,
			file_must_exist: false,
			timeout: DEFAULT_TIMEOUT,
			verbose: false,
			buffer: None,
		}
	}
}

impl OpenOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub const fn filename_given(mut self, filename_given: bool) -> Self {
		self.filename_given = filename_given;
		self
	}

	#[must_use]
	pub const fn anonymous(mut self, anonymous: bool) -> Self {
		self.anonymous = anonymous;
		self
	}

	#[must_use]
	pub const fn readonly(mut self, readonly: bool) -> Self {
		self.readonly = readonly;
		self
	}

	#[must_use]
	pub const fn file_must_exist(mut self, file_must_exist: bool) -> Self {
		self.file_must_exist = file_must_exist;
		self
	}

	#[must_use]
	pub const fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	#[must_use]
	pub const fn verbose(mut self, verbose: bool) -> Self {
		self.verbose = verbose;
		self
	}

	/// Serialized database image to load into `main` after opening.
	#[must_use]
	pub fn buffer(mut self, image: impl Into<Vec<u8>>) -> Self {
		self.buffer = Some(image.into());
		self
	}

	pub(crate) const fn open_flags(&self, filename: &str) -> c_int {
		let mut flags = if self.readonly {
			ffi::SQLITE_OPEN_READONLY
		} else if self.file_must_exist {
			ffi::SQLITE_OPEN_READWRITE
		} else {
			ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
		};
		if self.anonymous || is_memory_name(filename) {
			flags |= ffi::SQLITE_OPEN_MEMORY;
		}
		flags
	}

	/// Busy timeout in whole milliseconds, saturating at the engine's limit.
	pub(crate) fn timeout_ms(&self) -> c_int {
		c_int::try_from(self.timeout.as_millis()).unwrap_or(c_int::MAX)
	}
}

pub(crate) const fn is_memory_name(filename: &str) -> bool {
	filename.is_empty() || matches!(filename.as_bytes(), b":memory:")
}
