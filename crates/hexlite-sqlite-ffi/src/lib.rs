use core::ffi::c_int;
use std::ffi::{CStr, CString};

// The engine itself is compiled and linked by libsqlite3-sys; the declarations
// in `ffi` resolve against it.
use libsqlite3_sys as _;

pub mod ffi;

pub fn sqlite_lib_version_number() -> i32 {
	unsafe { ffi::sqlite3_libversion_number() }
}

pub fn sqlite_lib_version() -> String {
	unsafe { CStr::from_ptr(ffi::sqlite3_libversion()).to_string_lossy().into_owned() }
}

pub fn sqlite_source_id() -> String {
	unsafe { CStr::from_ptr(ffi::sqlite3_sourceid()).to_string_lossy().into_owned() }
}

pub fn sqlite_compile_option_used(name: &str) -> bool {
	let Ok(name) = CString::new(name) else {
		return false;
	};
	unsafe { ffi::sqlite3_compileoption_used(name.as_ptr()) != 0 }
}

pub fn sqlite_compile_options() -> Vec<String> {
	let mut result = Vec::new();
	let mut index: c_int = 0;

	loop {
		let option = unsafe { ffi::sqlite3_compileoption_get(index) };
		if option.is_null() {
			break;
		}

		result.push(unsafe { CStr::from_ptr(option).to_string_lossy().into_owned() });
		index += 1;
	}

	result
}

/// English description of a result code, as reported by `sqlite3_errstr`.
pub fn sqlite_error_string(code: c_int) -> String {
	let text = unsafe { ffi::sqlite3_errstr(code) };
	if text.is_null() {
		return "unknown error".to_string();
	}
	unsafe { CStr::from_ptr(text).to_string_lossy().into_owned() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn has_sqlite_version_number() {
		assert!(sqlite_lib_version_number() >= 3_000_000);
	}

	#[test]
	fn has_sqlite_version_text() {
		assert!(!sqlite_lib_version().is_empty());
	}

	#[test]
	fn reports_compile_options() {
		assert!(!sqlite_compile_options().is_empty());
	}

	#[test]
	fn error_strings_are_descriptive() {
		assert_eq!(sqlite_error_string(ffi::SQLITE_OK), "not an error");
		assert!(!sqlite_error_string(ffi::SQLITE_MISUSE).is_empty());
	}

	#[cfg(feature = "bundled-sqlite")]
	#[test]
	fn bundled_build_has_column_metadata() {
		assert!(sqlite_compile_option_used("ENABLE_COLUMN_METADATA"));
	}
}
