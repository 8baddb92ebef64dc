use core::ffi::c_int;

const fn ext(primary: c_int, n: c_int) -> c_int {
	primary | (n << 8)
}

const ERROR: c_int = 1;
const ABORT: c_int = 4;
const BUSY: c_int = 5;
const LOCKED: c_int = 6;
const READONLY: c_int = 8;
const IOERR: c_int = 10;
const CORRUPT: c_int = 11;
const CANTOPEN: c_int = 14;
const CONSTRAINT: c_int = 19;
const AUTH: c_int = 23;
const NOTICE: c_int = 27;
const WARNING: c_int = 28;

const RESULT_CODES: [(&str, c_int); 31] = [
	("SQLITE_OK", 0),
	("SQLITE_ERROR", ERROR),
	("SQLITE_INTERNAL", 2),
	("SQLITE_PERM", 3),
	("SQLITE_ABORT", ABORT),
	("SQLITE_BUSY", BUSY),
	("SQLITE_LOCKED", LOCKED),
	("SQLITE_NOMEM", 7),
	("SQLITE_READONLY", READONLY),
	("SQLITE_INTERRUPT", 9),
	("SQLITE_IOERR", IOERR),
	("SQLITE_CORRUPT", CORRUPT),
	("SQLITE_NOTFOUND", 12),
	("SQLITE_FULL", 13),
	("SQLITE_CANTOPEN", CANTOPEN),
	("SQLITE_PROTOCOL", 15),
	("SQLITE_EMPTY", 16),
	("SQLITE_SCHEMA", 17),
	("SQLITE_TOOBIG", 18),
	("SQLITE_CONSTRAINT", CONSTRAINT),
	("SQLITE_MISMATCH", 20),
	("SQLITE_MISUSE", 21),
	("SQLITE_NOLFS", 22),
	("SQLITE_AUTH", AUTH),
	("SQLITE_FORMAT", 24),
	("SQLITE_RANGE", 25),
	("SQLITE_NOTADB", 26),
	("SQLITE_NOTICE", NOTICE),
	("SQLITE_WARNING", WARNING),
	("SQLITE_ROW", 100),
	("SQLITE_DONE", 101),
];

const EXTENDED_RESULT_CODES: [(&str, c_int); 75] = [
	("SQLITE_OK_LOAD_PERMANENTLY", ext(0, 1)),
	("SQLITE_OK_SYMLINK", ext(0, 2)),
	("SQLITE_ERROR_MISSING_COLLSEQ", ext(ERROR, 1)),
	("SQLITE_ERROR_RETRY", ext(ERROR, 2)),
	("SQLITE_ERROR_SNAPSHOT", ext(ERROR, 3)),
	("SQLITE_IOERR_READ", ext(IOERR, 1)),
	("SQLITE_IOERR_SHORT_READ", ext(IOERR, 2)),
	("SQLITE_IOERR_WRITE", ext(IOERR, 3)),
	("SQLITE_IOERR_FSYNC", ext(IOERR, 4)),
	("SQLITE_IOERR_DIR_FSYNC", ext(IOERR, 5)),
	("SQLITE_IOERR_TRUNCATE", ext(IOERR, 6)),
	("SQLITE_IOERR_FSTAT", ext(IOERR, 7)),
	("SQLITE_IOERR_UNLOCK", ext(IOERR, 8)),
	("SQLITE_IOERR_RDLOCK", ext(IOERR, 9)),
	("SQLITE_IOERR_DELETE", ext(IOERR, 10)),
	("SQLITE_IOERR_BLOCKED", ext(IOERR, 11)),
	("SQLITE_IOERR_NOMEM", ext(IOERR, 12)),
	("SQLITE_IOERR_ACCESS", ext(IOERR, 13)),
	("SQLITE_IOERR_CHECKRESERVEDLOCK", ext(IOERR, 14)),
	("SQLITE_IOERR_LOCK", ext(IOERR, 15)),
	("SQLITE_IOERR_CLOSE", ext(IOERR, 16)),
	("SQLITE_IOERR_DIR_CLOSE", ext(IOERR, 17)),
	("SQLITE_IOERR_SHMOPEN", ext(IOERR, 18)),
	("SQLITE_IOERR_SHMSIZE", ext(IOERR, 19)),
	("SQLITE_IOERR_SHMLOCK", ext(IOERR, 20)),
	("SQLITE_IOERR_SHMMAP", ext(IOERR, 21)),
	("SQLITE_IOERR_SEEK", ext(IOERR, 22)),
	("SQLITE_IOERR_DELETE_NOENT", ext(IOERR, 23)),
	("SQLITE_IOERR_MMAP", ext(IOERR, 24)),
	("SQLITE_IOERR_GETTEMPPATH", ext(IOERR, 25)),
	("SQLITE_IOERR_CONVPATH", ext(IOERR, 26)),
	("SQLITE_IOERR_VNODE", ext(IOERR, 27)),
	("SQLITE_IOERR_AUTH", ext(IOERR, 28)),
	("SQLITE_IOERR_BEGIN_ATOMIC", ext(IOERR, 29)),
	("SQLITE_IOERR_COMMIT_ATOMIC", ext(IOERR, 30)),
	("SQLITE_IOERR_ROLLBACK_ATOMIC", ext(IOERR, 31)),
	("SQLITE_IOERR_DATA", ext(IOERR, 32)),
	("SQLITE_IOERR_CORRUPTFS", ext(IOERR, 33)),
	("SQLITE_IOERR_IN_PAGE", ext(IOERR, 34)),
	("SQLITE_LOCKED_SHAREDCACHE", ext(LOCKED, 1)),
	("SQLITE_LOCKED_VTAB", ext(LOCKED, 2)),
	("SQLITE_BUSY_RECOVERY", ext(BUSY, 1)),
	("SQLITE_BUSY_SNAPSHOT", ext(BUSY, 2)),
	("SQLITE_BUSY_TIMEOUT", ext(BUSY, 3)),
	("SQLITE_CANTOPEN_NOTEMPDIR", ext(CANTOPEN, 1)),
	("SQLITE_CANTOPEN_ISDIR", ext(CANTOPEN, 2)),
	("SQLITE_CANTOPEN_FULLPATH", ext(CANTOPEN, 3)),
	("SQLITE_CANTOPEN_CONVPATH", ext(CANTOPEN, 4)),
	("SQLITE_CANTOPEN_SYMLINK", ext(CANTOPEN, 6)),
	("SQLITE_CORRUPT_VTAB", ext(CORRUPT, 1)),
	("SQLITE_CORRUPT_SEQUENCE", ext(CORRUPT, 2)),
	("SQLITE_CORRUPT_INDEX", ext(CORRUPT, 3)),
	("SQLITE_READONLY_RECOVERY", ext(READONLY, 1)),
	("SQLITE_READONLY_CANTLOCK", ext(READONLY, 2)),
	("SQLITE_READONLY_ROLLBACK", ext(READONLY, 3)),
	("SQLITE_READONLY_DBMOVED", ext(READONLY, 4)),
	("SQLITE_READONLY_CANTINIT", ext(READONLY, 5)),
	("SQLITE_READONLY_DIRECTORY", ext(READONLY, 6)),
	("SQLITE_ABORT_ROLLBACK", ext(ABORT, 2)),
	("SQLITE_CONSTRAINT_CHECK", ext(CONSTRAINT, 1)),
	("SQLITE_CONSTRAINT_COMMITHOOK", ext(CONSTRAINT, 2)),
	("SQLITE_CONSTRAINT_FOREIGNKEY", ext(CONSTRAINT, 3)),
	("SQLITE_CONSTRAINT_FUNCTION", ext(CONSTRAINT, 4)),
	("SQLITE_CONSTRAINT_NOTNULL", ext(CONSTRAINT, 5)),
	("SQLITE_CONSTRAINT_PRIMARYKEY", ext(CONSTRAINT, 6)),
	("SQLITE_CONSTRAINT_TRIGGER", ext(CONSTRAINT, 7)),
	("SQLITE_CONSTRAINT_UNIQUE", ext(CONSTRAINT, 8)),
	("SQLITE_CONSTRAINT_VTAB", ext(CONSTRAINT, 9)),
	("SQLITE_CONSTRAINT_ROWID", ext(CONSTRAINT, 10)),
	("SQLITE_CONSTRAINT_PINNED", ext(CONSTRAINT, 11)),
	("SQLITE_CONSTRAINT_DATATYPE", ext(CONSTRAINT, 12)),
	("SQLITE_NOTICE_RECOVER_WAL", ext(NOTICE, 1)),
	("SQLITE_NOTICE_RECOVER_ROLLBACK", ext(NOTICE, 2)),
	("SQLITE_WARNING_AUTOINDEX", ext(WARNING, 1)),
	("SQLITE_AUTH_USER", ext(AUTH, 1)),
];

/// Symbolic name for an engine result code, extended codes included.
///
/// Extended codes missing from the table fall back to the name of their
/// primary code. Codes that match nothing at all yield `None`.
pub fn code_name(code: c_int) -> Option<&'static str> {
	EXTENDED_RESULT_CODES
		.iter()
		.chain(RESULT_CODES.iter())
		.find_map(|(name, value)| (*value == code).then_some(*name))
		.or_else(|| {
			let primary = code & 0xff;
			RESULT_CODES.iter().find_map(|(name, value)| (*value == primary).then_some(*name))
		})
}

/// Like [`code_name`], but always produces a string.
pub fn code_string(code: c_int) -> String {
	code_name(code).map_or_else(|| format!("UNKNOWN_SQLITE_ERROR_{code}"), ToOwned::to_owned)
}
