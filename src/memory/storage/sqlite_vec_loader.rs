//! SQLite-vec extension loader.
//!
//! This module contains the unsafe initialization code for the sqlite-vec extension.
//! It is separated to minimize the scope of unsafe code in the crate.

use std::ffi::{c_char, c_int};
use std::sync::Once;

use rusqlite::Connection;
use rusqlite::ffi::{sqlite3, sqlite3_api_routines, sqlite3_auto_extension};
use sqlite_vec::sqlite3_vec_init;

use crate::memory::core::errors::{RecallError, RecallResult};

type SqliteExtensionFn =
    unsafe extern "C" fn(*mut sqlite3, *mut *mut c_char, *const sqlite3_api_routines) -> c_int;

static REGISTER: Once = Once::new();

/// Register sqlite-vec for every connection opened afterwards.
///
/// Safe to call repeatedly; registration happens once per process.
#[allow(unsafe_code)]
pub fn init_sqlite_vec_extension() {
    REGISTER.call_once(|| {
        // SAFETY: sqlite3_auto_extension is a stable SQLite API that registers
        // an extension entry point; sqlite3_vec_init has the extension ABI.
        unsafe {
            sqlite3_auto_extension(Some(std::mem::transmute::<*const (), SqliteExtensionFn>(
                sqlite3_vec_init as *const (),
            )));
        }
    });
}

/// Return the sqlite-vec version loaded on `conn`.
///
/// # Errors
/// Returns [`RecallError::SqliteVecUnavailable`] if the extension is missing.
pub fn sqlite_vec_version(conn: &Connection) -> RecallResult<String> {
    conn.query_row("SELECT vec_version()", [], |row| row.get::<_, String>(0))
        .map_err(|_| RecallError::SqliteVecUnavailable)
}
