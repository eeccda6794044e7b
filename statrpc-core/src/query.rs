//! File-Status Query
//!
//! Thin adapter over the platform's `stat(2)` and `lstat(2)`. One syscall per
//! call, no caching, no retries.

use std::ffi::CString;
use std::fmt;
use std::io;
use std::mem::MaybeUninit;
use thiserror::Error;

/// Type of a filesystem entry, derived from the `S_IFMT` bits of `st_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (only reported when links are not followed)
    Symlink,
    /// Anything else: devices, FIFOs, sockets
    Other,
}

impl FileType {
    /// Classify a raw mode. Only the type field is inspected; permission and
    /// special bits are ignored.
    pub fn from_mode(mode: u32) -> Self {
        let kind = mode & libc::S_IFMT as u32;
        if kind == libc::S_IFREG as u32 {
            FileType::File
        } else if kind == libc::S_IFDIR as u32 {
            FileType::Directory
        } else if kind == libc::S_IFLNK as u32 {
            FileType::Symlink
        } else {
            FileType::Other
        }
    }

    /// Upper-case wire/report name
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::File => "FILE",
            FileType::Directory => "DIR",
            FileType::Symlink => "SYMLINK",
            FileType::Other => "OTHER",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of a successful file-status query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatResult {
    /// Size in bytes
    pub size: i64,
    /// Raw `st_mode` (type and permission bits, verbatim)
    pub mode: u32,
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// Modification time, seconds since the epoch
    pub mtime_sec: i64,
    /// Modification time, nanosecond component
    pub mtime_nsec: i64,
    /// Entry type derived from `mode`
    pub file_type: FileType,
}

impl StatResult {
    fn from_raw(st: &libc::stat) -> Self {
        let mode = st.st_mode as u32;
        Self {
            size: st.st_size as i64,
            mode,
            uid: st.st_uid as u32,
            gid: st.st_gid as u32,
            mtime_sec: st.st_mtime as i64,
            mtime_nsec: st.st_mtime_nsec as i64,
            file_type: FileType::from_mode(mode),
        }
    }
}

/// Closed classification of a failed query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// `ENOENT`
    NotFound,
    /// `EACCES`
    PermissionDenied,
    /// Any other OS-level failure
    Internal,
}

/// A failed file-status query
#[derive(Debug, Error)]
pub enum QueryError {
    /// The path (or a component of it) does not exist
    #[error("{path}: not found")]
    NotFound {
        /// Queried path
        path: String,
    },

    /// Search or read permission denied on a path component
    #[error("{path}: permission denied")]
    PermissionDenied {
        /// Queried path
        path: String,
    },

    /// Any other failure; the OS error is kept for diagnostics
    #[error("{path}: {source}")]
    Internal {
        /// Queried path
        path: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
}

impl QueryError {
    /// Failure classification
    pub fn kind(&self) -> FailureKind {
        match self {
            QueryError::NotFound { .. } => FailureKind::NotFound,
            QueryError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            QueryError::Internal { .. } => FailureKind::Internal,
        }
    }

    fn from_os(path: &str, err: io::Error) -> Self {
        let path = path.to_string();
        match err.raw_os_error() {
            Some(libc::ENOENT) => QueryError::NotFound { path },
            Some(libc::EACCES) => QueryError::PermissionDenied { path },
            _ => QueryError::Internal { path, source: err },
        }
    }
}

/// Query the status of `path`.
///
/// With `follow_symlink` the query resolves symbolic links to their final
/// target (`stat`); without it a link is reported as itself (`lstat`).
pub fn query(path: &str, follow_symlink: bool) -> Result<StatResult, QueryError> {
    let c_path = CString::new(path).map_err(|e| QueryError::Internal {
        path: path.to_string(),
        source: io::Error::new(io::ErrorKind::InvalidInput, e),
    })?;

    let mut st = MaybeUninit::<libc::stat>::uninit();
    let ret = unsafe {
        if follow_symlink {
            libc::stat(c_path.as_ptr(), st.as_mut_ptr())
        } else {
            libc::lstat(c_path.as_ptr(), st.as_mut_ptr())
        }
    };

    if ret != 0 {
        return Err(QueryError::from_os(path, io::Error::last_os_error()));
    }

    // SAFETY: a zero return guarantees the kernel filled the buffer
    let st = unsafe { st.assume_init() };
    Ok(StatResult::from_raw(&st))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::{PermissionsExt, symlink};

    fn is_root() -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    #[test]
    fn test_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.bin");
        std::fs::write(&file, b"hello").unwrap();

        let result = query(file.to_str().unwrap(), true).unwrap();
        assert_eq!(result.file_type, FileType::File);
        assert_eq!(result.size, 5);
    }

    #[test]
    fn test_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = query(dir.path().to_str().unwrap(), false).unwrap();
        assert_eq!(result.file_type, FileType::Directory);
        assert!(result.size >= 0);
    }

    #[test]
    fn test_symlink_follow_and_nofollow() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        symlink(&target, &link).unwrap();
        let link = link.to_str().unwrap();

        assert_eq!(query(link, false).unwrap().file_type, FileType::Symlink);
        assert_eq!(query(link, true).unwrap().file_type, FileType::Directory);
    }

    #[test]
    fn test_symlink_chain_follows_to_final_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("file");
        std::fs::write(&target, b"x").unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        symlink(&target, &first).unwrap();
        symlink(&first, &second).unwrap();

        let result = query(second.to_str().unwrap(), true).unwrap();
        assert_eq!(result.file_type, FileType::File);
        assert_eq!(result.size, 1);
    }

    #[test]
    fn test_dangling_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        symlink(dir.path().join("missing"), &link).unwrap();
        let link = link.to_str().unwrap();

        assert_eq!(query(link, false).unwrap().file_type, FileType::Symlink);
        let err = query(link, true).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[test]
    fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = query(missing.to_str().unwrap(), false).unwrap_err();
        assert!(matches!(err, QueryError::NotFound { .. }));
    }

    #[test]
    fn test_permission_denied() {
        if is_root() {
            // root bypasses directory search permissions
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("inner"), b"").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let result = query(locked.join("inner").to_str().unwrap(), false);

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(result.unwrap_err().kind(), FailureKind::PermissionDenied);
    }

    #[test]
    fn test_interior_nul_is_internal() {
        let err = query("bad\0path", false).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Internal);
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_not_a_directory_is_internal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"").unwrap();
        let nested = file.join("child");

        let err = query(nested.to_str().unwrap(), false).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Internal);
    }

    #[test]
    fn test_mode_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("perm");
        std::fs::write(&file, b"").unwrap();
        std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o640)).unwrap();

        let result = query(file.to_str().unwrap(), false).unwrap();
        assert_eq!(result.mode & 0o7777, 0o640);
        assert_eq!(FileType::from_mode(result.mode), FileType::File);
    }

    #[test]
    fn test_from_mode_ignores_permission_bits() {
        let dir_mode = libc::S_IFDIR as u32 | 0o7777;
        assert_eq!(FileType::from_mode(dir_mode), FileType::Directory);
        assert_eq!(FileType::from_mode(libc::S_IFIFO as u32 | 0o644), FileType::Other);
        assert_eq!(FileType::from_mode(libc::S_IFLNK as u32 | 0o777), FileType::Symlink);
        assert_eq!(FileType::from_mode(0o644), FileType::Other);
    }

    #[test]
    fn test_file_type_names() {
        assert_eq!(FileType::File.to_string(), "FILE");
        assert_eq!(FileType::Directory.to_string(), "DIR");
        assert_eq!(FileType::Symlink.to_string(), "SYMLINK");
        assert_eq!(FileType::Other.to_string(), "OTHER");
    }
}
