//! Platform checks for "this move cannot be done by linking".

use std::io;

/// Returns true when `err` is the error a rename reports when source and
/// destination live on different filesystems or devices.
#[cfg(unix)]
#[must_use]
pub fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

/// Returns true when `err` is the error a rename reports when source and
/// destination live on different volumes.
#[cfg(windows)]
#[must_use]
pub fn is_cross_device(err: &io::Error) -> bool {
    use windows_sys::Win32::Foundation::ERROR_NOT_SAME_DEVICE;

    #[allow(clippy::cast_possible_wrap)]
    let not_same_device = ERROR_NOT_SAME_DEVICE as i32;
    err.raw_os_error() == Some(not_same_device)
}

#[cfg(not(any(unix, windows)))]
#[must_use]
pub fn is_cross_device(_err: &io::Error) -> bool {
    false
}

/// Returns true when a hard link failed because the filesystem does not
/// support links (vfat, some network mounts).
#[cfg(unix)]
pub(crate) fn is_link_unsupported(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Unsupported
        || err
            .raw_os_error()
            .is_some_and(|code| code == libc::EPERM || code == libc::EOPNOTSUPP || code == libc::ENOTSUP)
}

/// Returns true when a hard link failed because the volume does not support
/// links (FAT, some network shares).
#[cfg(windows)]
pub(crate) fn is_link_unsupported(err: &io::Error) -> bool {
    use windows_sys::Win32::Foundation::{ERROR_INVALID_FUNCTION, ERROR_NOT_SUPPORTED};

    #[allow(clippy::cast_possible_wrap)]
    let unsupported = [ERROR_INVALID_FUNCTION as i32, ERROR_NOT_SUPPORTED as i32];
    err.kind() == io::ErrorKind::Unsupported
        || err.raw_os_error().is_some_and(|code| unsupported.contains(&code))
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn is_link_unsupported(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Unsupported
}
