//! Compositor socket discovery.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{Result, WireError};

/// Socket name used when `WAYLAND_DISPLAY` is unset or empty.
pub const DEFAULT_DISPLAY_NAME: &str = "wayland-0";

/// Locate the compositor socket from the process environment.
///
/// - An absolute `WAYLAND_DISPLAY` is used as is.
/// - Otherwise `XDG_RUNTIME_DIR` is required and joined with
///   `WAYLAND_DISPLAY`, or with `wayland-0` if that is unset.
pub fn socket_path_from_env() -> Result<PathBuf> {
    resolve_socket_path(|key| std::env::var_os(key))
}

/// [`socket_path_from_env`] with an explicit variable lookup.
///
/// # Example
///
/// ```
/// use std::ffi::OsString;
/// use std::path::PathBuf;
/// use wlwire_client::transport::resolve_socket_path;
///
/// let path = resolve_socket_path(|key| match key {
///     "XDG_RUNTIME_DIR" => Some(OsString::from("/run/user/1000")),
///     _ => None,
/// })
/// .unwrap();
/// assert_eq!(path, PathBuf::from("/run/user/1000/wayland-0"));
/// ```
pub fn resolve_socket_path<F>(lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    let display = lookup("WAYLAND_DISPLAY")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);

    if let Some(display) = &display {
        if display.is_absolute() {
            return Ok(display.clone());
        }
    }

    let runtime_dir = lookup("XDG_RUNTIME_DIR")
        .filter(|value| !value.is_empty())
        .ok_or(WireError::MissingRuntimeDir)?;

    let name = display.unwrap_or_else(|| PathBuf::from(DEFAULT_DISPLAY_NAME));
    Ok(PathBuf::from(runtime_dir).join(name))
}
