#![forbid(unsafe_code)]

use std::{fs, path::PathBuf};

/// Upper bound on symlink hops followed by [`resolve_link`].
///
/// The historical behavior this helper inherits had no cycle guard and
/// would loop forever on a cyclic chain; we bound the walk instead
/// (matching the kernel's ELOOP limit) and return whatever path the walk
/// reached. Non-cyclic inputs are unaffected.
const MAX_LINK_HOPS: usize = 40;

/// Follow symlink indirection one level at a time until the target is not
/// itself a symlink.
///
/// Relative link targets are resolved against the directory of the path
/// being resolved. The walk stops at the first read-link failure, which
/// for regular files simply means "not a symlink"; no further
/// canonicalization is attempted.
pub fn resolve_link(path: impl Into<PathBuf>) -> PathBuf {
    let mut path = path.into();
    for _ in 0..MAX_LINK_HOPS {
        match fs::read_link(&path) {
            Ok(target) => {
                path = if target.is_absolute() {
                    target
                } else {
                    match path.parent() {
                        Some(dir) => dir.join(target),
                        None => target,
                    }
                };
            }
            Err(_) => break,
        }
    }
    path
}
