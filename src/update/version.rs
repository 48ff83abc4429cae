//! Version normalisation and ordering.
//!
//! Release tags are usually `v`-prefixed (`v1.4.2`) while the running binary
//! reports a bare `CARGO_PKG_VERSION` (`1.4.2`). Both are normalised to the
//! prefixed form before comparison. Ordering follows semver precedence:
//! major/minor/patch numerically, then prerelease, with build metadata
//! ignored.

use crate::error::{Result, UpdateError};
use semver::Version;
use std::cmp::Ordering;

/// Prefix the `v` marker if it is absent.
///
/// Idempotent: `normalize(&normalize(v)) == normalize(v)`.
pub fn normalize(version: &str) -> String {
    if version.starts_with('v') {
        version.to_owned()
    } else {
        format!("v{version}")
    }
}

/// Parse a version identifier, with or without the `v` marker.
///
/// Shorthand `v1` and `v1.2` are accepted as `1.0.0` and `1.2.0`; shorthand
/// forms cannot carry prerelease or build suffixes. Returns `None` for
/// anything that is not valid semver after that coercion.
pub fn parse(version: &str) -> Option<Version> {
    let normalized = normalize(version);
    let bare = &normalized[1..];

    let has_suffix = bare.contains(['-', '+']);
    let components = bare.split('.').count();
    let expanded = match (components, has_suffix) {
        (1, false) => format!("{bare}.0.0"),
        (2, false) => format!("{bare}.0"),
        _ => bare.to_owned(),
    };

    Version::parse(&expanded).ok()
}

/// Returns `true` if `candidate` should replace `current`.
///
/// - An unparseable `current` always yields `true`, so binaries built without
///   a semver tag (e.g. `dev`) can bootstrap onto a released version.
/// - An unparseable `candidate` is an error: the provider returned data we
///   cannot order, and the attempt must stop.
/// - Equal versions yield `false`.
///
/// # Errors
///
/// Returns [`UpdateError::InvalidVersion`] if `candidate` is not valid semver.
pub fn is_newer(current: &str, candidate: &str) -> Result<bool> {
    let Some(current) = parse(current) else {
        return Ok(true);
    };
    let Some(latest) = parse(candidate) else {
        return Err(UpdateError::InvalidVersion {
            version: candidate.to_owned(),
        });
    };

    Ok(precedence(&current, &latest) == Ordering::Less)
}

/// Semver precedence, ignoring build metadata.
fn precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}
