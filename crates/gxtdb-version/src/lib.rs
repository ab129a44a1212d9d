//! Tool version utilities for gxtdb.
//!
//! Galaxy tool versions loosely follow PEP 440 (`1.9+galaxy2`, `0.7.17.1`,
//! `2.0b3`). This crate parses them into a comparable form so the record store
//! can answer "which version is newest" the same way the upstream packaging
//! ecosystem does. Strings that don't fit the grammar are kept as legacy
//! versions, which sort below every well-formed version.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*v?",
        r"(?:(?P<epoch>[0-9]+)!)?",
        r"(?P<release>[0-9]+(?:\.[0-9]+)*)",
        r"(?:[-_.]?(?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)[-_.]?(?P<pre_n>[0-9]+)?)?",
        r"(?:-(?P<post_n1>[0-9]+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)?",
        r"(?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?",
        r"(?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?",
        r"\s*$",
    ))
    .unwrap_or_else(|e| panic!("version pattern must compile: {e}"))
});

/// Pre-release phase, ordered alpha < beta < release candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    Candidate,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::Candidate,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            PreRelease::Alpha => "a",
            PreRelease::Beta => "b",
            PreRelease::Candidate => "rc",
        }
    }
}

/// One dot-separated piece of a local version label (`galaxy2` in `1.0+galaxy2`).
///
/// Numeric segments sort above alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    Alpha(String),
    Numeric(u64),
}

/// A parsed, well-formed tool version.
#[derive(Debug, Clone)]
pub struct Release {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreRelease, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Vec<LocalSegment>,
}

/// Where a release sits relative to its pre-releases.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PhaseKey {
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

impl Release {
    fn trimmed_release(&self) -> &[u64] {
        let end = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        &self.release[..end]
    }

    fn phase_key(&self) -> PhaseKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PhaseKey::DevOnly,
            (Some((phase, n)), _, _) => PhaseKey::Pre(phase, n),
            (None, _, _) => PhaseKey::Final,
        }
    }

    fn dev_key(&self) -> (bool, u64) {
        (self.dev.is_none(), self.dev.unwrap_or(0))
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.phase_key().cmp(&other.phase_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{}", phase.as_str(), n)?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self
                .local
                .iter()
                .map(|s| match s {
                    LocalSegment::Alpha(a) => a.clone(),
                    LocalSegment::Numeric(n) => n.to_string(),
                })
                .collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

/// A tool version as recorded by a Galaxy server or a workflow.
#[derive(Debug, Clone)]
pub enum ToolVersion {
    /// Version matching the PEP 440 grammar.
    Release(Release),
    /// Anything else, compared lexically and always older than a [`Release`].
    Legacy(String),
}

impl ToolVersion {
    /// Parse a version string. Never fails: unparsable input becomes [`ToolVersion::Legacy`].
    pub fn parse(version: &str) -> Self {
        match parse_release(version) {
            Ok(release) => ToolVersion::Release(release),
            Err(_) => ToolVersion::Legacy(version.to_string()),
        }
    }

    /// Parse a version string, rejecting anything outside the PEP 440 grammar.
    pub fn parse_strict(version: &str) -> Result<Self, VersionError> {
        parse_release(version).map(ToolVersion::Release)
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, ToolVersion::Legacy(_))
    }
}

impl PartialEq for ToolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToolVersion {}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ToolVersion::Release(a), ToolVersion::Release(b)) => a.compare(b),
            (ToolVersion::Legacy(a), ToolVersion::Legacy(b)) => a.cmp(b),
            (ToolVersion::Legacy(_), ToolVersion::Release(_)) => Ordering::Less,
            (ToolVersion::Release(_), ToolVersion::Legacy(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolVersion::Release(r) => r.fmt(f),
            ToolVersion::Legacy(s) => f.write_str(s),
        }
    }
}

fn parse_release(version: &str) -> Result<Release, VersionError> {
    let lowered = version.to_ascii_lowercase();
    let caps = VERSION_PATTERN
        .captures(&lowered)
        .ok_or(VersionError::InvalidFormat)?;

    let number = |name: &str| -> Result<Option<u64>, VersionError> {
        caps.name(name)
            .map(|m| m.as_str().parse::<u64>().map_err(|_| VersionError::InvalidNumber))
            .transpose()
    };

    let epoch = number("epoch")?.unwrap_or(0);
    let release = caps
        .name("release")
        .ok_or(VersionError::InvalidFormat)?
        .as_str()
        .split('.')
        .map(|n| n.parse().map_err(|_| VersionError::InvalidNumber))
        .collect::<Result<Vec<u64>, _>>()?;

    let pre = match caps.name("pre_l") {
        Some(label) => Some((
            PreRelease::from_label(label.as_str()),
            number("pre_n")?.unwrap_or(0),
        )),
        None => None,
    };

    let post = if caps.name("post_n1").is_some() {
        number("post_n1")?
    } else if caps.name("post_l").is_some() {
        Some(number("post_n2")?.unwrap_or(0))
    } else {
        None
    };

    let dev = match caps.name("dev_l") {
        Some(_) => Some(number("dev_n")?.unwrap_or(0)),
        None => None,
    };

    let local = caps
        .name("local")
        .map(|m| {
            m.as_str()
                .split(['-', '_', '.'])
                .map(|seg| match seg.parse::<u64>() {
                    Ok(n) => LocalSegment::Numeric(n),
                    Err(_) => LocalSegment::Alpha(seg.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Release {
        epoch,
        release,
        pre,
        post,
        dev,
        local,
    })
}

/// Sort version strings newest first. Equal versions keep their input order.
pub fn version_sorted<I, S>(versions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keyed: Vec<(ToolVersion, String)> = versions
        .into_iter()
        .map(|v| (ToolVersion::parse(v.as_ref()), v.as_ref().to_string()))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, v)| v).collect()
}

/// Newest version among `versions`, if any.
pub fn latest_version<I, S>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    version_sorted(versions).into_iter().next()
}

/// Error type for strict version parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionError {
    InvalidFormat,
    InvalidNumber,
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidFormat => write!(f, "Invalid tool version format"),
            VersionError::InvalidNumber => write!(f, "Invalid version number"),
        }
    }
}

impl std::error::Error for VersionError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ToolVersion {
        ToolVersion::parse(s)
    }

    #[test]
    fn parse_simple_release() {
        match v("1.2.3") {
            ToolVersion::Release(r) => {
                assert_eq!(r.release, vec![1, 2, 3]);
                assert!(r.pre.is_none());
                assert!(r.local.is_empty());
            }
            ToolVersion::Legacy(_) => panic!("expected release"),
        }
    }

    #[test]
    fn parse_galaxy_local_suffix() {
        match v("1.9+galaxy2") {
            ToolVersion::Release(r) => {
                assert_eq!(r.release, vec![1, 9]);
                assert_eq!(r.local, vec![LocalSegment::Alpha("galaxy2".into())]);
            }
            ToolVersion::Legacy(_) => panic!("expected release"),
        }
    }

    #[test]
    fn galaxy_suffix_orders_wrappers() {
        assert!(v("1.9+galaxy1") < v("1.9+galaxy2"));
        assert!(v("1.9") < v("1.9+galaxy0"));
        assert!(v("1.9+galaxy2") < v("1.10"));
    }

    #[test]
    fn trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("0.7.17") < v("0.7.17.1"));
    }

    #[test]
    fn prerelease_ordering() {
        assert!(v("1.0.dev1") < v("1.0a1"));
        assert!(v("1.0a1") < v("1.0b1"));
        assert!(v("1.0b1") < v("1.0rc1"));
        assert!(v("1.0rc1") < v("1.0"));
        assert!(v("1.0") < v("1.0.post1"));
    }

    #[test]
    fn numeric_segments_compare_numerically() {
        assert!(v("2.9") < v("2.10"));
        assert!(v("0.1.18") < v("0.1.19"));
    }

    #[test]
    fn legacy_versions_sort_below_releases() {
        let legacy = v("not a version");
        assert!(legacy.is_legacy());
        assert!(legacy < v("0.0.1"));
    }

    #[test]
    fn strict_parse_rejects_garbage() {
        assert_eq!(
            ToolVersion::parse_strict("banana split"),
            Err(VersionError::InvalidFormat)
        );
    }

    #[test]
    fn version_sorted_is_newest_first() {
        let sorted = version_sorted(["1.0", "2.1", "1.10", "1.9+galaxy2"]);
        assert_eq!(sorted, vec!["2.1", "1.10", "1.9+galaxy2", "1.0"]);
    }

    #[test]
    fn latest_version_of_empty_is_none() {
        assert_eq!(latest_version(Vec::<String>::new()), None);
        assert_eq!(latest_version(["0.1", "0.2"]), Some("0.2".to_string()));
    }

    #[test]
    fn display_normalizes() {
        assert_eq!(v("1.0-alpha-1").to_string(), "1.0a1");
        assert_eq!(v("1.9+galaxy2").to_string(), "1.9+galaxy2");
    }
}
