//! A small hand-rolled engine-version comparator (spec section 4.7
//! implementation notes).
//!
//! The version strings in play here (`"3.2.0-dev1"`, `"4.3.0-stable"`) are
//! not full SemVer - the prerelease grammar differs and sorts lexically by
//! an ad hoc tag vocabulary (`dev1` < `dev2` < `beta1` < `rc1` < `stable`)
//! rather than SemVer's dotted prerelease identifiers. Pulling in the
//! `semver` crate to parse a grammar it doesn't actually implement would
//! trade a couple dozen lines of parsing for a dependency that still needs
//! a hand-rolled tag comparator bolted on - not worth it. See DESIGN.md.

use std::cmp::Ordering;

/// A parsed `MAJOR.MINOR.PATCH[-tag]` engine version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// `None` means "final/stable release" - sorts after every tagged
    /// pre-release with the same major.minor.patch.
    pub tag: Option<String>,
}

impl EngineVersion {
    pub fn parse(s: &str) -> Option<EngineVersion> {
        let (core, tag) = match s.split_once('-') {
            // "-stable" is a final release, not a pre-release tag - treat it
            // the same as no tag at all so it sorts after every `devN`/`rcN`
            // of the same major.minor.patch.
            Some((core, "stable")) => (core, None),
            Some((core, tag)) => (core, Some(tag.to_string())),
            None => (s, None),
        };
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().unwrap_or("0").parse().ok()?;
        let patch = parts.next().unwrap_or("0").parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(EngineVersion {
            major,
            minor,
            patch,
            tag,
        })
    }

    /// Ordinal rank of a known pre-release tag family; unrecognized tags
    /// sort before all known ones (conservative: treat unknown as "earlier"
    /// rather than silently claiming an ordering we can't justify).
    fn tag_rank(tag: &str) -> (u32, u32) {
        let (family, num) = match tag.find(|c: char| c.is_ascii_digit()) {
            Some(idx) => (&tag[..idx], tag[idx..].parse().unwrap_or(0)),
            None => (tag, 0),
        };
        let family_rank = match family {
            "dev" => 0,
            "alpha" => 1,
            "beta" => 2,
            "rc" => 3,
            _ => u32::MIN,
        };
        (family_rank, num)
    }
}

impl PartialOrd for EngineVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EngineVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.tag, &other.tag) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) if a == b => Ordering::Equal,
                (Some(a), Some(b)) => Self::tag_rank(a).cmp(&Self::tag_rank(b)),
            })
    }
}

/// `true` when `candidate` falls within `[min, max]`, `max` being
/// open-ended (`None`) meaning "no upper bound" (spec section 3:
/// "`max` may be empty meaning open-ended").
pub fn in_range(candidate: &EngineVersion, min: &str, max: Option<&str>) -> bool {
    let Some(min_v) = EngineVersion::parse(min) else {
        return false;
    };
    if *candidate < min_v {
        return false;
    }
    match max {
        None => true,
        Some(max_s) => match EngineVersion::parse(max_s) {
            Some(max_v) => *candidate <= max_v,
            None => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_and_tag() {
        let v = EngineVersion::parse("3.2.0-dev1").unwrap();
        assert_eq!(v.major, 3);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 0);
        assert_eq!(v.tag.as_deref(), Some("dev1"));
    }

    #[test]
    fn stable_sorts_after_prerelease_of_same_core() {
        let dev = EngineVersion::parse("3.2.0-dev1").unwrap();
        let stable = EngineVersion::parse("3.2.0").unwrap();
        assert!(dev < stable);
    }

    #[test]
    fn prerelease_families_order_dev_before_rc() {
        let dev = EngineVersion::parse("4.0.0-dev1").unwrap();
        let rc = EngineVersion::parse("4.0.0-rc1").unwrap();
        assert!(dev < rc);
    }

    #[test]
    fn range_is_inclusive_and_open_ended_max() {
        let v = EngineVersion::parse("3.1.5").unwrap();
        assert!(in_range(&v, "3.0.0", Some("3.2.0")));
        assert!(in_range(&v, "3.0.0", None));
        assert!(!in_range(&v, "3.2.0", None));
    }
}
