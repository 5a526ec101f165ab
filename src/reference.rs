//! recipe references and package coordinates

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// placeholder used for an omitted user or channel
pub const UNSET: &str = "_";

/// a reference as typed by the user: `[[name/]version]@[user[/channel]]`
///
/// name and version may be left for the recipe to declare, so they are optional
/// here. user and channel are always resolved, defaulting to `_`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub name: Option<String>,
    pub version: Option<String>,
    pub user: String,
    pub channel: String,
}

impl Reference {
    /// parse a reference string
    pub fn parse(s: &str) -> Result<Self> {
        let (nv, uc) = match s.split_once('@') {
            Some((nv, uc)) => (nv, uc),
            None => (s, ""),
        };

        let (name, version) = match split_parts(nv, s)?.as_slice() {
            [] => (None, None),
            [version] => (None, Some(version.to_string())),
            [name, version] => (Some(name.to_string()), Some(version.to_string())),
            _ => return Err(Error::InvalidReference(s.to_string())),
        };

        let (user, channel) = match split_parts(uc, s)?.as_slice() {
            [] => (UNSET.to_string(), UNSET.to_string()),
            [user] => (user.to_string(), UNSET.to_string()),
            [user, channel] => (user.to_string(), channel.to_string()),
            _ => return Err(Error::InvalidReference(s.to_string())),
        };

        Ok(Self {
            name,
            version,
            user: or_unset(user),
            channel: or_unset(channel),
        })
    }

    /// turn into a full coordinate, requiring name and version to be present
    pub fn into_coordinate(self, original: &str) -> Result<PackageCoordinate> {
        match (self.name, self.version) {
            (Some(name), Some(version)) => {
                PackageCoordinate::new(name, version, self.user, self.channel)
            }
            _ => Err(Error::IncompleteReference(original.to_string())),
        }
    }
}

impl FromStr for Reference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// split one side of a reference on '/', where an empty side means no parts
fn split_parts<'a>(side: &'a str, whole: &str) -> Result<Vec<&'a str>> {
    if side.is_empty() {
        return Ok(vec![]);
    }
    let parts: Vec<&str> = side.split('/').collect();
    if parts.len() > 2 {
        return Err(Error::InvalidReference(whole.to_string()));
    }
    Ok(parts)
}

fn or_unset(s: String) -> String {
    if s.is_empty() {
        UNSET.to_string()
    } else {
        s
    }
}

/// fully resolved identity of a recipe: name/version@user/channel
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PackageCoordinate {
    name: String,
    version: String,
    user: String,
    channel: String,
}

impl PackageCoordinate {
    /// create a coordinate, validating that every part is a usable path segment
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        user: impl Into<String>,
        channel: impl Into<String>,
    ) -> Result<Self> {
        let coord = Self {
            name: name.into(),
            version: version.into(),
            user: user.into(),
            channel: channel.into(),
        };
        for part in [&coord.name, &coord.version, &coord.user, &coord.channel] {
            validate_segment(part, &coord)?;
        }
        Ok(coord)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// true when neither user nor channel were given
    pub fn is_unqualified(&self) -> bool {
        self.user == UNSET && self.channel == UNSET
    }
}

impl fmt::Display for PackageCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unqualified() {
            write!(f, "{}/{}@", self.name, self.version)
        } else {
            write!(
                f,
                "{}/{}@{}/{}",
                self.name, self.version, self.user, self.channel
            )
        }
    }
}

/// each part of a coordinate becomes a directory name in the store
fn validate_segment(part: &str, coord: &PackageCoordinate) -> Result<()> {
    let bad = part.is_empty()
        || part == "."
        || part == ".."
        || part.contains('/')
        || part.contains('\\')
        || part.contains('\0');
    if bad {
        return Err(Error::InvalidReference(format!(
            "{}/{}@{}/{}",
            coord.name, coord.version, coord.user, coord.channel
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_reference() {
        let r = Reference::parse("zlib/1.3@bfgroup/stable").unwrap();
        assert_eq!(r.name.as_deref(), Some("zlib"));
        assert_eq!(r.version.as_deref(), Some("1.3"));
        assert_eq!(r.user, "bfgroup");
        assert_eq!(r.channel, "stable");
    }

    #[test]
    fn test_parse_defaults_user_channel() {
        let r = Reference::parse("zlib/1.3@").unwrap();
        assert_eq!(r.user, UNSET);
        assert_eq!(r.channel, UNSET);

        let r = Reference::parse("zlib/1.3").unwrap();
        assert_eq!(r.user, UNSET);
        assert_eq!(r.channel, UNSET);

        let r = Reference::parse("zlib/1.3@bfgroup").unwrap();
        assert_eq!(r.user, "bfgroup");
        assert_eq!(r.channel, UNSET);

        let r = Reference::parse("zlib/1.3@/testing").unwrap();
        assert_eq!(r.user, UNSET);
        assert_eq!(r.channel, "testing");
    }

    #[test]
    fn test_parse_partial_name_version() {
        let r = Reference::parse("1.3@").unwrap();
        assert_eq!(r.name, None);
        assert_eq!(r.version.as_deref(), Some("1.3"));

        let r = Reference::parse("@user/channel").unwrap();
        assert_eq!(r.name, None);
        assert_eq!(r.version, None);
        assert_eq!(r.user, "user");
    }

    #[test]
    fn test_parse_too_many_parts() {
        assert!(Reference::parse("a/b/c@").is_err());
        assert!(Reference::parse("a/b@u/c/d").is_err());
    }

    #[test]
    fn test_into_coordinate_requires_name_and_version() {
        let err = Reference::parse("1.3@")
            .unwrap()
            .into_coordinate("1.3@")
            .unwrap_err();
        assert!(matches!(err, Error::IncompleteReference(_)));

        let coord = Reference::parse("zlib/1.3@")
            .unwrap()
            .into_coordinate("zlib/1.3@")
            .unwrap();
        assert_eq!(coord.name(), "zlib");
        assert_eq!(coord.version(), "1.3");
    }

    #[test]
    fn test_coordinate_rejects_path_traversal() {
        assert!(PackageCoordinate::new("..", "1.0", "_", "_").is_err());
        assert!(PackageCoordinate::new("zlib", "", "_", "_").is_err());
        assert!(PackageCoordinate::new("zlib", "1.0", "a\0b", "_").is_err());
        assert!(PackageCoordinate::new("zlib", "1.0", "_", "_").is_ok());
    }

    #[test]
    fn test_coordinate_display() {
        let c = PackageCoordinate::new("zlib", "1.3", "_", "_").unwrap();
        assert_eq!(c.to_string(), "zlib/1.3@");

        let c = PackageCoordinate::new("zlib", "1.3", "bfgroup", "_").unwrap();
        assert_eq!(c.to_string(), "zlib/1.3@bfgroup/_");
    }
}
