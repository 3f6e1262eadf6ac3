//! Identifier definitions.

use std::fmt;
use std::str::FromStr;

use crate::{define_id, IdError};

// =============================================================================
// Requests
// =============================================================================

define_id!(RequestId, "req");

// =============================================================================
// Hosts
// =============================================================================

/// Identifier of a schedulable host or `host@backend#pool` composite.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostId(String);

impl HostId {
    /// Separator between the host/backend part and the pool name.
    pub const POOL_SEPARATOR: char = '#';

    /// Separator between the host name and the backend name.
    pub const BACKEND_SEPARATOR: char = '@';

    /// Parses a host ID. Any non-empty string without whitespace is valid.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(IdError::InvalidHostId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the full ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host name without backend or pool.
    pub fn host(&self) -> &str {
        let end = self
            .0
            .find([Self::BACKEND_SEPARATOR, Self::POOL_SEPARATOR])
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Backend name, if the ID has the `host@backend` form.
    pub fn backend(&self) -> Option<&str> {
        let without_pool = self
            .0
            .split_once(Self::POOL_SEPARATOR)
            .map_or(self.0.as_str(), |(head, _)| head);
        without_pool
            .split_once(Self::BACKEND_SEPARATOR)
            .map(|(_, backend)| backend)
    }

    /// Pool name, if the ID has a `#pool` suffix.
    pub fn pool(&self) -> Option<&str> {
        self.0
            .split_once(Self::POOL_SEPARATOR)
            .map(|(_, pool)| pool)
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for HostId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for HostId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for HostId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl serde::Serialize for HostId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for HostId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_request_id_prefix() {
        let id = RequestId::new();
        assert!(id.to_string().starts_with("req_"));
    }

    #[test]
    fn test_request_id_roundtrip() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_request_id_invalid_prefix() {
        let result: Result<RequestId, _> = "host_01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(result.unwrap_err().is_prefix_error());
    }

    #[test]
    fn test_request_id_missing_separator() {
        let result: Result<RequestId, _> = "req01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert_eq!(result.unwrap_err(), IdError::MissingSeparator);
    }

    #[test]
    fn test_request_id_invalid_ulid() {
        let result: Result<RequestId, _> = "req_nope".parse();
        assert!(matches!(result.unwrap_err(), IdError::InvalidUlid(_)));
    }

    #[test]
    fn test_host_id_plain() {
        let id = HostId::parse("host1").unwrap();
        assert_eq!(id.host(), "host1");
        assert_eq!(id.backend(), None);
        assert_eq!(id.pool(), None);
    }

    #[test]
    fn test_host_id_composite() {
        let id = HostId::parse("node3@lvm#fast").unwrap();
        assert_eq!(id.host(), "node3");
        assert_eq!(id.backend(), Some("lvm"));
        assert_eq!(id.pool(), Some("fast"));
    }

    #[test]
    fn test_host_id_pool_without_backend() {
        let id = HostId::parse("host1#pool1").unwrap();
        assert_eq!(id.host(), "host1");
        assert_eq!(id.backend(), None);
        assert_eq!(id.pool(), Some("pool1"));
    }

    #[test]
    fn test_host_id_rejects_empty_and_whitespace() {
        assert!(HostId::parse("").unwrap_err().is_empty());
        assert!(matches!(
            HostId::parse("host 1").unwrap_err(),
            IdError::InvalidHostId(_)
        ));
    }

    #[test]
    fn test_host_id_equality_is_exact() {
        let a = HostId::parse("host1#pool1").unwrap();
        let b = HostId::parse("host1#pools1").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, "host1#pool1");
    }

    #[test]
    fn test_host_id_json_is_plain_string() {
        let id = HostId::parse("host1#pool1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"host1#pool1\"");
        let err = serde_json::from_str::<HostId>("\"\"");
        assert!(err.is_err());
    }

    proptest! {
        #[test]
        fn prop_host_parts_come_from_the_id(host in "[a-z0-9]{1,12}", pool in "[a-z0-9]{1,8}") {
            let id = HostId::parse(&format!("{host}#{pool}")).unwrap();
            prop_assert_eq!(id.host(), host.as_str());
            prop_assert_eq!(id.pool(), Some(pool.as_str()));
        }
    }
}
