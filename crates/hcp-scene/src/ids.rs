use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Key of a node within a scene. Never reused after the node is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Runtime identity of one instantiated behaviour unit.
///
/// Assigned when the unit is attached and invalidated when its node is
/// destroyed. A recreated node receives fresh instance ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub(crate) i64);

impl InstanceId {
    /// Wraps a raw instance id, typically one parsed from a client request.
    #[must_use]
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for InstanceId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse().map(Self)
    }
}
