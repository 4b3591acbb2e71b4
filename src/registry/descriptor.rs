//! Persisted destination descriptors
//!
//! A descriptor is the storage form of a destination: the community plus
//! references to its two messages. Descriptors serialize to a compact string
//! (`<community>:<channel>/<message>:<channel>/<message>`) so the settings
//! document stays readable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::id::{parse_u64, CommunityId, ParseIdError};

/// Reference to a single chat message (channel + message id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageRef {
    /// Channel the message lives in
    pub channel_id: u64,
    /// Message id within the channel
    pub message_id: u64,
}

impl MessageRef {
    /// Create a new message reference
    pub fn new(channel_id: u64, message_id: u64) -> Self {
        Self {
            channel_id,
            message_id,
        }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.message_id)
    }
}

impl FromStr for MessageRef {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channel, message) = s
            .split_once('/')
            .ok_or_else(|| ParseIdError::new(s, "expected <channel>/<message>"))?;

        Ok(Self::new(parse_u64(channel)?, parse_u64(message)?))
    }
}

/// Storage form of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DestinationDescriptor {
    /// Community hosting the destination
    pub community: CommunityId,
    /// Message carrying the stream attachment
    pub stream: MessageRef,
    /// Message carrying the status text
    pub status: MessageRef,
}

impl DestinationDescriptor {
    /// Create a new descriptor
    pub fn new(community: CommunityId, stream: MessageRef, status: MessageRef) -> Self {
        Self {
            community,
            stream,
            status,
        }
    }
}

impl fmt::Display for DestinationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.community, self.stream, self.status)
    }
}

impl FromStr for DestinationDescriptor {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');

        let (Some(community), Some(stream), Some(status), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseIdError::new(
                s,
                "expected <community>:<channel>/<message>:<channel>/<message>",
            ));
        };

        Ok(Self::new(community.parse()?, stream.parse()?, status.parse()?))
    }
}

impl Serialize for DestinationDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DestinationDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let compact = String::deserialize(deserializer)?;
        compact.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_form() {
        let descriptor =
            DestinationDescriptor::new(CommunityId(1), MessageRef::new(2, 3), MessageRef::new(2, 4));

        assert_eq!(descriptor.to_string(), "1:2/3:2/4");
        assert_eq!("1:2/3:2/4".parse::<DestinationDescriptor>().unwrap(), descriptor);
    }

    #[test]
    fn test_malformed_compact_form() {
        assert!("1:2/3".parse::<DestinationDescriptor>().is_err());
        assert!("1:2/3:2/4:5".parse::<DestinationDescriptor>().is_err());
        assert!("1:23:2/4".parse::<DestinationDescriptor>().is_err());
        assert!("x:2/3:2/4".parse::<DestinationDescriptor>().is_err());
    }

    #[test]
    fn test_serialized_as_string() {
        let descriptor =
            DestinationDescriptor::new(CommunityId(10), MessageRef::new(20, 30), MessageRef::new(20, 31));

        let json = serde_json::to_string(&descriptor).unwrap();
        assert_eq!(json, "\"10:20/30:20/31\"");

        let back: DestinationDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, descriptor);

        let bad = serde_json::from_str::<DestinationDescriptor>("\"10:20/30\"");
        assert!(bad.is_err());
    }
}
