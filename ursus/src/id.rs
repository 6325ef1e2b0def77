//! Channel and action identifiers.
//!
//! A [`ChannelId`] names the server-side channel resource and is safe to use
//! as a URL path segment. [`ActionId`]s correlate outbound actions with the
//! responses that come back over the event stream.

use core::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the random suffix of a [`ChannelId`].
const RANDOM_SUFFIX_MAX: u32 = 0x00FF_FFFF;

/// An opaque channel identifier of the form `<unix-millis>-<6 hex digits>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// Generate a fresh channel identifier from the wall clock and a random
    /// 24-bit suffix.
    #[must_use]
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let suffix = rand::random::<u32>() & RANDOM_SUFFIX_MAX;
        Self(format!("{millis}-{suffix:06x}"))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single action sent over a channel.
///
/// The id of a subscribe action doubles as the subscription id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ActionId(u64);

impl ActionId {
    /// Wrap a raw action id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ActionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic action id counter. Starts at zero; the first id handed out is 1.
#[derive(Debug, Default, Clone)]
pub(crate) struct ActionIds {
    last: u64,
}

impl ActionIds {
    /// Allocate the next action id.
    pub(crate) fn allocate(&mut self) -> ActionId {
        self.last += 1;
        ActionId(self.last)
    }

    /// Restart numbering from zero.
    pub(crate) fn reset(&mut self) {
        self.last = 0;
    }
}
