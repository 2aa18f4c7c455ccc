// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Log Locators
//!
//! Where a canonical record lives in the external append-only log.
//!
//! # URI format
//! ```text
//! scheme://<topicId>/<seconds>.<nanoseconds>
//! hcs://0.0.48123/1700000000.000000042
//! ```
//! Timestamps always render with nine nanosecond digits; parsing accepts
//! one to nine and right-pads.

use core::fmt;
use core::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// Consensus timestamp of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConsensusTimestamp {
    pub seconds: u64,
    pub nanos: u32,
}

impl ConsensusTimestamp {
    pub fn new(seconds: u64, nanos: u32) -> KernelResult<Self> {
        if nanos >= 1_000_000_000 {
            return Err(KernelError::InvalidLocator(format!(
                "nanoseconds out of range: {}",
                nanos
            )));
        }
        Ok(Self { seconds, nanos })
    }

    /// Wall clock, for log services that assign their own timestamps.
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            seconds: now.timestamp().max(0) as u64,
            nanos: now.timestamp_subsec_nanos().min(999_999_999),
        }
    }

    /// The next representable timestamp (one nanosecond later).
    pub fn successor(&self) -> Self {
        if self.nanos == 999_999_999 {
            Self { seconds: self.seconds + 1, nanos: 0 }
        } else {
            Self { seconds: self.seconds, nanos: self.nanos + 1 }
        }
    }
}

impl fmt::Display for ConsensusTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

impl FromStr for ConsensusTimestamp {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || KernelError::InvalidLocator(format!("invalid consensus timestamp: {:?}", s));

        let (secs, frac) = match s.split_once('.') {
            Some((secs, frac)) => (secs, Some(frac)),
            None => (s, None),
        };

        if secs.is_empty() || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        let seconds: u64 = secs.parse().map_err(|_| bad())?;

        let nanos = match frac {
            None => 0,
            Some(frac) => {
                if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(bad());
                }
                let padded = format!("{:0<9}", frac);
                padded.parse::<u32>().map_err(|_| bad())?
            }
        };

        ConsensusTimestamp::new(seconds, nanos)
    }
}

impl TryFrom<String> for ConsensusTimestamp {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConsensusTimestamp> for String {
    fn from(ts: ConsensusTimestamp) -> Self {
        ts.to_string()
    }
}

/// A parsed `scheme://topic/timestamp` locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locator {
    pub scheme: String,
    pub topic_id: String,
    pub timestamp: ConsensusTimestamp,
}

impl Locator {
    pub fn new(
        scheme: impl Into<String>,
        topic_id: impl Into<String>,
        timestamp: ConsensusTimestamp,
    ) -> KernelResult<Self> {
        let scheme = scheme.into();
        let topic_id = topic_id.into();
        validate_scheme(&scheme)?;
        validate_topic(&topic_id)?;
        Ok(Self { scheme, topic_id, timestamp })
    }

    pub fn parse(uri: &str) -> KernelResult<Self> {
        let uri = uri.trim();
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| KernelError::InvalidLocator(format!("missing scheme in {:?}", uri)))?;

        let mut parts = rest.split('/');
        let topic = parts.next().unwrap_or_default();
        let ts = parts
            .next()
            .ok_or_else(|| KernelError::InvalidLocator(format!("missing timestamp in {:?}", uri)))?;
        if parts.next().is_some() {
            return Err(KernelError::InvalidLocator(format!(
                "unexpected trailing path in {:?}",
                uri
            )));
        }

        Locator::new(scheme, topic, ts.parse()?)
    }

    pub fn to_uri(&self) -> String {
        format!("{}://{}/{}", self.scheme, self.topic_id, self.timestamp)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for Locator {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locator::parse(s)
    }
}

/// Result of a successful append. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAnchor {
    pub topic_id: String,
    pub sequence_number: u64,
    pub timestamp: ConsensusTimestamp,
}

impl ExternalAnchor {
    pub fn locator(&self, scheme: &str) -> KernelResult<Locator> {
        Locator::new(scheme, self.topic_id.clone(), self.timestamp)
    }

    pub fn uri(&self, scheme: &str) -> KernelResult<String> {
        Ok(self.locator(scheme)?.to_uri())
    }
}

fn validate_scheme(scheme: &str) -> KernelResult<()> {
    let valid = scheme
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return Err(KernelError::InvalidLocator(format!("invalid scheme: {:?}", scheme)));
    }
    Ok(())
}

fn validate_topic(topic: &str) -> KernelResult<()> {
    if topic.is_empty() || topic.chars().any(|c| c == '/' || c.is_whitespace() || c.is_control()) {
        return Err(KernelError::InvalidLocator(format!("invalid topic id: {:?}", topic)));
    }
    Ok(())
}
