//! Validated query request.
//!
//! A [`Request`] can only be built by [`crate::domain::validation::validate`],
//! so holding one means every field constraint has been checked.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Opaque result produced by the execution collaborator.
pub type QueryResult = serde_json::Value;

/// Default VRF when the payload omits one.
pub const DEFAULT_VRF: &str = "default";

/// Supported query types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    BgpRoute,
    BgpCommunity,
    BgpAspath,
    Ping,
    Traceroute,
}

impl QueryType {
    pub const ALL: [QueryType; 5] = [
        QueryType::BgpRoute,
        QueryType::BgpCommunity,
        QueryType::BgpAspath,
        QueryType::Ping,
        QueryType::Traceroute,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::BgpRoute => "bgp_route",
            QueryType::BgpCommunity => "bgp_community",
            QueryType::BgpAspath => "bgp_aspath",
            QueryType::Ping => "ping",
            QueryType::Traceroute => "traceroute",
        }
    }

    /// Whether a `source` address may accompany this query
    pub fn accepts_source(&self) -> bool {
        matches!(self, QueryType::Ping | QueryType::Traceroute)
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryType::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or(())
    }
}

/// A single validated query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    query_type: QueryType,
    vrf: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<IpAddr>,
}

impl Request {
    /// Only the validator constructs requests.
    pub(crate) fn new_unchecked(
        query_type: QueryType,
        vrf: String,
        target: String,
        source: Option<IpAddr>,
    ) -> Self {
        Self {
            query_type,
            vrf,
            target,
            source,
        }
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn vrf(&self) -> &str {
        &self.vrf
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn source(&self) -> Option<IpAddr> {
        self.source
    }
}
