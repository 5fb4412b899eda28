//! Classification of raw option tokens and up-front validation.
//!
//! Everything here runs before the first remote call; any failure is fatal to
//! the whole run.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::options::Options;
use crate::time::TimeWindow;

lazy_static! {
    static ref IPV4_REGEX: Regex = Regex::new(
        r"^(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)){3}$"
    )
    .unwrap();
}

/// What a run does to the resources it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Obtain,
    Delete,
}

impl Action {
    /// Accepts the short and long alias of each action.
    pub fn classify(token: &str) -> Result<Self, ValidationError> {
        match token {
            "c" | "create" => Ok(Self::Create),
            "o" | "obtain" => Ok(Self::Obtain),
            "d" | "delete" => Ok(Self::Delete),
            other => Err(ValidationError::InvalidAction(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Obtain => "obtain",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::classify(s)
    }
}

/// How systems in the wildcard are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemType {
    Hostname,
    IpAddress,
}

impl SystemType {
    pub fn classify(token: &str) -> Result<Self, ValidationError> {
        match token {
            "h" | "hostname" => Ok(Self::Hostname),
            "i" | "ip-address" => Ok(Self::IpAddress),
            other => Err(ValidationError::InvalidSystemType(other.to_string())),
        }
    }
}

/// Where a hostname system sends its logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyslogTarget {
    Port(u16),
    DestinationId(i64),
    /// Only reachable on delete, where no destination is required.
    Unspecified,
}

/// A run whose options passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub action: Action,
    pub system_type: SystemType,
    pub target: SyslogTarget,
    pub window: TimeWindow,
}

pub fn is_ipv4(address: &str) -> bool {
    IPV4_REGEX.is_match(address)
}

/// Classify the action and system type, then check the combination.
///
/// Checks run in order: action, system type, destination or address
/// (skipped on delete), date window.
pub fn validate(options: &Options) -> Result<Invocation, ValidationError> {
    let action = Action::classify(&options.action)?;
    let system_type = SystemType::classify(&options.system_type)?;

    let port = options.destination_port;
    let destination_id = options.destination_id;
    let target = match (port, destination_id) {
        (0, 0) => SyslogTarget::Unspecified,
        (0, id) => SyslogTarget::DestinationId(id),
        (port, _) => SyslogTarget::Port(port),
    };

    if action != Action::Delete {
        match system_type {
            SystemType::Hostname => {
                if port != 0 && destination_id != 0 {
                    return Err(ValidationError::AmbiguousDestination);
                }
                if target == SyslogTarget::Unspecified {
                    return Err(ValidationError::MissingDestination);
                }
            }
            SystemType::IpAddress => {
                let addresses = if options.ip_address.is_empty() && !options.is_universal_wildcard()
                {
                    options.wildcard_entries()
                } else {
                    vec![options.ip_address.as_str()]
                };
                if let Some(bad) = addresses.into_iter().find(|a| !is_ipv4(a)) {
                    return Err(ValidationError::InvalidIpAddress(bad.to_string()));
                }
            }
        }
    }

    let window = TimeWindow::parse(&options.start_date, &options.end_date)?;

    Ok(Invocation {
        action,
        system_type,
        target,
        window,
    })
}
