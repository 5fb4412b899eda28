//! System reconciliation.
//!
//! Systems are looked up by scanning the full system list; a hostname system
//! bound to a destination id is matched on the destination's syslog endpoint,
//! which is resolved remotely first.

use papertrail_client::{
    ClientError, Destination, Papertrail, RemoteApi, System, SystemCreationRequest,
};
use tracing::{debug, info};

use crate::action::{Action, Invocation, SystemType, SyslogTarget};
use crate::error::{Result, SyncError, ValidationError};
use crate::ledger::{Item, ItemKind};
use crate::options::Options;

/// Natural key of a system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemKey {
    HostnamePort { hostname: String, port: u16 },
    HostnameDestination { hostname: String, destination_id: i64 },
    /// Hostname with no destination, only produced for deletes.
    Hostname { hostname: String },
    IpAddress { name: String, address: String },
}

impl SystemKey {
    /// Key for one wildcard entry of a validated run.
    pub fn for_entry(entry: &str, invocation: &Invocation, options: &Options) -> Self {
        let hostname = entry.to_string();
        match invocation.system_type {
            SystemType::IpAddress => Self::IpAddress {
                name: hostname,
                address: options.address_for(entry).to_string(),
            },
            SystemType::Hostname => match invocation.target {
                SyslogTarget::Port(port) => Self::HostnamePort { hostname, port },
                SyslogTarget::DestinationId(destination_id) => Self::HostnameDestination {
                    hostname,
                    destination_id,
                },
                SyslogTarget::Unspecified => Self::Hostname { hostname },
            },
        }
    }

    /// Name the system is known by.
    pub fn name(&self) -> &str {
        match self {
            Self::HostnamePort { hostname, .. }
            | Self::HostnameDestination { hostname, .. }
            | Self::Hostname { hostname } => hostname,
            Self::IpAddress { name, .. } => name,
        }
    }

    /// Creation body for this key. `None` when the key lacks a destination.
    pub fn creation_request(&self) -> Option<SystemCreationRequest> {
        match self {
            Self::HostnamePort { hostname, port } => Some(SystemCreationRequest::ByHostnamePort {
                hostname: hostname.clone(),
                port: *port,
            }),
            Self::HostnameDestination {
                hostname,
                destination_id,
            } => Some(SystemCreationRequest::ByHostnameDestinationId {
                hostname: hostname.clone(),
                destination_id: *destination_id,
            }),
            Self::IpAddress { name, address } => Some(SystemCreationRequest::ByIpAddress {
                name: name.clone(),
                ip_address: address.clone(),
            }),
            Self::Hostname { .. } => None,
        }
    }
}

pub struct SystemReconciler<'a, A> {
    papertrail: &'a Papertrail<A>,
}

impl<'a, A: RemoteApi> SystemReconciler<'a, A> {
    pub fn new(papertrail: &'a Papertrail<A>) -> Self {
        Self { papertrail }
    }

    /// Find the system identified by `key`, if it exists.
    pub async fn lookup(&self, key: &SystemKey) -> Result<Option<System>> {
        let found = match key {
            SystemKey::HostnamePort { hostname, port } => {
                self.papertrail
                    .find::<System, _>(|s| {
                        s.hostname.as_deref() == Some(hostname.as_str())
                            && s.syslog_port() == Some(*port)
                    })
                    .await?
            }
            SystemKey::HostnameDestination {
                hostname,
                destination_id,
            } => {
                let destination = self.destination(*destination_id).await?;
                self.papertrail
                    .find::<System, _>(|s| {
                        s.hostname.as_deref() == Some(hostname.as_str())
                            && s.syslog.as_ref().is_some_and(|syslog| {
                                syslog.hostname == destination.syslog.hostname
                                    && syslog.port == destination.syslog.port
                            })
                    })
                    .await?
            }
            SystemKey::Hostname { hostname } => {
                self.papertrail
                    .find::<System, _>(|s| s.hostname.as_deref() == Some(hostname.as_str()))
                    .await?
            }
            SystemKey::IpAddress { address, .. } => {
                self.papertrail
                    .find::<System, _>(|s| s.ip_address.as_deref() == Some(address.as_str()))
                    .await?
            }
        };
        debug!(system = key.name(), found = found.is_some(), "System lookup");
        Ok(found)
    }

    /// Apply `action` to the system behind `key`.
    ///
    /// Returns `None` when nothing was done: obtain is a no-op for systems,
    /// and deleting a system that does not exist is not an error.
    pub async fn reconcile(&self, key: &SystemKey, action: Action) -> Result<Option<Item>> {
        match action {
            Action::Obtain => Ok(None),
            Action::Create => {
                if let Some(system) = self.lookup(key).await? {
                    info!(system = %system.name, id = system.id, "System already exists");
                    return Ok(Some(Item::existing(ItemKind::System, system.id, system.name)));
                }
                let Some(request) = key.creation_request() else {
                    return Err(ValidationError::MissingDestination.into());
                };
                let system = self.papertrail.create_system(&request).await?;
                info!(system = %system.name, id = system.id, "System created");
                Ok(Some(Item::created(ItemKind::System, system.id, system.name)))
            }
            Action::Delete => {
                let Some(system) = self.lookup(key).await? else {
                    info!(system = key.name(), "System does not exist, nothing to delete");
                    return Ok(None);
                };
                self.papertrail.delete::<System>(system.id).await?;
                info!(system = %system.name, id = system.id, "System deleted");
                Ok(Some(Item::deleted(ItemKind::System, system.id, system.name)))
            }
        }
    }

    async fn destination(&self, id: i64) -> Result<Destination> {
        match self.papertrail.destination(id).await {
            Ok(destination) => {
                debug!(destination_id = id, "Destination exists");
                Ok(destination)
            }
            Err(ClientError::NotFound { .. }) => Err(SyncError::DestinationNotFound { id }),
            Err(e) => Err(e.into()),
        }
    }
}
