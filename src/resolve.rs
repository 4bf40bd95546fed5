use std::net::IpAddr;
use std::time::Duration;

use hickory_resolver::Resolver;
use pnet::datalink::{self, NetworkInterface};

use crate::error::{Error, Result};
use crate::probe::SourceInterface;

/// Target host as shown in the banner, together with the address probed.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ResolvedHost {
    pub name: String,
    pub address: IpAddr,
}

async fn lookup(host: &str) -> Option<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip);
    }
    match tokio::net::lookup_host((host, 0)).await {
        Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
        Err(err) => {
            log::debug!("lookup of {} failed: {}", host, err);
            None
        }
    }
}

/// Upper bound on the reverse lookup for the banner name.
pub const REVERSE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Resolves `host` (a name or a literal address) to the first address found.
///
/// The name is the canonical name of that address when a reverse lookup
/// answers in time, otherwise `host` as given.
pub async fn resolve_host(host: &str) -> Result<ResolvedHost> {
    let address = lookup(host)
        .await
        .ok_or_else(|| Error::UnknownHost(host.to_string()))?;
    let name = match tokio::time::timeout(REVERSE_LOOKUP_TIMEOUT, canonical_name(address)).await {
        Ok(name) => name,
        Err(_) => {
            log::debug!("reverse lookup of {} timed out", address);
            None
        }
    };
    Ok(ResolvedHost {
        name: display_name(name, host),
        address,
    })
}

async fn canonical_name(address: IpAddr) -> Option<String> {
    let resolver = match Resolver::builder_tokio() {
        Ok(builder) => builder.build(),
        Err(err) => {
            log::debug!("no system resolver configuration: {}", err);
            return None;
        }
    };
    match resolver.reverse_lookup(address).await {
        Ok(names) => names.iter().next().map(|name| name.to_string()),
        Err(err) => {
            log::debug!("reverse lookup of {} failed: {}", address, err);
            None
        }
    }
}

fn display_name(canonical: Option<String>, typed: &str) -> String {
    canonical
        .map(|name| name.trim_end_matches('.').to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| typed.to_string())
}

/// Finds the local interface owning `address` (a name or a literal address).
pub async fn resolve_source_interface(address: &str) -> Result<SourceInterface> {
    let ip = lookup(address)
        .await
        .ok_or_else(|| Error::UnknownInterface(address.to_string()))?;
    interface_with_address(datalink::interfaces(), ip)
        .ok_or_else(|| Error::UnknownInterface(address.to_string()))
}

fn interface_with_address(
    interfaces: impl IntoIterator<Item = NetworkInterface>,
    ip: IpAddr,
) -> Option<SourceInterface> {
    interfaces
        .into_iter()
        .find(|iface| iface.ips.iter().any(|net| net.ip() == ip))
        .map(|iface| SourceInterface::new(iface.name, ip))
}
