use std::net::{IpAddr, Ipv4Addr, SocketAddrV4, SocketAddrV6};

use tracing::info;

use crate::adapters::{RegisterError, RegistrationRequest, ShipyardClient};

/// Addresses never advertised to Shipyard
const BLOCKED_IPS: [IpAddr; 2] = [
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
    IpAddr::V4(Ipv4Addr::new(172, 17, 42, 1)),
];

/// Pick the address Shipyard should use to reach this host.
///
/// An explicit override always wins. Otherwise the first address that is
/// routable from outside the host is chosen.
pub fn select_host_ip(addrs: &[IpAddr], override_ip: Option<IpAddr>) -> Option<IpAddr> {
    if override_ip.is_some() {
        return override_ip;
    }

    addrs.iter().copied().find(|ip| {
        !ip.is_loopback() && !ip.is_unspecified() && !BLOCKED_IPS.contains(ip) && !is_link_local(ip)
    })
}

fn is_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

/// Addresses of every local network interface, in kernel order
pub fn interface_addresses() -> Result<Vec<IpAddr>, RegisterError> {
    let addrs = nix::ifaddrs::getifaddrs().map_err(RegisterError::Interfaces)?;

    Ok(addrs
        .filter_map(|ifaddr| ifaddr.address)
        .filter_map(|addr| {
            if let Some(sin) = addr.as_sockaddr_in() {
                Some(IpAddr::V4(*SocketAddrV4::from(*sin).ip()))
            } else {
                addr.as_sockaddr_in6()
                    .map(|sin6| IpAddr::V6(*SocketAddrV6::from(*sin6).ip()))
            }
        })
        .collect())
}

pub fn hostname() -> Result<String, RegisterError> {
    let name = nix::unistd::gethostname().map_err(RegisterError::Hostname)?;
    Ok(name.to_string_lossy().into_owned())
}

/// Register this host with Shipyard and return the issued agent key
pub async fn register_agent(
    client: &ShipyardClient,
    port: u16,
    override_ip: Option<IpAddr>,
) -> Result<String, RegisterError> {
    let name = hostname()?;
    let addrs = interface_addresses()?;
    register_with(client, name, port, &addrs, override_ip).await
}

pub async fn register_with(
    client: &ShipyardClient,
    name: String,
    port: u16,
    addrs: &[IpAddr],
    override_ip: Option<IpAddr>,
) -> Result<String, RegisterError> {
    let host_ip = select_host_ip(addrs, override_ip).ok_or(RegisterError::NoHostIp)?;

    info!(host_ip = %host_ip, "Using {} for the Docker host IP for Shipyard", host_ip);
    info!("If this is not correct or you want to use a different IP, please update the host in Shipyard");
    info!(url = client.base_url(), "Registering with Shipyard");

    let key = client
        .register(&RegistrationRequest {
            name,
            port: port.to_string(),
            hostname: host_ip.to_string(),
        })
        .await?;

    info!("Agent registered");
    Ok(key)
}
