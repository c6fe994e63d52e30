//! IPv4 address lookup for a named network interface

use std::net::Ipv4Addr;

use crate::core::{Error, Result};

#[cfg(target_os = "linux")]
nix::ioctl_read_bad!(siocgifaddr, libc::SIOCGIFADDR, libc::ifreq);

/// Returns the IPv4 address assigned to `name` (e.g. "eth0")
pub fn interface_addr(name: &str) -> Result<Ipv4Addr> {
    let ifr_name = to_ifr_name(name)?;
    let addr = lookup(name, ifr_name)?;
    tracing::debug!("Interface {} has address {}", name, addr);
    Ok(addr)
}

/// Converts an interface name to the NUL-padded form the kernel expects
fn to_ifr_name(name: &str) -> Result<[libc::c_char; libc::IFNAMSIZ]> {
    if name.is_empty() {
        return Err(Error::resolution("interface name is empty"));
    }
    // One byte is reserved for the terminating NUL
    if name.len() >= libc::IFNAMSIZ {
        return Err(Error::resolution(format!(
            "interface name {:?} is longer than {} bytes",
            name,
            libc::IFNAMSIZ - 1
        )));
    }
    if name.bytes().any(|b| b == 0) {
        return Err(Error::resolution("interface name contains a NUL byte"));
    }

    let mut out = [0 as libc::c_char; libc::IFNAMSIZ];
    for (dst, src) in out.iter_mut().zip(name.bytes()) {
        *dst = src as libc::c_char;
    }
    Ok(out)
}

#[cfg(target_os = "linux")]
fn lookup(name: &str, ifr_name: [libc::c_char; libc::IFNAMSIZ]) -> Result<Ipv4Addr> {
    use socket2::{Domain, Protocol, Socket, Type};
    use std::os::unix::io::AsRawFd;

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| Error::socket(format!("Failed to open control socket: {}", e)))?;

    // SAFETY: ifreq is plain old data, all-zero is a valid value, and the
    // kernel only writes within the struct passed to SIOCGIFADDR.
    let addr = unsafe {
        let mut request: libc::ifreq = std::mem::zeroed();
        request.ifr_name = ifr_name;
        request.ifr_ifru.ifru_addr.sa_family = libc::AF_INET as libc::sa_family_t;

        siocgifaddr(socket.as_raw_fd(), &mut request).map_err(|errno| {
            Error::resolution(format!("No IPv4 address for interface {}: {}", name, errno))
        })?;

        request.ifr_ifru.ifru_addr
    };

    if addr.sa_family != libc::AF_INET as libc::sa_family_t {
        return Err(Error::resolution(format!(
            "Interface {} returned a non-IPv4 address",
            name
        )));
    }

    // sockaddr_in layout: 2 bytes port, then the address in network order
    let data = addr.sa_data;
    Ok(Ipv4Addr::new(data[2] as u8, data[3] as u8, data[4] as u8, data[5] as u8))
}

#[cfg(not(target_os = "linux"))]
fn lookup(name: &str, _ifr_name: [libc::c_char; libc::IFNAMSIZ]) -> Result<Ipv4Addr> {
    Err(Error::resolution(format!(
        "Cannot look up interface {}: only supported on Linux",
        name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifr_name_padding() {
        let name = to_ifr_name("eth0").unwrap();
        assert_eq!(name[..4], [b'e' as libc::c_char, b't' as libc::c_char, b'h' as libc::c_char, b'0' as libc::c_char]);
        assert!(name[4..].iter().all(|c| *c == 0));
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(interface_addr(""), Err(Error::Resolution(_))));
        assert!(matches!(interface_addr("a-very-long-interface-name"), Err(Error::Resolution(_))));
        assert!(matches!(interface_addr("eth\00"), Err(Error::Resolution(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_loopback_address() {
        assert_eq!(interface_addr("lo").unwrap(), Ipv4Addr::LOCALHOST);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_unknown_interface() {
        let result = interface_addr("nosuchif0");
        assert!(matches!(result, Err(Error::Resolution(_))));
    }
}
