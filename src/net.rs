use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// This machine's address on the local network, or loopback when there is no route.
///
/// Connecting a UDP socket sends nothing; it only makes the OS pick the
/// outgoing interface, whose address is then read back.
pub fn local_ip() -> IpAddr {
    probe().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn probe() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect((Ipv4Addr::new(10, 254, 254, 254), 1))?;
    let ip = socket.local_addr()?.ip();
    if ip.is_unspecified() {
        return Err(std::io::Error::other("no outgoing interface"));
    }
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_unspecified() {
        assert!(!local_ip().is_unspecified());
    }
}
