//! ARP-based host discovery.
//!
//! One broadcast ARP request goes out per address in the target range, then
//! replies are collected off the wire until the scan window closes. The
//! datalink channel I/O is blocking, so the whole scan runs on tokio's
//! blocking thread pool.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use ipnet::Ipv4Net;
use pnet::datalink::{self, Channel, NetworkInterface};
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::Packet;
use pnet::util::MacAddr;

use netvigil_core::{DiscoveryProbe, HostAddr, Network, ProbeError};

const ETH_PACK_LEN: usize = 42;
const ARP_PACK_LEN: usize = 28;
const MAC_ADDR_LEN: u8 = 6;
const IP_V4_LEN: u8 = 4;

/// Upper bound on a single channel read, so the deadline is rechecked even
/// on a silent wire.
const READ_POLL: Duration = Duration::from_millis(100);

/// Discovers live hosts by ARP-scanning through one network interface.
///
/// The interface, its MAC and its IPv4 address are resolved once at
/// construction; an interface that cannot be resolved can never scan, so
/// that failure surfaces immediately rather than on every tick.
pub struct ArpProbe {
    interface: NetworkInterface,
    source_mac: MacAddr,
    source_ip: Ipv4Addr,
}

impl ArpProbe {
    pub fn new(interface_name: &str) -> Result<Self, ProbeError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| ProbeError::InterfaceNotFound {
                name: interface_name.to_string(),
            })?;

        let source_mac = interface.mac.ok_or_else(|| ProbeError::InterfaceUnusable {
            name: interface_name.to_string(),
            what: "MAC address",
        })?;

        let source_ip = interface
            .ips
            .iter()
            .find_map(|net| match net.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| ProbeError::InterfaceUnusable {
                name: interface_name.to_string(),
                what: "IPv4 address",
            })?;

        Ok(Self {
            interface,
            source_mac,
            source_ip,
        })
    }
}

#[async_trait]
impl DiscoveryProbe for ArpProbe {
    async fn scan(
        &self,
        network: &Network,
        timeout: Duration,
    ) -> Result<HashSet<HostAddr>, ProbeError> {
        let interface = self.interface.clone();
        let source_mac = self.source_mac;
        let source_ip = self.source_ip;
        let cidr = network.cidr;

        tokio::task::spawn_blocking(move || {
            scan_blocking(&interface, source_mac, source_ip, cidr, timeout)
        })
        .await
        .map_err(|err| ProbeError::Io(std::io::Error::other(err)))?
    }
}

fn scan_blocking(
    interface: &NetworkInterface,
    source_mac: MacAddr,
    source_ip: Ipv4Addr,
    cidr: Ipv4Net,
    timeout: Duration,
) -> Result<HashSet<HostAddr>, ProbeError> {
    let config = datalink::Config {
        read_timeout: Some(READ_POLL),
        ..datalink::Config::default()
    };

    let (mut tx, mut rx) = match datalink::channel(interface, config) {
        Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
        Ok(_) => return Err(ProbeError::UnsupportedChannel),
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            return Err(ProbeError::PermissionDenied(err.to_string()))
        }
        Err(err) => return Err(ProbeError::Io(err)),
    };

    let mut eth_buf = [0u8; ETH_PACK_LEN];
    for target in cidr.hosts() {
        fill_request_buf(&mut eth_buf, source_mac, source_ip, target);
        if let Some(Err(err)) = tx.send_to(&eth_buf, None) {
            return Err(ProbeError::Io(err));
        }
    }

    let mut responding = HashSet::new();
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match rx.next() {
            Ok(frame) => {
                if let Some(sender) = parse_reply(frame, &cidr) {
                    responding.insert(HostAddr::from(sender));
                }
            }
            // Read-timeout expiry; platform-dependent error kind.
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            Err(err) => return Err(ProbeError::Io(err)),
        }
    }

    Ok(responding)
}

/// Writes a broadcast Ethernet frame carrying an ARP who-has for `target`.
fn fill_request_buf(eth_buf: &mut [u8], source_mac: MacAddr, source_ip: Ipv4Addr, target: Ipv4Addr) {
    let mut arp_buf = [0u8; ARP_PACK_LEN];
    let mut arp_packet = MutableArpPacket::new(&mut arp_buf).expect("ARP buffer sized to packet");
    arp_packet.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp_packet.set_protocol_type(EtherTypes::Ipv4);
    arp_packet.set_hw_addr_len(MAC_ADDR_LEN);
    arp_packet.set_proto_addr_len(IP_V4_LEN);
    arp_packet.set_operation(ArpOperations::Request);
    arp_packet.set_sender_hw_addr(source_mac);
    arp_packet.set_sender_proto_addr(source_ip);
    arp_packet.set_target_hw_addr(MacAddr::zero());
    arp_packet.set_target_proto_addr(target);

    let mut eth_packet =
        MutableEthernetPacket::new(eth_buf).expect("Ethernet buffer sized to packet");
    eth_packet.set_destination(MacAddr::broadcast());
    eth_packet.set_source(source_mac);
    eth_packet.set_ethertype(EtherTypes::Arp);
    eth_packet.set_payload(arp_packet.packet());
}

/// Extracts the sender address from an in-range ARP reply; anything else on
/// the wire is ignored.
fn parse_reply(frame: &[u8], cidr: &Ipv4Net) -> Option<Ipv4Addr> {
    let eth = EthernetPacket::new(frame)?;
    if eth.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(eth.payload())?;
    if arp.get_operation() != ArpOperations::Reply {
        return None;
    }
    let sender = arp.get_sender_proto_addr();
    cidr.contains(&sender).then_some(sender)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cidr() -> Ipv4Net {
        "192.168.0.0/24".parse().unwrap()
    }

    #[test]
    fn request_buf_round_trips() {
        let source_mac = MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e);
        let source_ip = Ipv4Addr::new(192, 168, 0, 2);
        let target = Ipv4Addr::new(192, 168, 0, 77);

        let mut eth_buf = [0u8; ETH_PACK_LEN];
        fill_request_buf(&mut eth_buf, source_mac, source_ip, target);

        let eth = EthernetPacket::new(&eth_buf).unwrap();
        assert_eq!(eth.get_destination(), MacAddr::broadcast());
        assert_eq!(eth.get_source(), source_mac);
        assert_eq!(eth.get_ethertype(), EtherTypes::Arp);

        let arp = ArpPacket::new(eth.payload()).unwrap();
        assert_eq!(arp.get_operation(), ArpOperations::Request);
        assert_eq!(arp.get_sender_proto_addr(), source_ip);
        assert_eq!(arp.get_target_proto_addr(), target);
        assert_eq!(arp.get_target_hw_addr(), MacAddr::zero());
    }

    #[test]
    fn reply_parsing_accepts_in_range_replies_only() {
        let reply = reply_frame(Ipv4Addr::new(192, 168, 0, 5));
        assert_eq!(
            parse_reply(&reply, &test_cidr()),
            Some(Ipv4Addr::new(192, 168, 0, 5))
        );

        let out_of_range = reply_frame(Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(parse_reply(&out_of_range, &test_cidr()), None);
    }

    #[test]
    fn reply_parsing_ignores_requests() {
        let mut eth_buf = [0u8; ETH_PACK_LEN];
        fill_request_buf(
            &mut eth_buf,
            MacAddr::broadcast(),
            Ipv4Addr::new(192, 168, 0, 2),
            Ipv4Addr::new(192, 168, 0, 5),
        );
        assert_eq!(parse_reply(&eth_buf, &test_cidr()), None);
    }

    #[test]
    fn unknown_interface_is_rejected() {
        assert!(matches!(
            ArpProbe::new("netvigil-missing0"),
            Err(ProbeError::InterfaceNotFound { .. })
        ));
    }

    fn reply_frame(sender: Ipv4Addr) -> [u8; ETH_PACK_LEN] {
        let sender_mac = MacAddr::new(0xde, 0xad, 0xbe, 0xef, 0x00, 0x01);
        let our_mac = MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e);

        let mut arp_buf = [0u8; ARP_PACK_LEN];
        let mut arp = MutableArpPacket::new(&mut arp_buf).unwrap();
        arp.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp.set_protocol_type(EtherTypes::Ipv4);
        arp.set_hw_addr_len(MAC_ADDR_LEN);
        arp.set_proto_addr_len(IP_V4_LEN);
        arp.set_operation(ArpOperations::Reply);
        arp.set_sender_hw_addr(sender_mac);
        arp.set_sender_proto_addr(sender);
        arp.set_target_hw_addr(our_mac);
        arp.set_target_proto_addr(Ipv4Addr::new(192, 168, 0, 2));

        let mut eth_buf = [0u8; ETH_PACK_LEN];
        let mut eth = MutableEthernetPacket::new(&mut eth_buf).unwrap();
        eth.set_destination(our_mac);
        eth.set_source(sender_mac);
        eth.set_ethertype(EtherTypes::Arp);
        eth.set_payload(arp.packet());

        eth_buf
    }
}
