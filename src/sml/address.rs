use std::io;
use std::io::Write;
use std::net::Ipv4Addr;

use crate::consensus::{Decodable, Encodable, encode};

/// The network endpoint a masternode serves on.
///
/// On the wire this is a 16-byte IPv4-mapped address followed by the port in
/// big-endian order.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash)]
pub struct ServiceAddress {
    /// The node's IPv4 address.
    pub ip: Ipv4Addr,
    /// The node's port.
    pub port: u16,
}

impl Encodable for ServiceAddress {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        // IPv4 lives in the last 4 bytes of the 16-byte field.
        let mut ip_address = [0u8; 16];
        ip_address[12..16].copy_from_slice(&self.ip.octets());

        let mut len = 0;
        len += ip_address.consensus_encode(writer)?;
        // The port is carried big-endian, unlike every other integer.
        len += self.port.swap_bytes().consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for ServiceAddress {
    fn consensus_decode<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let ip_address: [u8; 16] = Decodable::consensus_decode(reader)?;
        let port: u16 = Decodable::consensus_decode(reader)?;
        let port = port.swap_bytes();
        let ipv4_octets: [u8; 4] = ip_address[12..16].try_into().map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid IPv4 address")
        })?;
        Ok(ServiceAddress { ip: Ipv4Addr::from(ipv4_octets), port })
    }
}
