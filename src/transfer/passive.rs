//! Passive-mode endpoint negotiation

use log::debug;
use regex::Regex;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::LazyLock;

use crate::commands::FtpCommand;
use crate::connection::ControlChannel;
use crate::error::{RaxFtpClientError, Result};

/// `h1,h2,h3,h4,p1,p2` inside `(...)`, or `<...>` as some servers write it
static PASV_TUPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[(<]\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*[)>]")
        .expect("PASV tuple pattern is valid")
});

/// Address/port pair the server will accept one data connection on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassiveEndpoint {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl PassiveEndpoint {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self { address, port }
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.address, self.port)
    }
}

impl fmt::Display for PassiveEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Send PASV and resolve the endpoint from the reply
pub fn negotiate_passive(control: &mut ControlChannel) -> Result<PassiveEndpoint> {
    control.send(&FtpCommand::Pasv)?;
    let response = control.receive_response(true)?;

    if !response.is_success() {
        return Err(RaxFtpClientError::UnexpectedReply {
            expected: "227 passive mode".to_string(),
            code: response.code,
            message: response.message().to_string(),
        });
    }

    let endpoint = parse_pasv_reply(&response.text())?;
    debug!("Server offered passive endpoint {}", endpoint);
    Ok(endpoint)
}

/// Extract the six-field host/port tuple from a PASV reply
pub fn parse_pasv_reply(reply: &str) -> Result<PassiveEndpoint> {
    let captures = PASV_TUPLE.captures(reply).ok_or_else(|| {
        RaxFtpClientError::Protocol(format!(
            "No address tuple in PASV reply: {}",
            reply.trim_end()
        ))
    })?;

    let mut fields = [0u8; 6];
    for (index, field) in fields.iter_mut().enumerate() {
        let raw = &captures[index + 1];
        *field = raw.parse::<u8>().map_err(|_| {
            RaxFtpClientError::Protocol(format!("PASV field {} out of range: {}", index + 1, raw))
        })?;
    }

    let [o1, o2, o3, o4, port_hi, port_lo] = fields;
    let port = u16::from(port_hi) * 256 + u16::from(port_lo);
    if port == 0 {
        return Err(RaxFtpClientError::Protocol(
            "PASV reply advertised port 0".to_string(),
        ));
    }

    Ok(PassiveEndpoint::new(Ipv4Addr::new(o1, o2, o3, o4), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_reply() {
        let endpoint =
            parse_pasv_reply("227 Entering Passive Mode (192,168,1,10,200,50).").unwrap();
        assert_eq!(endpoint.address, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(endpoint.port, 51250);
        assert_eq!(endpoint.to_string(), "192.168.1.10:51250");
    }

    #[test]
    fn test_parse_angle_brackets_and_spaces() {
        let endpoint = parse_pasv_reply("227 Passive <10, 0, 0, 7, 4, 1>").unwrap();
        assert_eq!(endpoint.socket_addr().to_string(), "10.0.0.7:1025");
    }

    #[test]
    fn test_missing_tuple_is_protocol_error() {
        let err = parse_pasv_reply("227 Entering Passive Mode").unwrap_err();
        assert!(matches!(err, RaxFtpClientError::Protocol(_)));

        let err = parse_pasv_reply("227 Entering Passive Mode (127,0,0,1,200)").unwrap_err();
        assert!(matches!(err, RaxFtpClientError::Protocol(_)));
    }

    #[test]
    fn test_out_of_range_field_is_protocol_error() {
        let err = parse_pasv_reply("227 (300,0,0,1,4,1)").unwrap_err();
        assert!(matches!(err, RaxFtpClientError::Protocol(_)));

        let err = parse_pasv_reply("227 (127,0,0,1,0,0)").unwrap_err();
        assert!(matches!(err, RaxFtpClientError::Protocol(_)));
    }
}
