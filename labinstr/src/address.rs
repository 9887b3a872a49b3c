use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::transport::serial::SerialParams;
use crate::Error;

/// Where an instrument is attached. Parsed from strings such as:
///
///  * `tcp::192.168.0.10:5025` or the VISA form `TCPIP0::192.168.0.10::5025::SOCKET`
///  * `serial::/dev/ttyUSB0::9600::8N2[::hw]` or the VISA form `ASRL/dev/ttyUSB0::INSTR`
///  * `prologix::/dev/ttyUSB0::22` for GPIB address 22 behind a Prologix controller
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    Tcp { host: String, port: u16 },
    Serial { path: String, params: SerialParams },
    Prologix { path: String, gpib_addr: u8 },
}

impl Address {
    pub fn parse(addr: &str) -> crate::Result<Self> {
        let splits: Vec<_> = addr.split("::").map(|x| x.trim()).collect();
        if splits.len() < 2 {
            return Err(Error::invalid_address(addr));
        }
        let kind = splits[0].to_lowercase();

        if kind == "tcp" {
            // tcp::192.168.0.1:5025
            if splits.len() != 2 {
                return Err(Error::invalid_address(addr));
            }
            let (host, port) = parse_host_port(splits[1]).ok_or_else(|| Error::invalid_address(addr))?;
            Ok(Address::Tcp { host, port })
        } else if kind == "serial" {
            // serial::/dev/ttyUSB0::9600::8N1
            if splits.len() < 4 {
                return Err(Error::invalid_address(addr));
            }
            let params = SerialParams::from_address(&splits[2..])?;
            Ok(Address::Serial {
                path: splits[1].to_string(),
                params,
            })
        } else if kind == "prologix" {
            // prologix::/dev/ttyUSB0::12
            if splits.len() != 3 {
                return Err(Error::invalid_address(addr));
            }
            let gpib_addr: u8 = splits[2].parse().map_err(|_| Error::invalid_address(addr))?;
            if gpib_addr > 30 {
                return Err(Error::invalid_address(addr));
            }
            Ok(Address::Prologix {
                path: splits[1].to_string(),
                gpib_addr,
            })
        } else if kind.starts_with("tcpip") {
            // TCPIP0::192.168.0.1::5025::SOCKET
            let resource_class = splits[splits.len() - 1].to_lowercase();
            if resource_class == "instr" {
                // VXI-11 or HiSLIP
                return Err(Error::NotSupported);
            }
            if splits.len() != 4 || resource_class != "socket" {
                return Err(Error::invalid_address(addr));
            }
            let port: u16 = splits[2].parse().map_err(|_| Error::invalid_address(addr))?;
            Ok(Address::Tcp {
                host: splits[1].to_string(),
                port,
            })
        } else if kind.starts_with("asrl") {
            // ASRL/dev/ttyUSB0::INSTR or ASRL3::INSTR
            if splits.len() != 2 || splits[1].to_lowercase() != "instr" {
                return Err(Error::invalid_address(addr));
            }
            let port = &splits[0][4..];
            if port.is_empty() {
                return Err(Error::invalid_address(addr));
            }
            let path = if port.chars().all(|x| x.is_ascii_digit()) {
                format!("COM{}", port)
            } else {
                port.to_string()
            };
            Ok(Address::Serial {
                path,
                params: SerialParams::default(),
            })
        } else if kind.starts_with("gpib") || kind.starts_with("usb") || kind.starts_with("vxi") {
            // requires a vendor VISA library
            Err(Error::NotSupported)
        } else {
            Err(Error::invalid_address(addr))
        }
    }
}

fn parse_host_port(x: &str) -> Option<(String, u16)> {
    let idx = x.rfind(':')?;
    let host = &x[..idx];
    if host.is_empty() {
        return None;
    }
    let port = x[idx + 1..].parse().ok()?;
    Some((host.to_string(), port))
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp { host, port } => write!(f, "tcp::{}:{}", host, port),
            Address::Serial { path, params } => write!(f, "serial::{}::{}", path, params),
            Address::Prologix { path, gpib_addr } => write!(f, "prologix::{}::{}", path, gpib_addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::serial::params::{DataBits, FlowControl, Parity, StopBits};

    #[test]
    fn parse_tcp() {
        let addr = Address::parse("tcp::192.168.1.1:5025").unwrap();
        assert_eq!(
            addr,
            Address::Tcp {
                host: "192.168.1.1".to_string(),
                port: 5025
            }
        );
        let addr = Address::parse("TCP::dmm.lab:5025").unwrap();
        assert_eq!(
            addr,
            Address::Tcp {
                host: "dmm.lab".to_string(),
                port: 5025
            }
        );
        assert!(Address::parse("tcp::192.168.1.1").is_err());
        assert!(Address::parse("tcp:::5025").is_err());
    }

    #[test]
    fn parse_visa_socket() {
        let addr = Address::parse("TCPIP0::192.168.1.1::5025::SOCKET").unwrap();
        assert_eq!(addr.to_string(), "tcp::192.168.1.1:5025");
        assert!(matches!(
            Address::parse("TCPIP0::192.168.1.1::inst0::INSTR"),
            Err(Error::NotSupported)
        ));
        assert!(matches!(
            Address::parse("TCPIP::192.168.1.1::INSTR"),
            Err(Error::NotSupported)
        ));
        assert!(matches!(
            Address::parse("TCPIP0::192.168.1.1::SOCKET"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            Address::parse("TCPIP0::192.168.1.1::5025::RAW"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn parse_serial() {
        let addr = Address::parse("serial::COM1::9600::8N2").unwrap();
        match addr {
            Address::Serial { path, params } => {
                assert_eq!(path, "COM1");
                assert_eq!(
                    params,
                    SerialParams {
                        baud: 9600,
                        data_bits: DataBits::Eight,
                        stop_bits: StopBits::Two,
                        parity: Parity::None,
                        flow_control: FlowControl::NoFlowControl,
                    }
                );
            }
            _ => panic!(),
        }
        assert!(Address::parse("serial::COM1::9600").is_err());
    }

    #[test]
    fn parse_visa_serial() {
        let addr = Address::parse("ASRL/dev/ttyUSB0::INSTR").unwrap();
        assert_eq!(addr.to_string(), "serial::/dev/ttyUSB0::9600::8N1");
        let addr = Address::parse("ASRL3::INSTR").unwrap();
        match addr {
            Address::Serial { path, .. } => assert_eq!(path, "COM3"),
            _ => panic!(),
        }
        assert!(Address::parse("ASRL::INSTR").is_err());
    }

    #[test]
    fn parse_prologix() {
        let addr = Address::parse("prologix::/dev/ttyUSB0::10").unwrap();
        match addr {
            Address::Prologix { path, gpib_addr } => {
                assert_eq!(gpib_addr, 10);
                assert_eq!(path, "/dev/ttyUSB0");
            }
            _ => panic!(),
        }
        assert!(Address::parse("prologix::/dev/ttyUSB0::31").is_err());
        assert!(Address::parse("prologix::/dev/ttyUSB0").is_err());
    }

    #[test]
    fn unsupported() {
        assert!(matches!(
            Address::parse("GPIB0::22::INSTR"),
            Err(Error::NotSupported)
        ));
        assert!(matches!(
            Address::parse("VXI0::1::INSTR"),
            Err(Error::NotSupported)
        ));
        assert!(matches!(
            Address::parse("USB0::0x0957::0x0607::MY12345678::INSTR"),
            Err(Error::NotSupported)
        ));
        assert!(matches!(
            Address::parse("foo::bar"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(Address::parse("nothing").is_err());
    }

    #[test]
    fn display_round_trip() {
        for addr in &[
            "tcp::10.0.0.2:5025",
            "serial::/dev/ttyS0::19200::7E1::sw",
            "prologix::COM4::5",
        ] {
            let parsed = Address::parse(addr).unwrap();
            assert_eq!(&parsed.to_string(), addr);
            assert_eq!(Address::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }
}
