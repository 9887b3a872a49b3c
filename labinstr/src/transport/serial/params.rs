use core::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum StopBits {
    One,
    Two,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum DataBits {
    Seven,
    Eight,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum FlowControl {
    NoFlowControl,
    Hardware,
    Software,
}

impl Default for FlowControl {
    fn default() -> Self {
        FlowControl::NoFlowControl
    }
}

pub fn parse_serial_settings(settings: &str) -> crate::Result<(DataBits, Parity, StopBits)> {
    let invalid = || Error::invalid_address(format!("invalid serial settings `{}`", settings));
    let lower = settings.to_lowercase();
    let chars = lower.as_bytes();
    if chars.len() != 3 {
        return Err(invalid());
    }
    let data_bits = match chars[0] as char {
        '8' => DataBits::Eight,
        '7' => DataBits::Seven,
        _ => return Err(invalid()),
    };
    let parity = match chars[1] as char {
        'n' => Parity::None,
        'o' => Parity::Odd,
        'e' => Parity::Even,
        _ => return Err(invalid()),
    };
    let stop_bits = match chars[2] as char {
        '1' => StopBits::One,
        '2' => StopBits::Two,
        _ => return Err(invalid()),
    };
    Ok((data_bits, parity, stop_bits))
}

pub fn parse_flow_control(flow_control: &str) -> crate::Result<FlowControl> {
    match flow_control.to_lowercase().as_str() {
        "none" => Ok(FlowControl::NoFlowControl),
        "hw" => Ok(FlowControl::Hardware),
        "sw" => Ok(FlowControl::Software),
        _ => Err(Error::invalid_address(format!(
            "invalid flow control `{}`",
            flow_control
        ))),
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize, Hash)]
pub struct SerialParams {
    pub baud: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl SerialParams {
    /// Parses the `<baud>::<settings>[::<flow control>]` part of a serial address,
    /// e.g. `["9600", "8N1"]` or `["9600", "8N2", "hw"]`.
    pub fn from_address(splits: &[&str]) -> crate::Result<Self> {
        if splits.len() < 2 || splits.len() > 3 {
            return Err(Error::invalid_address(splits.join("::")));
        }
        let baud: u32 = splits[0]
            .parse()
            .map_err(|_| Error::invalid_address(format!("invalid baud rate `{}`", splits[0])))?;
        let (data_bits, parity, stop_bits) = parse_serial_settings(splits[1])?;
        let flow_control = match splits.get(2) {
            Some(x) => parse_flow_control(x)?,
            None => FlowControl::NoFlowControl,
        };
        Ok(SerialParams {
            baud,
            data_bits,
            stop_bits,
            parity,
            flow_control,
        })
    }
}

impl Default for SerialParams {
    fn default() -> Self {
        SerialParams {
            baud: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::NoFlowControl,
        }
    }
}

impl Display for SerialParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}{}{}",
            self.baud, self.data_bits, self.parity, self.stop_bits
        )?;
        match self.flow_control {
            FlowControl::NoFlowControl => Ok(()),
            FlowControl::Hardware => f.write_str("::hw"),
            FlowControl::Software => f.write_str("::sw"),
        }
    }
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(x: StopBits) -> Self {
        match x {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

impl From<Parity> for tokio_serial::Parity {
    fn from(x: Parity) -> Self {
        match x {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(x: DataBits) -> Self {
        match x {
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(x: FlowControl) -> Self {
        match x {
            FlowControl::NoFlowControl => tokio_serial::FlowControl::None,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
            FlowControl::Software => tokio_serial::FlowControl::Software,
        }
    }
}

impl Display for DataBits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let x = match self {
            DataBits::Seven => "7",
            DataBits::Eight => "8",
        };
        f.write_str(x)
    }
}

impl Display for Parity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let x = match self {
            Parity::None => "N",
            Parity::Odd => "O",
            Parity::Even => "E",
        };
        f.write_str(x)
    }
}

impl Display for StopBits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let x = match self {
            StopBits::One => "1",
            StopBits::Two => "2",
        };
        f.write_str(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings() {
        assert_eq!(
            parse_serial_settings("8N1").unwrap(),
            (DataBits::Eight, Parity::None, StopBits::One)
        );
        assert_eq!(
            parse_serial_settings("7e2").unwrap(),
            (DataBits::Seven, Parity::Even, StopBits::Two)
        );
        assert!(parse_serial_settings("8N").is_err());
        assert!(parse_serial_settings("9N1").is_err());
        assert!(parse_serial_settings("8X1").is_err());
    }

    #[test]
    fn from_address() {
        let params = SerialParams::from_address(&["9600", "8N2", "hw"]).unwrap();
        assert_eq!(params.baud, 9600);
        assert_eq!(params.stop_bits, StopBits::Two);
        assert_eq!(params.flow_control, FlowControl::Hardware);
        assert_eq!(params.to_string(), "9600::8N2::hw");

        let params = SerialParams::from_address(&["115200", "8N1"]).unwrap();
        assert_eq!(params.to_string(), "115200::8N1");

        assert!(SerialParams::from_address(&["fast", "8N1"]).is_err());
        assert!(SerialParams::from_address(&["9600"]).is_err());
        assert!(SerialParams::from_address(&["9600", "8N1", "rts"]).is_err());
    }
}
