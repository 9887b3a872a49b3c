//! Agilent E3640A .. E3649A series of programmable DC power supplies.
//!
//! Limits follow the E3640A/E3642A high range (20 V, 3 A). Output levels are programmed with
//! `VOLTage`/`CURRent` or both at once with `APPLy`.
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use labinstr_protocol::scpi::{parse_number, unquote};
use labinstr_protocol::{InstrumentError, MalformedParameter, ScpiError};

use crate::devices::{check_range, format_number, parse_choice, BEEP};
use crate::instrument::{Instrument, Scpi};
use crate::transport::TransportOptions;
use crate::Error;

pub const MAX_VOLTAGE: f64 = 20.0;
pub const MAX_CURRENT: f64 = 3.0;

/// Depth of the instrument error queue.
pub const ERROR_QUEUE_DEPTH: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoltageRange {
    /// 20 V / 1.5 A
    High,
    /// 8 V / 3 A
    Low,
}

impl VoltageRange {
    const CHOICES: &'static [(&'static str, VoltageRange)] =
        &[("HIGH", VoltageRange::High), ("LOW", VoltageRange::Low)];

    pub fn as_scpi(&self) -> &'static str {
        match self {
            VoltageRange::High => "P20V",
            VoltageRange::Low => "P8V",
        }
    }

    fn from_reply(reply: &str) -> crate::Result<Self> {
        match unquote(reply).to_uppercase().as_str() {
            "P20V" => Ok(VoltageRange::High),
            "P8V" => Ok(VoltageRange::Low),
            _ => Err(Error::unexpected_response(reply)),
        }
    }
}

impl FromStr for VoltageRange {
    type Err = MalformedParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, Self::CHOICES)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputState {
    On,
    Off,
}

impl OutputState {
    const CHOICES: &'static [(&'static str, OutputState)] =
        &[("ON", OutputState::On), ("OFF", OutputState::Off)];

    pub fn as_scpi(&self) -> &'static str {
        match self {
            OutputState::On => "ON",
            OutputState::Off => "OFF",
        }
    }
}

impl FromStr for OutputState {
    type Err = MalformedParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, Self::CHOICES)
    }
}

impl From<bool> for OutputState {
    fn from(on: bool) -> Self {
        if on {
            OutputState::On
        } else {
            OutputState::Off
        }
    }
}

pub struct AgilentE364xA {
    instr: Instrument,
}

impl AgilentE364xA {
    pub async fn connect(addr: &str) -> crate::Result<Self> {
        Ok(Self::new(Instrument::connect(addr).await?))
    }

    pub async fn connect_with_options(addr: &str, options: &TransportOptions) -> crate::Result<Self> {
        Ok(Self::new(Instrument::connect_with_options(addr, options).await?))
    }

    pub fn new(instr: Instrument) -> Self {
        Self { instr }
    }

    pub fn into_inner(self) -> Instrument {
        self.instr
    }

    /// Program the output voltage, 0 to 20 V.
    pub async fn set_voltage(&mut self, voltage: f64) -> crate::Result<()> {
        check_range(voltage, 0.0, MAX_VOLTAGE, "V")?;
        let cmd = format!("VOLTage {}", format_number(voltage));
        self.instr.write(&cmd).await
    }

    /// Program the current limit, 0 to 3 A.
    pub async fn set_current(&mut self, current: f64) -> crate::Result<()> {
        check_range(current, 0.0, MAX_CURRENT, "A")?;
        let cmd = format!("CURRent {}", format_number(current));
        self.instr.write(&cmd).await
    }

    /// Program voltage and current in one command.
    ///
    /// The pair is only rejected if *both* values are out of range. If just one of them is, the
    /// command is still sent and the instrument answers with `-222,"Data out of range"` in its
    /// error queue, see [`AgilentE364xA::check_errors`].
    pub async fn set_output(&mut self, voltage: f64, current: f64) -> crate::Result<()> {
        let voltage_ok = (0.0..=MAX_VOLTAGE).contains(&voltage);
        let current_ok = (0.0..=MAX_CURRENT).contains(&current);
        if !voltage_ok && !current_ok {
            return Err(MalformedParameter::described(
                format!("{} V, {} A", voltage, current),
                format!("between 0 - {} V and 0 - {} A", MAX_VOLTAGE, MAX_CURRENT),
            )
            .into());
        }
        let cmd = format!(
            "APPLy {}, {}",
            format_number(voltage),
            format_number(current)
        );
        self.instr.write(&cmd).await
    }

    /// Select the output range, `"HIGH"` (20 V) or `"LOW"` (8 V) in any case.
    pub async fn set_voltage_range(&mut self, range: &str) -> crate::Result<()> {
        self.select_voltage_range(range.parse()?).await
    }

    pub async fn select_voltage_range(&mut self, range: VoltageRange) -> crate::Result<()> {
        let cmd = format!("VOLTage:RANGe {}", range.as_scpi());
        self.instr.write(&cmd).await
    }

    /// Enable or disable the output, `"ON"` or `"OFF"` in any case.
    pub async fn set_output_state(&mut self, state: &str) -> crate::Result<()> {
        self.enable_output(state.parse()?).await
    }

    pub async fn enable_output(&mut self, state: OutputState) -> crate::Result<()> {
        let cmd = format!("OUTput {}", state.as_scpi());
        self.instr.write(&cmd).await
    }

    /// Voltage measured at the output terminals.
    pub async fn get_voltage_actual(&mut self) -> crate::Result<f64> {
        self.instr.query_number("MEASure:VOLTage?").await
    }

    /// Programmed voltage.
    pub async fn get_voltage_set(&mut self) -> crate::Result<f64> {
        self.instr.query_number("VOLTage?").await
    }

    pub async fn get_current_actual(&mut self) -> crate::Result<f64> {
        self.instr.query_number("MEASure:CURRent?").await
    }

    pub async fn get_current_set(&mut self) -> crate::Result<f64> {
        self.instr.query_number("CURRent?").await
    }

    pub async fn get_voltage_range(&mut self) -> crate::Result<VoltageRange> {
        let reply = self.instr.query_string("VOLTage:RANGe?").await?;
        VoltageRange::from_reply(&reply)
    }

    pub async fn get_output_state(&mut self) -> crate::Result<bool> {
        let reply = self.instr.query_string("OUTPut?").await?;
        match reply.trim().to_uppercase().as_str() {
            "1" | "ON" => Ok(true),
            "0" | "OFF" => Ok(false),
            _ => Err(Error::unexpected_response(reply)),
        }
    }

    /// Programmed `(voltage, current)` as reported by `APPLy?`.
    pub async fn get_output_set(&mut self) -> crate::Result<(f64, f64)> {
        let reply = self.instr.query_string("APPLy?").await?;
        let fields: Vec<_> = unquote(&reply).split(',').collect();
        match fields.as_slice() {
            [voltage, current] => Ok((parse_number(voltage)?, parse_number(current)?)),
            _ => Err(Error::unexpected_response(reply.as_str())),
        }
    }

    /// Pop the oldest entry from the error queue, `None` if it is empty.
    pub async fn next_error(&mut self) -> crate::Result<Option<ScpiError>> {
        let reply = self.instr.query_string("SYSTem:ERRor?").await?;
        let err = ScpiError::parse(&reply)?;
        if err.is_no_error() {
            Ok(None)
        } else {
            Ok(Some(err))
        }
    }

    /// Drain the error queue, oldest entry first.
    pub async fn get_errors(&mut self) -> crate::Result<Vec<ScpiError>> {
        let mut ret = Vec::new();
        for _ in 0..ERROR_QUEUE_DEPTH {
            match self.next_error().await? {
                Some(err) => {
                    log::warn!("{} reported error: {}", self.instr, err);
                    ret.push(err);
                }
                None => break,
            }
        }
        Ok(ret)
    }

    /// Drain the error queue and fail if anything was in it.
    pub async fn check_errors(&mut self) -> crate::Result<()> {
        let errors = self.get_errors().await?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(InstrumentError { errors }.into())
        }
    }

    pub async fn beep(&mut self) -> crate::Result<()> {
        self.instr.write(BEEP).await
    }
}

impl Scpi for AgilentE364xA {
    fn instrument(&mut self) -> &mut Instrument {
        &mut self.instr
    }
}

impl Display for AgilentE364xA {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "E364xA@{}", self.instr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use labinstr_protocol::{Expected, ScpiErrorClass};

    fn psu() -> (AgilentE364xA, MockTransport) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mock = MockTransport::new();
        let instr = Instrument::with_transport("mock", mock.clone());
        (AgilentE364xA::new(instr), mock)
    }

    #[tokio::test]
    async fn voltage_limits() {
        let (mut psu, mock) = psu();
        psu.set_voltage(20.0).await.unwrap();
        psu.set_voltage(0.0).await.unwrap();
        psu.set_voltage(12.5).await.unwrap();
        assert!(psu.set_voltage(20.0001).await.unwrap_err().is_malformed_parameter());
        assert!(psu.set_voltage(-0.1).await.unwrap_err().is_malformed_parameter());
        assert!(psu.set_voltage(f64::NAN).await.unwrap_err().is_malformed_parameter());
        assert_eq!(
            mock.written(),
            vec!["VOLTage 20", "VOLTage 0", "VOLTage 12.5"]
        );
    }

    #[tokio::test]
    async fn voltage_error_describes_range() {
        let (mut psu, _mock) = psu();
        match psu.set_voltage(25.0).await {
            Err(Error::MalformedParameter(x)) => {
                assert_eq!(x.received, "25");
                assert_eq!(
                    x.expected,
                    Expected::Range {
                        min: 0.0,
                        max: 20.0,
                        unit: "V".to_string()
                    }
                );
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn current_limits() {
        let (mut psu, mock) = psu();
        psu.set_current(3.0).await.unwrap();
        psu.set_current(0.25).await.unwrap();
        assert!(psu.set_current(3.01).await.is_err());
        assert!(psu.set_current(-1.0).await.is_err());
        assert_eq!(mock.written(), vec!["CURRent 3", "CURRent 0.25"]);
    }

    #[tokio::test]
    async fn apply_rejects_only_when_both_are_out_of_range() {
        let (mut psu, mock) = psu();
        psu.set_output(5.0, 1.2).await.unwrap();
        psu.set_output(25.0, 1.0).await.unwrap();
        psu.set_output(5.0, 4.0).await.unwrap();
        assert!(psu
            .set_output(25.0, 4.0)
            .await
            .unwrap_err()
            .is_malformed_parameter());
        assert_eq!(
            mock.written(),
            vec!["APPLy 5, 1.2", "APPLy 25, 1", "APPLy 5, 4"]
        );
    }

    #[tokio::test]
    async fn voltage_range() {
        let (mut psu, mock) = psu();
        psu.set_voltage_range("HIGH").await.unwrap();
        psu.set_voltage_range("low").await.unwrap();
        assert!(psu.set_voltage_range("MID").await.is_err());
        assert_eq!(
            mock.written(),
            vec!["VOLTage:RANGe P20V", "VOLTage:RANGe P8V"]
        );

        mock.push_reply("P20V");
        mock.push_reply("P8V");
        mock.push_reply("P35V");
        assert_eq!(psu.get_voltage_range().await.unwrap(), VoltageRange::High);
        assert_eq!(psu.get_voltage_range().await.unwrap(), VoltageRange::Low);
        assert!(psu.get_voltage_range().await.is_err());
    }

    #[tokio::test]
    async fn output_state() {
        let (mut psu, mock) = psu();
        psu.set_output_state("on").await.unwrap();
        psu.set_output_state("OFF").await.unwrap();
        assert!(psu.set_output_state("ONOFF").await.is_err());
        assert!(psu.set_output_state("1").await.is_err());
        psu.enable_output(true.into()).await.unwrap();
        assert_eq!(
            mock.written(),
            vec!["OUTput ON", "OUTput OFF", "OUTput ON"]
        );

        mock.push_reply("1");
        mock.push_reply("0");
        assert!(psu.get_output_state().await.unwrap());
        assert!(!psu.get_output_state().await.unwrap());
    }

    #[tokio::test]
    async fn getters() {
        let (mut psu, mock) = psu();
        mock.push_reply("+4.99950000E+00");
        mock.push_reply("+5.00000000E+00");
        mock.push_reply("+1.20000000E-01");
        mock.push_reply("+1.00000000E+00");
        assert_eq!(psu.get_voltage_actual().await.unwrap(), 4.9995);
        assert_eq!(psu.get_voltage_set().await.unwrap(), 5.0);
        assert_eq!(psu.get_current_actual().await.unwrap(), 0.12);
        assert_eq!(psu.get_current_set().await.unwrap(), 1.0);
        assert_eq!(
            mock.written(),
            vec!["MEASure:VOLTage?", "VOLTage?", "MEASure:CURRent?", "CURRent?"]
        );
    }

    #[tokio::test]
    async fn output_set() {
        let (mut psu, mock) = psu();
        mock.push_reply("5.0,1.2");
        mock.push_reply("\"+5.000000E+00,+1.200000E+00\"");
        mock.push_reply("5.0");
        assert_eq!(psu.get_output_set().await.unwrap(), (5.0, 1.2));
        assert_eq!(psu.get_output_set().await.unwrap(), (5.0, 1.2));
        assert!(psu.get_output_set().await.is_err());
        assert_eq!(mock.written(), vec!["APPLy?", "APPLy?", "APPLy?"]);
    }

    #[tokio::test]
    async fn drain_error_queue() {
        let (mut psu, mock) = psu();
        mock.push_reply("-113,\"Undefined header\"");
        mock.push_reply("-222,\"Data out of range\"");
        mock.push_reply("+0,\"No error\"");
        let errors = psu.get_errors().await.unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, -113);
        assert_eq!(errors[0].class(), ScpiErrorClass::Command);
        assert_eq!(errors[1].message, "Data out of range");
        assert_eq!(mock.pending_replies(), 0);
        assert_eq!(mock.written().len(), 3);
    }

    #[tokio::test]
    async fn error_queue_is_bounded() {
        let (mut psu, mock) = psu();
        for _ in 0..25 {
            mock.push_reply("-350,\"Queue overflow\"");
        }
        let errors = psu.get_errors().await.unwrap();
        assert_eq!(errors.len(), ERROR_QUEUE_DEPTH);
        assert_eq!(mock.pending_replies(), 5);
    }

    #[tokio::test]
    async fn check_errors() {
        let (mut psu, mock) = psu();
        mock.push_reply("+0,\"No error\"");
        psu.check_errors().await.unwrap();

        mock.push_reply("-222,\"Data out of range\"");
        mock.push_reply("+0,\"No error\"");
        match psu.check_errors().await {
            Err(Error::Instrument(x)) => {
                assert_eq!(x.errors.len(), 1);
                assert_eq!(x.errors[0].class(), ScpiErrorClass::Execution);
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn beep_is_write_only() {
        let (mut psu, mock) = psu();
        psu.beep().await.unwrap();
        assert_eq!(mock.written(), vec!["SYSTem:BEEPer"]);
        assert_eq!(psu.to_string(), "E364xA@mock");
    }
}
