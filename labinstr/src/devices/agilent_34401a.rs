//! Agilent (HP) 34401A 6½ digit multimeter.
//!
//! All measurements use the `MEASure` subsystem, i.e. the instrument is configured, triggered
//! and read out in one go, with default range and resolution where applicable.
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use labinstr_protocol::MalformedParameter;

use crate::devices::{parse_choice, BEEP};
use crate::instrument::{Instrument, Scpi};
use crate::transport::TransportOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coupling {
    Ac,
    Dc,
}

impl Coupling {
    const CHOICES: &'static [(&'static str, Coupling)] = &[("AC", Coupling::Ac), ("DC", Coupling::Dc)];

    pub fn as_scpi(&self) -> &'static str {
        match self {
            Coupling::Ac => "AC",
            Coupling::Dc => "DC",
        }
    }
}

impl FromStr for Coupling {
    type Err = MalformedParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, Self::CHOICES)
    }
}

/// Two-wire or four-wire (Kelvin) resistance measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wiring {
    Two,
    Four,
}

impl Wiring {
    const CHOICES: &'static [(&'static str, Wiring)] = &[("TWO", Wiring::Two), ("FOUR", Wiring::Four)];
}

impl FromStr for Wiring {
    type Err = MalformedParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_choice(s, Self::CHOICES)
    }
}

pub struct Agilent34401A {
    instr: Instrument,
}

impl Agilent34401A {
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

    /// Measure AC or DC current, `measurement_type` is `"AC"` or `"DC"` in any case.
    pub async fn current_measurement(&mut self, measurement_type: &str) -> crate::Result<f64> {
        self.measure_current(measurement_type.parse()?).await
    }

    pub async fn measure_current(&mut self, coupling: Coupling) -> crate::Result<f64> {
        let cmd = format!("MEASure:CURRent:{}? DEF,DEF", coupling.as_scpi());
        self.instr.query_number(&cmd).await
    }

    /// Measure AC or DC voltage, `measurement_type` is `"AC"` or `"DC"` in any case.
    pub async fn voltage_measurement(&mut self, measurement_type: &str) -> crate::Result<f64> {
        self.measure_voltage(measurement_type.parse()?).await
    }

    pub async fn measure_voltage(&mut self, coupling: Coupling) -> crate::Result<f64> {
        let cmd = format!("MEASure:VOLTage:{}? DEF,DEF", coupling.as_scpi());
        self.instr.query_number(&cmd).await
    }

    /// Measure resistance, `measurement_type` is `"TWO"` or `"FOUR"` (wire) in any case.
    pub async fn resistance_measurement(&mut self, measurement_type: &str) -> crate::Result<f64> {
        self.measure_resistance(measurement_type.parse()?).await
    }

    pub async fn measure_resistance(&mut self, wiring: Wiring) -> crate::Result<f64> {
        let cmd = match wiring {
            Wiring::Two => "MEASure:RESistance?",
            Wiring::Four => "MEASure:FRESistance?",
        };
        self.instr.query_number(cmd).await
    }

    pub async fn frequency_measurement(&mut self) -> crate::Result<f64> {
        self.instr.query_number("MEASure:FREQuency? DEF,DEF").await
    }

    pub async fn period_measurement(&mut self) -> crate::Result<f64> {
        self.instr.query_number("MEASure:PERiod? DEF,DEF").await
    }

    /// Continuity test, returns the measured resistance.
    pub async fn continuity_measurement(&mut self) -> crate::Result<f64> {
        self.instr.query_number("MEASure:CONTinuity?").await
    }

    /// Diode test, returns the forward voltage.
    pub async fn diode_measurement(&mut self) -> crate::Result<f64> {
        self.instr.query_number("MEASure:DIODe?").await
    }

    pub async fn beep(&mut self) -> crate::Result<()> {
        self.instr.write(BEEP).await
    }
}

impl Scpi for Agilent34401A {
    fn instrument(&mut self) -> &mut Instrument {
        &mut self.instr
    }
}

impl Display for Agilent34401A {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "34401A@{}", self.instr)
    }
}
