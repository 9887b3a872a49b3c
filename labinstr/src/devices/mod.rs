//! Drivers for specific instruments.
use labinstr_protocol::MalformedParameter;

pub mod agilent_34401a;
pub mod agilent_e364xa;

pub use agilent_34401a::Agilent34401A;
pub use agilent_e364xa::AgilentE364xA;

pub(crate) const BEEP: &str = "SYSTem:BEEPer";

/// Case-insensitive lookup of `value` in a table of accepted keywords.
pub(crate) fn parse_choice<T: Copy>(value: &str, choices: &[(&str, T)]) -> Result<T, MalformedParameter> {
    let value = value.to_uppercase();
    choices
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, x)| *x)
        .ok_or_else(|| {
            let names: Vec<_> = choices.iter().map(|(name, _)| *name).collect();
            MalformedParameter::one_of(&value, &names)
        })
}

/// Inclusive range check, NaN is never in range.
pub(crate) fn check_range(value: f64, min: f64, max: f64, unit: &str) -> Result<(), MalformedParameter> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(MalformedParameter::range(value, min, max, unit))
    }
}

/// Formats a numeric parameter, `-0` is sent as `0`.
pub(crate) fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labinstr_protocol::Expected;

    #[test]
    fn choices() {
        let table = [("AC", 1), ("DC", 2)];
        assert_eq!(parse_choice("ac", &table).unwrap(), 1);
        assert_eq!(parse_choice("Dc", &table).unwrap(), 2);
        let err = parse_choice("ohm", &table).unwrap_err();
        assert_eq!(err.received, "OHM");
        assert_eq!(
            err.expected,
            Expected::OneOf(vec!["AC".to_string(), "DC".to_string()])
        );
        assert!(parse_choice(" ac", &table).is_err());
    }

    #[test]
    fn ranges() {
        assert!(check_range(0.0, 0.0, 20.0, "V").is_ok());
        assert!(check_range(20.0, 0.0, 20.0, "V").is_ok());
        assert!(check_range(20.0001, 0.0, 20.0, "V").is_err());
        assert!(check_range(-0.1, 0.0, 20.0, "V").is_err());
        assert!(check_range(f64::NAN, 0.0, 20.0, "V").is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(1.25), "1.25");
    }
}
