//! Instrument configurations for the INSTR command
//!
//! Each instrument takes its own positional argument layout after
//! `INSTR <session id> <inst id>`. Most are followed by a pair of calibration
//! flags; Merope (EM01) is the exception.

use serde::{Deserialize, Serialize};
use crate::error::{ToopError, ToopResult};
use crate::types::check_token;

/// Dual filter wheel imagers (lower and upper wheel)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DualFilterImager {
    Ratcam,
    Hawkcam,
    Ea01,
    Ea02,
}

impl DualFilterImager {
    pub fn id(&self) -> &'static str {
        match self {
            DualFilterImager::Ratcam => "RATCAM",
            DualFilterImager::Hawkcam => "HAWKCAM",
            DualFilterImager::Ea01 => "EA01",
            DualFilterImager::Ea02 => "EA02",
        }
    }
}

/// Three filter Merope cameras
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MeropeCamera {
    Em01,
    Em02,
}

/// Binning-only polarimeters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Polarimeter {
    Ringo,
    RingoStar,
    Grope,
}

/// Trigger source for gated cameras
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TriggerType {
    Internal,
    External,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Internal => "internal",
            TriggerType::External => "external",
        }
    }
}

impl std::str::FromStr for TriggerType {
    type Err = ToopError;

    fn from_str(s: &str) -> ToopResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "internal" => Ok(TriggerType::Internal),
            "external" => Ok(TriggerType::External),
            _ => Err(ToopError::invalid_argument(format!("unknown trigger type: {}", s))),
        }
    }
}

/// Readout window on the detector, in unbinned pixels
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstrWindow {
    pub x_start: i32,
    pub y_start: i32,
    pub x_end: i32,
    pub y_end: i32,
}

impl InstrWindow {
    pub fn new(x_start: i32, y_start: i32, x_end: i32, y_end: i32) -> Self {
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
        }
    }
}

/// Configuration of one named instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum InstrumentConfig {
    DualFilterImager {
        inst: DualFilterImager,
        lower_filter: String,
        upper_filter: String,
        x_bin: i32,
        y_bin: i32,
    },
    Merope {
        inst: MeropeCamera,
        filters: [String; 3],
        x_bin: i32,
        y_bin: i32,
    },
    Rise {
        x_bin: i32,
        y_bin: i32,
    },
    IoO {
        filter_wheel: String,
        filter_slide_lower: String,
        filter_slide_upper: String,
        x_bin: i32,
        y_bin: i32,
    },
    IrCam {
        filter: String,
        x_bin: i32,
        y_bin: i32,
    },
    FixedSpec {
        x_bin: i32,
        y_bin: i32,
    },
    NuvSpec {
        wavelength: String,
    },
    Polarimeter {
        inst: Polarimeter,
        x_bin: i32,
        y_bin: i32,
    },
    Ringo3 {
        trigger: TriggerType,
        em_gain: i32,
        x_bin: i32,
        y_bin: i32,
    },
    Moptop {
        rotor_speed: String,
        filter: String,
        x_bin: i32,
        y_bin: i32,
    },
    IoThor {
        em_gain: i32,
        bin: i32,
        window: InstrWindow,
    },
}

impl InstrumentConfig {
    /// Square-binned RATCAM configuration
    pub fn ratcam(lower_filter: impl Into<String>, upper_filter: impl Into<String>, bin: i32) -> Self {
        InstrumentConfig::DualFilterImager {
            inst: DualFilterImager::Ratcam,
            lower_filter: lower_filter.into(),
            upper_filter: upper_filter.into(),
            x_bin: bin,
            y_bin: bin,
        }
    }

    /// Instrument identifier as the TOCS knows it
    pub fn inst_id(&self) -> &'static str {
        match self {
            InstrumentConfig::DualFilterImager { inst, .. } => inst.id(),
            InstrumentConfig::Merope { inst: MeropeCamera::Em01, .. } => "EM01",
            InstrumentConfig::Merope { inst: MeropeCamera::Em02, .. } => "EM02",
            InstrumentConfig::Rise { .. } => "RISE",
            InstrumentConfig::IoO { .. } => "IO:O",
            InstrumentConfig::IrCam { .. } => "IRCAM",
            InstrumentConfig::FixedSpec { .. } => "FIXEDSPEC",
            InstrumentConfig::NuvSpec { .. } => "NUVSPEC",
            InstrumentConfig::Polarimeter { inst: Polarimeter::Ringo, .. } => "RINGO",
            InstrumentConfig::Polarimeter { inst: Polarimeter::RingoStar, .. } => "RINGOSTAR",
            InstrumentConfig::Polarimeter { inst: Polarimeter::Grope, .. } => "GROPE",
            InstrumentConfig::Ringo3 { .. } => "RINGO3",
            InstrumentConfig::Moptop { .. } => "MOPTOP",
            InstrumentConfig::IoThor { .. } => "IO:THOR",
        }
    }

    /// Whether INSTR for this instrument ends with the calibration flags
    pub fn takes_calibration_flags(&self) -> bool {
        !matches!(self, InstrumentConfig::Merope { inst: MeropeCamera::Em01, .. })
    }

    /// Render the instrument specific arguments, space separated
    pub fn render_args(&self) -> ToopResult<String> {
        let args = match self {
            InstrumentConfig::DualFilterImager { lower_filter, upper_filter, x_bin, y_bin, .. } => {
                let bin = self.square_bin(*x_bin, *y_bin)?;
                format!(
                    "{} {} {}",
                    check_token("lower filter", lower_filter)?,
                    check_token("upper filter", upper_filter)?,
                    bin
                )
            }
            InstrumentConfig::Merope { filters, x_bin, y_bin, .. } => {
                let bin = self.square_bin(*x_bin, *y_bin)?;
                for filter in filters {
                    check_token("filter", filter)?;
                }
                format!("{} {} {} {}", filters[0], filters[1], filters[2], bin)
            }
            InstrumentConfig::Rise { x_bin, y_bin } => {
                let bin = self.square_bin(*x_bin, *y_bin)?;
                bin.to_string()
            }
            InstrumentConfig::IoO { filter_wheel, filter_slide_lower, filter_slide_upper, x_bin, y_bin } => {
                let bin = self.square_bin(*x_bin, *y_bin)?;
                format!(
                    "{} {} {} {}",
                    check_token("filter wheel", filter_wheel)?,
                    check_token("lower filter slide", filter_slide_lower)?,
                    check_token("upper filter slide", filter_slide_upper)?,
                    bin
                )
            }
            InstrumentConfig::IrCam { filter, x_bin, y_bin } => {
                let bin = self.square_bin(*x_bin, *y_bin)?;
                format!("{} {}", check_token("filter", filter)?, bin)
            }
            InstrumentConfig::FixedSpec { x_bin, y_bin }
            | InstrumentConfig::Polarimeter { x_bin, y_bin, .. } => {
                format!("{} {}", x_bin, y_bin)
            }
            InstrumentConfig::NuvSpec { wavelength } => {
                check_token("wavelength", wavelength)?.to_string()
            }
            InstrumentConfig::Ringo3 { trigger, em_gain, x_bin, y_bin } => {
                format!("{} {} {} {}", trigger.as_str(), em_gain, x_bin, y_bin)
            }
            InstrumentConfig::Moptop { rotor_speed, filter, x_bin, y_bin } => {
                format!(
                    "{} {} {} {}",
                    check_token("rotor speed", rotor_speed)?,
                    check_token("filter", filter)?,
                    x_bin,
                    y_bin
                )
            }
            InstrumentConfig::IoThor { em_gain, bin, window } => format!(
                "{} {} {} {} {} {}",
                em_gain, bin, window.x_start, window.x_end, window.y_start, window.y_end
            ),
        };
        Ok(args)
    }

    fn square_bin(&self, x_bin: i32, y_bin: i32) -> ToopResult<i32> {
        if x_bin != y_bin {
            return Err(ToopError::invalid_argument(format!(
                "{}: X binning {} does not match Y binning {}",
                self.inst_id(),
                x_bin,
                y_bin
            )));
        }
        Ok(x_bin)
    }

    /// Build a configuration from an instrument id and its positional
    /// arguments, in the order the TOCS expects them
    pub fn from_args(inst_id: &str, args: &[&str]) -> ToopResult<Self> {
        let expect_count = |count: usize| -> ToopResult<()> {
            if args.len() != count {
                return Err(ToopError::invalid_argument(format!(
                    "{} takes {} instrument arguments, got {}",
                    inst_id,
                    count,
                    args.len()
                )));
            }
            Ok(())
        };

        let config = match inst_id {
            "RATCAM" | "HAWKCAM" | "EA01" | "EA02" => {
                expect_count(3)?;
                let bin = parse_int(args[2], "bin")?;
                let inst = match inst_id {
                    "RATCAM" => DualFilterImager::Ratcam,
                    "HAWKCAM" => DualFilterImager::Hawkcam,
                    "EA01" => DualFilterImager::Ea01,
                    _ => DualFilterImager::Ea02,
                };
                InstrumentConfig::DualFilterImager {
                    inst,
                    lower_filter: args[0].to_string(),
                    upper_filter: args[1].to_string(),
                    x_bin: bin,
                    y_bin: bin,
                }
            }
            "EM01" | "EM02" => {
                expect_count(4)?;
                let bin = parse_int(args[3], "bin")?;
                InstrumentConfig::Merope {
                    inst: if inst_id == "EM01" { MeropeCamera::Em01 } else { MeropeCamera::Em02 },
                    filters: [args[0].to_string(), args[1].to_string(), args[2].to_string()],
                    x_bin: bin,
                    y_bin: bin,
                }
            }
            "RISE" => {
                expect_count(1)?;
                let bin = parse_int(args[0], "bin")?;
                InstrumentConfig::Rise { x_bin: bin, y_bin: bin }
            }
            "IO:O" => {
                expect_count(4)?;
                let bin = parse_int(args[3], "bin")?;
                InstrumentConfig::IoO {
                    filter_wheel: args[0].to_string(),
                    filter_slide_lower: args[1].to_string(),
                    filter_slide_upper: args[2].to_string(),
                    x_bin: bin,
                    y_bin: bin,
                }
            }
            "IRCAM" => {
                expect_count(2)?;
                let bin = parse_int(args[1], "bin")?;
                InstrumentConfig::IrCam {
                    filter: args[0].to_string(),
                    x_bin: bin,
                    y_bin: bin,
                }
            }
            "FIXEDSPEC" => {
                expect_count(2)?;
                InstrumentConfig::FixedSpec {
                    x_bin: parse_int(args[0], "x bin")?,
                    y_bin: parse_int(args[1], "y bin")?,
                }
            }
            "NUVSPEC" => {
                expect_count(1)?;
                InstrumentConfig::NuvSpec {
                    wavelength: args[0].to_string(),
                }
            }
            "RINGO" | "RINGOSTAR" | "GROPE" => {
                expect_count(2)?;
                let inst = match inst_id {
                    "RINGO" => Polarimeter::Ringo,
                    "RINGOSTAR" => Polarimeter::RingoStar,
                    _ => Polarimeter::Grope,
                };
                InstrumentConfig::Polarimeter {
                    inst,
                    x_bin: parse_int(args[0], "x bin")?,
                    y_bin: parse_int(args[1], "y bin")?,
                }
            }
            "RINGO3" => {
                expect_count(4)?;
                InstrumentConfig::Ringo3 {
                    trigger: args[0].parse()?,
                    em_gain: parse_int(args[1], "EM gain")?,
                    x_bin: parse_int(args[2], "x bin")?,
                    y_bin: parse_int(args[3], "y bin")?,
                }
            }
            "MOPTOP" => {
                expect_count(4)?;
                InstrumentConfig::Moptop {
                    rotor_speed: args[0].to_string(),
                    filter: args[1].to_string(),
                    x_bin: parse_int(args[2], "x bin")?,
                    y_bin: parse_int(args[3], "y bin")?,
                }
            }
            "IO:THOR" => {
                expect_count(6)?;
                InstrumentConfig::IoThor {
                    em_gain: parse_int(args[0], "EM gain")?,
                    bin: parse_int(args[1], "bin")?,
                    window: InstrWindow::new(
                        parse_int(args[2], "x start")?,
                        parse_int(args[3], "y start")?,
                        parse_int(args[4], "x end")?,
                        parse_int(args[5], "y end")?,
                    ),
                }
            }
            _ => {
                return Err(ToopError::invalid_argument(format!(
                    "unknown instrument: {}",
                    inst_id
                )))
            }
        };
        Ok(config)
    }
}

fn parse_int(s: &str, what: &str) -> ToopResult<i32> {
    s.parse::<i32>()
        .map_err(|_| ToopError::invalid_argument(format!("{} must be an integer: {}", what, s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratcam_args() {
        let config = InstrumentConfig::ratcam("SDSS-R", "clear", 2);
        assert_eq!(config.inst_id(), "RATCAM");
        assert_eq!(config.render_args().unwrap(), "SDSS-R clear 2");
        assert!(config.takes_calibration_flags());
    }

    #[test]
    fn test_binning_mismatch_rejected() {
        let config = InstrumentConfig::DualFilterImager {
            inst: DualFilterImager::Ratcam,
            lower_filter: "SDSS-R".to_string(),
            upper_filter: "clear".to_string(),
            x_bin: 1,
            y_bin: 2,
        };
        assert!(matches!(config.render_args(), Err(ToopError::InvalidArgument(_))));

        let config = InstrumentConfig::IrCam {
            filter: "H".to_string(),
            x_bin: 2,
            y_bin: 1,
        };
        assert!(config.render_args().is_err());
    }

    #[test]
    fn test_filter_names_must_be_single_words() {
        let config = InstrumentConfig::ratcam("SDSS R", "clear", 2);
        assert!(matches!(config.render_args(), Err(ToopError::InvalidArgument(_))));

        let config = InstrumentConfig::ratcam("SDSS-R", "", 2);
        assert!(matches!(config.render_args(), Err(ToopError::InvalidArgument(_))));

        let config = InstrumentConfig::NuvSpec {
            wavelength: "4690.2\nQUIT sid".to_string(),
        };
        assert!(matches!(config.render_args(), Err(ToopError::InvalidArgument(_))));

        let config = InstrumentConfig::Merope {
            inst: MeropeCamera::Em02,
            filters: ["R".to_string(), "G".to_string(), "\t".to_string()],
            x_bin: 1,
            y_bin: 1,
        };
        assert!(config.render_args().is_err());

        let config = InstrumentConfig::Moptop {
            rotor_speed: "slow".to_string(),
            filter: "MOP-R".to_string(),
            x_bin: 1,
            y_bin: 1,
        };
        assert_eq!(config.render_args().unwrap(), "slow MOP-R 1 1");
    }

    #[test]
    fn test_rectangular_binning_allowed() {
        let config = InstrumentConfig::FixedSpec { x_bin: 1, y_bin: 2 };
        assert_eq!(config.render_args().unwrap(), "1 2");
    }

    #[test]
    fn test_em01_has_no_calibration_flags() {
        let config = InstrumentConfig::from_args("EM01", &["R", "G", "B", "1"]).unwrap();
        assert!(!config.takes_calibration_flags());
        assert_eq!(config.render_args().unwrap(), "R G B 1");

        let config = InstrumentConfig::from_args("EM02", &["R", "G", "B", "1"]).unwrap();
        assert!(config.takes_calibration_flags());
    }

    #[test]
    fn test_windowed_and_gated_layouts() {
        let config = InstrumentConfig::from_args("IO:THOR", &["100", "2", "1", "3", "512", "1024"]).unwrap();
        assert_eq!(config.render_args().unwrap(), "100 2 1 512 3 1024");

        let config = InstrumentConfig::from_args("RINGO3", &["External", "100", "2", "2"]).unwrap();
        assert_eq!(config.render_args().unwrap(), "external 100 2 2");

        let config = InstrumentConfig::from_args("MOPTOP", &["fast", "MOP-R", "1", "1"]).unwrap();
        assert_eq!(config.render_args().unwrap(), "fast MOP-R 1 1");
    }

    #[test]
    fn test_from_args_errors() {
        assert!(InstrumentConfig::from_args("FRODOSPEC", &[]).is_err());
        assert!(InstrumentConfig::from_args("RATCAM", &["R", "clear"]).is_err());
        assert!(InstrumentConfig::from_args("RISE", &["two"]).is_err());
    }
}
