//! Command definitions for the TOC protocol
//!
//! Each command is a small descriptor: how to render its request line from its
//! own fields plus the session data, and what to pull out of an OK reply.
//! Nothing here touches the network; see `tooplib` for execution.

use std::fmt;
use std::str::FromStr;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::astrometry::{Dec, Ra};
use crate::error::{ToopError, ToopResult};
use crate::instrument::InstrumentConfig;
use crate::protocol::ReplyValues;
use crate::replies::{ExposeReply, HeloReply, PositionReply, StatusReply, WhenReply};
use crate::session_data::{keys, SessionData};
use crate::types::{
    check_token, flag, format_decimal, AcquireMode, AcquirePrecision, AutoguiderState, RotatorMode,
};

/// Date format of an EXPOSE RUNAT start time
pub const RUNAT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Reply keyword prefix for numbered filenames (`file1`, `file2`, ...)
pub const FILENAME_KEYWORD_PREFIX: &str = "file";

/// A TOC command: renders one request line and extracts its typed result
pub trait TocCommand {
    /// Protocol keyword opening the request line
    const NAME: &'static str;

    /// Typed result of a successful exchange
    type Output;

    /// Render the request line, without terminator
    fn render(&self, data: &SessionData) -> ToopResult<String>;

    /// Extract typed results from an OK reply, recording session facts
    fn extract(&self, reply: &ReplyValues, data: &mut SessionData) -> ToopResult<Self::Output>;
}

/// Command types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CommandType {
    Helo,
    Init,
    Slew,
    Instr,
    Expose,
    Arc,
    Status,
    Position,
    Offset,
    Auto,
    Rotator,
    Stop,
    Quit,
    When,
    Acquire,
    FocalPlane,
    AgRadial,
}

impl CommandType {
    pub const ALL: [CommandType; 17] = [
        CommandType::Helo,
        CommandType::Init,
        CommandType::Slew,
        CommandType::Instr,
        CommandType::Expose,
        CommandType::Arc,
        CommandType::Status,
        CommandType::Position,
        CommandType::Offset,
        CommandType::Auto,
        CommandType::Rotator,
        CommandType::Stop,
        CommandType::Quit,
        CommandType::When,
        CommandType::Acquire,
        CommandType::FocalPlane,
        CommandType::AgRadial,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            CommandType::Helo => Helo::NAME,
            CommandType::Init => Init::NAME,
            CommandType::Slew => Slew::NAME,
            CommandType::Instr => Instr::NAME,
            CommandType::Expose => Expose::NAME,
            CommandType::Arc => Arc::NAME,
            CommandType::Status => Status::NAME,
            CommandType::Position => Position::NAME,
            CommandType::Offset => Offset::NAME,
            CommandType::Auto => Auto::NAME,
            CommandType::Rotator => Rotator::NAME,
            CommandType::Stop => Stop::NAME,
            CommandType::Quit => Quit::NAME,
            CommandType::When => When::NAME,
            CommandType::Acquire => Acquire::NAME,
            CommandType::FocalPlane => FocalPlane::NAME,
            CommandType::AgRadial => AgRadial::NAME,
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for CommandType {
    type Err = ToopError;

    fn from_str(s: &str) -> ToopResult<Self> {
        CommandType::ALL
            .iter()
            .copied()
            .find(|t| t.keyword().eq_ignore_ascii_case(s))
            .ok_or_else(|| ToopError::invalid_argument(format!("unknown command: {}", s)))
    }
}

/// HELO command - open a session for the configured service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Helo;

impl TocCommand for Helo {
    const NAME: &'static str = "HELO";
    type Output = HeloReply;

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!("{} {}", Self::NAME, data.service_id()?))
    }

    fn extract(&self, reply: &ReplyValues, data: &mut SessionData) -> ToopResult<HeloReply> {
        let session_id = reply.require("sessionID")?.to_string();
        data.set_session_id(session_id.clone());
        let session_limit = reply.require_int("sessionLimit")?;
        data.set(keys::SESSION_LIMIT, session_limit.to_string());
        let time_remaining = reply.require_int("timeRemaining")?;
        data.set(keys::TIME_REMAINING, time_remaining.to_string());
        let priority = reply.require_int("priority")?;
        data.set(keys::PRIORITY, priority.to_string());

        Ok(HeloReply {
            session_id,
            session_limit,
            time_remaining,
            priority,
        })
    }
}

/// INIT command - initialise the telescope with the session's init options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Init;

impl TocCommand for Init {
    const NAME: &'static str = "INIT";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {} {} {}",
            Self::NAME,
            data.session_id()?,
            data.init_rotator_option()?,
            data.init_focus_option()?,
            data.init_ag_option()?
        ))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// SLEW command - move the telescope to a target
#[derive(Debug, Clone, PartialEq)]
pub struct Slew {
    pub source_id: String,
    pub ra: Ra,
    pub dec: Dec,
}

impl TocCommand for Slew {
    const NAME: &'static str = "SLEW";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {} {} {}",
            Self::NAME,
            data.session_id()?,
            check_token("source id", &self.source_id)?,
            self.ra,
            self.dec
        ))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// INSTR command - configure an instrument
#[derive(Debug, Clone, PartialEq)]
pub struct Instr {
    pub config: InstrumentConfig,
    pub calibrate_before: bool,
    pub calibrate_after: bool,
}

impl TocCommand for Instr {
    const NAME: &'static str = "INSTR";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        let mut line = format!(
            "{} {} {} {}",
            Self::NAME,
            data.session_id()?,
            self.config.inst_id(),
            self.config.render_args()?
        );
        if self.config.takes_calibration_flags() {
            line.push(' ');
            line.push(flag(self.calibrate_before));
            line.push(flag(self.calibrate_after));
        }
        Ok(line)
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// When an exposure sequence starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposeStart {
    /// MULTRUN: this many exposures, starting now
    Count(i32),
    /// RUNAT: one exposure at this local time
    At(NaiveDateTime),
}

/// EXPOSE command - take exposures and report the resulting files
#[derive(Debug, Clone, PartialEq)]
pub struct Expose {
    /// Milliseconds
    pub exposure_length: i32,
    pub start: ExposeStart,
    pub data_pipeline: bool,
}

impl TocCommand for Expose {
    const NAME: &'static str = "EXPOSE";
    type Output = ExposeReply;

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        let start = match self.start {
            ExposeStart::Count(count) => count.to_string(),
            ExposeStart::At(date) => date.format(RUNAT_DATE_FORMAT).to_string(),
        };
        Ok(format!(
            "{} {} {} {} {}",
            Self::NAME,
            data.session_id()?,
            self.exposure_length,
            start,
            flag(self.data_pipeline)
        ))
    }

    fn extract(&self, reply: &ReplyValues, data: &mut SessionData) -> ToopResult<ExposeReply> {
        let filenames = reply.numbered(FILENAME_KEYWORD_PREFIX);

        let seeing = reply.require_double("seeing")?;
        data.set(keys::EXPOSE_SEEING, format_decimal(seeing));
        let counts = reply.require_int("counts")?;
        data.set(keys::EXPOSE_COUNTS, counts.to_string());
        let photometric = reply.require_double("photom")?;
        data.set(keys::EXPOSE_PHOTOMETRIC, format_decimal(photometric));
        let sky_brightness = reply.require_double("skybright")?;
        data.set(keys::EXPOSE_SKY_BRIGHTNESS, format_decimal(sky_brightness));
        let x_pix = reply.require_double("xpix")?;
        data.set(keys::EXPOSE_XPIX, format_decimal(x_pix));
        let y_pix = reply.require_double("ypix")?;
        data.set(keys::EXPOSE_YPIX, format_decimal(y_pix));

        Ok(ExposeReply {
            filenames,
            seeing,
            counts,
            photometric,
            sky_brightness,
            x_pix,
            y_pix,
        })
    }
}

/// ARC command - take an arc lamp calibration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc {
    pub lamp: String,
}

impl TocCommand for Arc {
    const NAME: &'static str = "ARC";
    type Output = Vec<String>;

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {}",
            Self::NAME,
            data.session_id()?,
            check_token("lamp name", &self.lamp)?
        ))
    }

    fn extract(&self, reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<Vec<String>> {
        Ok(reply.numbered(FILENAME_KEYWORD_PREFIX))
    }
}

/// STATUS command - query one status keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub category: String,
    pub keyword: String,
}

impl TocCommand for Status {
    const NAME: &'static str = "STATUS";
    type Output = StatusReply;

    fn render(&self, _data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {}",
            Self::NAME,
            check_token("status category", &self.category)?,
            check_token("status keyword", &self.keyword)?
        ))
    }

    fn extract(&self, reply: &ReplyValues, data: &mut SessionData) -> ToopResult<StatusReply> {
        let value = reply.require(&self.keyword)?.to_string();
        data.set(keys::STATUS_VALUE, value.clone());
        Ok(StatusReply {
            keyword: self.keyword.clone(),
            value,
        })
    }
}

/// POSITION command - where a target is right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub ra: Ra,
    pub dec: Dec,
}

impl TocCommand for Position {
    const NAME: &'static str = "POSITION";
    type Output = PositionReply;

    fn render(&self, _data: &SessionData) -> ToopResult<String> {
        Ok(format!("{} {} {}", Self::NAME, self.ra, self.dec))
    }

    fn extract(&self, reply: &ReplyValues, data: &mut SessionData) -> ToopResult<PositionReply> {
        let altitude = reply.require_double("alt")?;
        data.set(keys::POSITION_ALTITUDE, format_decimal(altitude));
        let azimuth = reply.require_double("az")?;
        data.set(keys::POSITION_AZIMUTH, format_decimal(azimuth));
        let time_to_rise = reply.require_int("rise")?;
        data.set(keys::POSITION_TIME_TO_RISE, time_to_rise.to_string());
        let time_to_set = reply.require_int("set")?;
        data.set(keys::POSITION_TIME_TO_SET, time_to_set.to_string());
        let moon_distance = reply.require_double("moon")?;
        data.set(keys::POSITION_MOON_DISTANCE, format_decimal(moon_distance));
        let category = reply.require("cat")?.to_string();
        data.set(keys::POSITION_CATEGORY, category.clone());
        let state = reply.require("state")?.to_string();
        data.set(keys::POSITION_STATE, state.clone());

        Ok(PositionReply {
            altitude,
            azimuth,
            time_to_rise,
            time_to_set,
            moon_distance,
            category,
            state,
        })
    }
}

/// OFFSET command - nudge the pointing, in arcseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub d_ra: f64,
    pub d_dec: f64,
}

impl TocCommand for Offset {
    const NAME: &'static str = "OFFSET";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {} {}",
            Self::NAME,
            data.session_id()?,
            format_decimal(self.d_ra),
            format_decimal(self.d_dec)
        ))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// AUTO command - switch the autoguider on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Auto {
    pub state: AutoguiderState,
}

impl TocCommand for Auto {
    const NAME: &'static str = "AUTO";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!("{} {} {}", Self::NAME, data.session_id()?, self.state))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// ROTATOR command - set the cassegrain rotator mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotator {
    pub mode: RotatorMode,
}

impl TocCommand for Rotator {
    const NAME: &'static str = "ROTATOR";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        let session_id = data.session_id()?;
        Ok(match self.mode {
            RotatorMode::Mount(angle) => format!(
                "{} {} {} {}",
                Self::NAME,
                session_id,
                self.mode.keyword(),
                format_decimal(angle)
            ),
            _ => format!("{} {} {}", Self::NAME, session_id, self.mode.keyword()),
        })
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// STOP command - abort whatever the telescope is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stop;

impl TocCommand for Stop {
    const NAME: &'static str = "STOP";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!("{} {}", Self::NAME, data.session_id()?))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// QUIT command - end the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quit;

impl TocCommand for Quit {
    const NAME: &'static str = "QUIT";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!("{} {}", Self::NAME, data.session_id()?))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// WHEN command - how long until the service may take control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct When;

impl TocCommand for When {
    const NAME: &'static str = "WHEN";
    type Output = WhenReply;

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!("{} {}", Self::NAME, data.service_id()?))
    }

    fn extract(&self, reply: &ReplyValues, data: &mut SessionData) -> ToopResult<WhenReply> {
        let time = reply.require_int("Time")?;
        data.set(keys::WHEN_TIME, time.to_string());
        let current_service = reply.require("Current")?.to_string();
        data.set(keys::WHEN_CURRENT_SERVICE, current_service.clone());
        Ok(WhenReply {
            time,
            current_service,
        })
    }
}

/// ACQUIRE command - put a target on the instrument's reference pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acquire {
    pub ra: Ra,
    pub dec: Dec,
    pub mode: AcquireMode,
    pub precision: AcquirePrecision,
}

impl TocCommand for Acquire {
    const NAME: &'static str = "ACQUIRE";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {} {} {} {}",
            Self::NAME,
            data.session_id()?,
            self.ra,
            self.dec,
            self.mode.as_str(),
            self.precision.as_str()
        ))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// FOCALPLANE command - point so a target falls on an instrument's aperture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocalPlane {
    pub instrument: String,
}

impl TocCommand for FocalPlane {
    const NAME: &'static str = "FOCALPLANE";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {}",
            Self::NAME,
            data.session_id()?,
            check_token("instrument name", &self.instrument)?
        ))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

/// AGRADIAL command - move the autoguider pick-off mirror, in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgRadial {
    pub position: f64,
}

impl TocCommand for AgRadial {
    const NAME: &'static str = "AGRADIAL";
    type Output = ();

    fn render(&self, data: &SessionData) -> ToopResult<String> {
        Ok(format!(
            "{} {} {}",
            Self::NAME,
            data.session_id()?,
            format_decimal(self.position)
        ))
    }

    fn extract(&self, _reply: &ReplyValues, _data: &mut SessionData) -> ToopResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::protocol::{parse_reply, ReplyOutcome};

    fn session() -> SessionData {
        let mut data = SessionData::new();
        data.set_service_id("TestService");
        data.set_session_id("sid42");
        data.set_init_rotator_option("SKY");
        data.set_init_focus_option("DEFAULT");
        data.set_init_ag_option("OFF");
        data
    }

    fn values(line: &str) -> ReplyValues {
        match parse_reply(line).unwrap() {
            ReplyOutcome::Ok(values) => values,
            other => panic!("expected OK reply, got {:?}", other),
        }
    }

    #[test]
    fn test_command_type_lookup() {
        assert_eq!("focalplane".parse::<CommandType>().unwrap(), CommandType::FocalPlane);
        assert_eq!(CommandType::AgRadial.to_string(), "AGRADIAL");
        assert!("PING".parse::<CommandType>().is_err());
    }

    #[test]
    fn test_render_session_commands() {
        let data = session();
        assert_eq!(Helo.render(&data).unwrap(), "HELO TestService");
        assert_eq!(When.render(&data).unwrap(), "WHEN TestService");
        assert_eq!(Init.render(&data).unwrap(), "INIT sid42 SKY DEFAULT OFF");
        assert_eq!(Stop.render(&data).unwrap(), "STOP sid42");
        assert_eq!(Quit.render(&data).unwrap(), "QUIT sid42");
    }

    #[test]
    fn test_render_requires_session_id() {
        let data = SessionData::new();
        assert!(matches!(Stop.render(&data), Err(ToopError::SessionData(_))));
        assert!(matches!(Helo.render(&data), Err(ToopError::SessionData(_))));
    }

    #[test]
    fn test_render_rejects_padded_session_values() {
        let mut data = session();
        data.set_session_id("sid42 EXTRA");
        assert!(matches!(Stop.render(&data), Err(ToopError::SessionData(_))));

        let mut data = session();
        data.set_service_id("Test\nQUIT sid42");
        assert!(matches!(Helo.render(&data), Err(ToopError::SessionData(_))));

        let mut data = session();
        data.set_init_focus_option("DEFAULT OFF");
        assert!(matches!(Init.render(&data), Err(ToopError::SessionData(_))));

        let data = SessionData::parse(
            "toop.session_id = sid42   \n\
             toop.service_id=TestService\t\n",
        )
        .unwrap();
        assert_eq!(Stop.render(&data).unwrap(), "STOP sid42");
        assert_eq!(Helo.render(&data).unwrap(), "HELO TestService");
    }

    #[test]
    fn test_render_slew_and_position() {
        let data = session();
        let slew = Slew {
            source_id: "GRB051231".to_string(),
            ra: "01:02:03.4".parse().unwrap(),
            dec: "-05:06:07.8".parse().unwrap(),
        };
        assert_eq!(slew.render(&data).unwrap(), "SLEW sid42 GRB051231 01:02:03.40 -05:06:07.80");

        let position = Position { ra: slew.ra, dec: slew.dec };
        assert_eq!(position.render(&data).unwrap(), "POSITION 01:02:03.40 -05:06:07.80");

        let bad = Slew {
            source_id: "two words".to_string(),
            ..slew
        };
        assert!(matches!(bad.render(&data), Err(ToopError::InvalidArgument(_))));
    }

    #[test]
    fn test_render_instr_ratcam() {
        let data = session();
        let instr = Instr {
            config: InstrumentConfig::ratcam("SDSS-R", "clear", 2),
            calibrate_before: false,
            calibrate_after: true,
        };
        assert_eq!(instr.render(&data).unwrap(), "INSTR sid42 RATCAM SDSS-R clear 2 FT");
    }

    #[test]
    fn test_render_instr_em01_without_flags() {
        let data = session();
        let instr = Instr {
            config: InstrumentConfig::from_args("EM01", &["R", "G", "B", "2"]).unwrap(),
            calibrate_before: true,
            calibrate_after: true,
        };
        assert_eq!(instr.render(&data).unwrap(), "INSTR sid42 EM01 R G B 2");
    }

    #[test]
    fn test_render_expose_forms() {
        let data = session();
        let multrun = Expose {
            exposure_length: 30000,
            start: ExposeStart::Count(3),
            data_pipeline: true,
        };
        assert_eq!(multrun.render(&data).unwrap(), "EXPOSE sid42 30000 3 T");

        let date = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(21, 4, 9)
            .unwrap();
        let runat = Expose {
            exposure_length: 1000,
            start: ExposeStart::At(date),
            data_pipeline: false,
        };
        assert_eq!(runat.render(&data).unwrap(), "EXPOSE sid42 1000 2024-03-05T21:04:09 F");
    }

    #[test]
    fn test_render_simple_argument_commands() {
        let data = session();
        assert_eq!(
            Offset { d_ra: 1.0, d_dec: -2.5 }.render(&data).unwrap(),
            "OFFSET sid42 1.0 -2.5"
        );
        assert_eq!(
            Auto { state: AutoguiderState::On }.render(&data).unwrap(),
            "AUTO sid42 ON"
        );
        assert_eq!(
            Rotator { mode: RotatorMode::Float }.render(&data).unwrap(),
            "ROTATOR sid42 FLOAT"
        );
        assert_eq!(
            Rotator { mode: RotatorMode::Mount(45.0) }.render(&data).unwrap(),
            "ROTATOR sid42 MOUNT 45.0"
        );
        assert_eq!(
            AgRadial { position: 12.5 }.render(&data).unwrap(),
            "AGRADIAL sid42 12.5"
        );
        assert_eq!(
            FocalPlane { instrument: "IO:O".to_string() }.render(&data).unwrap(),
            "FOCALPLANE sid42 IO:O"
        );
        assert_eq!(
            Arc { lamp: "Xe".to_string() }.render(&data).unwrap(),
            "ARC sid42 Xe"
        );
        assert_eq!(
            Status { category: "METEO".to_string(), keyword: "humidity".to_string() }
                .render(&data)
                .unwrap(),
            "STATUS METEO humidity"
        );
    }

    #[test]
    fn test_render_acquire() {
        let data = session();
        let acquire = Acquire {
            ra: "10:00:00".parse().unwrap(),
            dec: "+20:00:00".parse().unwrap(),
            mode: AcquireMode::Wcs,
            precision: AcquirePrecision::High,
        };
        assert_eq!(
            acquire.render(&data).unwrap(),
            "ACQUIRE sid42 10:00:00.00 +20:00:00.00 WCS HIGH"
        );
    }

    #[test]
    fn test_extract_helo() {
        let mut data = session();
        let reply = values("OK sessionID=abc, sessionLimit=3600, timeRemaining=1200, priority=1");
        let helo = Helo.extract(&reply, &mut data).unwrap();
        assert_eq!(helo.session_id, "abc");
        assert_eq!(helo.session_limit, 3600);
        assert_eq!(data.session_id().unwrap(), "abc");
        assert_eq!(data.get(keys::TIME_REMAINING), Some("1200"));
        assert_eq!(data.get(keys::PRIORITY), Some("1"));
    }

    #[test]
    fn test_extract_helo_missing_value() {
        let mut data = session();
        let reply = values("OK sessionID=abc, sessionLimit=3600");
        assert!(matches!(Helo.extract(&reply, &mut data), Err(ToopError::Parse(_))));
    }

    #[test]
    fn test_extract_expose() {
        let mut data = session();
        let reply = values(
            "OK file1=a.fits, file2=b.fits, seeing=1.5, counts=2000, photom=0.9, \
             skybright=19.0, xpix=512.5, ypix=480.0",
        );
        let expose = Expose {
            exposure_length: 1000,
            start: ExposeStart::Count(2),
            data_pipeline: true,
        };
        let result = expose.extract(&reply, &mut data).unwrap();
        assert_eq!(result.filenames, vec!["a.fits", "b.fits"]);
        assert_eq!(result.counts, 2000);
        assert_eq!(data.get(keys::EXPOSE_SKY_BRIGHTNESS), Some("19.0"));
        assert_eq!(data.get(keys::EXPOSE_YPIX), Some("480.0"));
    }

    #[test]
    fn test_extract_expose_bad_number() {
        let mut data = session();
        let reply = values("OK seeing=poor, counts=1, photom=1, skybright=1, xpix=1, ypix=1");
        let expose = Expose {
            exposure_length: 1000,
            start: ExposeStart::Count(1),
            data_pipeline: false,
        };
        assert!(matches!(expose.extract(&reply, &mut data), Err(ToopError::Parse(_))));
    }

    #[test]
    fn test_extract_arc_without_files() {
        let mut data = session();
        let reply = values("OK ");
        let arc = Arc { lamp: "W".to_string() };
        assert!(arc.extract(&reply, &mut data).unwrap().is_empty());
    }

    #[test]
    fn test_extract_position_when_status() {
        let mut data = session();

        let reply = values("OK alt=45.5, az=120.0, rise=0, set=3600, moon=80.25, cat=STAR, state=RISEN");
        let position = Position {
            ra: "10:00:00".parse().unwrap(),
            dec: "+20:00:00".parse().unwrap(),
        };
        let result = position.extract(&reply, &mut data).unwrap();
        assert!(result.is_risen());
        assert_eq!(data.get(keys::POSITION_AZIMUTH), Some("120.0"));

        let reply = values("OK Time=600, Current=OtherService");
        let when = When.extract(&reply, &mut data).unwrap();
        assert_eq!(when.time, 600);
        assert_eq!(data.get(keys::WHEN_CURRENT_SERVICE), Some("OtherService"));

        let reply = values("OK humidity=0.45");
        let status = Status {
            category: "METEO".to_string(),
            keyword: "humidity".to_string(),
        };
        let result = status.extract(&reply, &mut data).unwrap();
        assert_eq!(result.value_double().unwrap(), 0.45);
        assert_eq!(data.get(keys::STATUS_VALUE), Some("0.45"));
    }
}
