//! Command line parsing for the toop tool

use std::path::PathBuf;
use chrono::NaiveDateTime;
use thiserror::Error;
use tooplib::{
    parse_flag, Acquire, AcquireMode, AcquirePrecision, AgRadial, Arc, Auto, AutoguiderState,
    CommandType, Dec, Expose, ExposeStart, FocalPlane, Instr, InstrumentConfig, Offset, Position,
    Ra, Rotator, RotatorMode, Slew, Status, ToopError, RUNAT_DATE_FORMAT,
};

pub const USAGE: &str = "\
usage: toop [--config FILE] [--output FILE] <session-data-file> <COMMAND> [ARGS...]

commands:
  HELO
  INIT
  WHEN
  STOP
  QUIT
  SLEW <source> <ra> <dec>
  POSITION <ra> <dec>
  STATUS <category> <keyword>
  OFFSET <d-ra-arcsec> <d-dec-arcsec>
  AUTO ON|OFF
  ROTATOR SKY|FLOAT|MOUNT <angle>
  AGRADIAL <position-mm>
  ACQUIRE <ra> <dec> NONE|BRIGHTEST|WCS NORMAL|HIGH
  FOCALPLANE <instrument>
  INSTR <instrument> [INSTRUMENT-ARGS...] <before T|F> <after T|F>
  EXPOSE <length-ms> <count>|<yyyy-MM-ddTHH:mm:ss> <pipeline T|F>
  ARC <lamp>
  sequence <source> <ra> <dec> <lower> <upper> <bin> <length-ms> <count>";

/// Command line errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Toop(#[from] ToopError),
}

impl CliError {
    fn usage(msg: impl Into<String>) -> Self {
        CliError::Usage(msg.into())
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Toop(_) => 1,
        }
    }
}

/// The scripted observation run by `sequence`
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSequence {
    pub source_id: String,
    pub ra: Ra,
    pub dec: Dec,
    pub lower_filter: String,
    pub upper_filter: String,
    pub bin: i32,
    /// Milliseconds
    pub exposure_length: i32,
    pub exposure_count: i32,
}

/// One thing the tool has been asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Helo,
    Init,
    When,
    Stop,
    Quit,
    Slew(Slew),
    Position(Position),
    Status(Status),
    Offset(Offset),
    Auto(Auto),
    Rotator(Rotator),
    AgRadial(AgRadial),
    Acquire(Acquire),
    FocalPlane(FocalPlane),
    Instr(Instr),
    Expose(Expose),
    Arc(Arc),
    Sequence(ObservationSequence),
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub session_data: PathBuf,
    pub command: CliCommand,
}

impl CliArgs {
    /// Where the session data is written back to
    pub fn output_path(&self) -> &PathBuf {
        self.output.as_ref().unwrap_or(&self.session_data)
    }
}

/// Parse the arguments that follow the program name
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<CliArgs, CliError> {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    let mut config = None;
    let mut output = None;
    let mut rest = args.as_slice();

    loop {
        match rest {
            ["--config", path, tail @ ..] => {
                config = Some(PathBuf::from(*path));
                rest = tail;
            }
            ["--output", path, tail @ ..] => {
                output = Some(PathBuf::from(*path));
                rest = tail;
            }
            ["--config"] | ["--output"] => {
                return Err(CliError::usage(format!("{} needs a file argument", rest[0])));
            }
            ["-h" | "--help", ..] => return Err(CliError::usage(USAGE)),
            _ => break,
        }
    }

    let (session_data, name, command_args) = match rest {
        [session_data, name, command_args @ ..] => (session_data, name, command_args),
        _ => return Err(CliError::usage(USAGE)),
    };

    let command = parse_command(name, command_args).map_err(|e| match e {
        CliError::Toop(e) => CliError::usage(format!("{}: {}", name, e)),
        usage => usage,
    })?;

    Ok(CliArgs {
        config,
        output,
        session_data: PathBuf::from(*session_data),
        command,
    })
}

fn expect_args(name: &str, args: &[&str], count: usize) -> Result<(), CliError> {
    if args.len() != count {
        return Err(CliError::usage(format!(
            "{} takes {} arguments, got {}",
            name,
            count,
            args.len()
        )));
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(s: &str, what: &str) -> Result<T, CliError> {
    s.parse::<T>()
        .map_err(|_| CliError::usage(format!("{} is not a valid {}", s, what)))
}

fn parse_command(name: &str, args: &[&str]) -> Result<CliCommand, CliError> {
    if name.eq_ignore_ascii_case("sequence") {
        expect_args(name, args, 8)?;
        return Ok(CliCommand::Sequence(ObservationSequence {
            source_id: args[0].to_string(),
            ra: args[1].parse()?,
            dec: args[2].parse()?,
            lower_filter: args[3].to_string(),
            upper_filter: args[4].to_string(),
            bin: parse_number(args[5], "bin")?,
            exposure_length: parse_number(args[6], "exposure length")?,
            exposure_count: parse_number(args[7], "exposure count")?,
        }));
    }

    let command_type: CommandType = name.parse()?;
    let command = match command_type {
        CommandType::Helo => {
            expect_args(name, args, 0)?;
            CliCommand::Helo
        }
        CommandType::Init => {
            expect_args(name, args, 0)?;
            CliCommand::Init
        }
        CommandType::When => {
            expect_args(name, args, 0)?;
            CliCommand::When
        }
        CommandType::Stop => {
            expect_args(name, args, 0)?;
            CliCommand::Stop
        }
        CommandType::Quit => {
            expect_args(name, args, 0)?;
            CliCommand::Quit
        }
        CommandType::Slew => {
            expect_args(name, args, 3)?;
            CliCommand::Slew(Slew {
                source_id: args[0].to_string(),
                ra: args[1].parse()?,
                dec: args[2].parse()?,
            })
        }
        CommandType::Position => {
            expect_args(name, args, 2)?;
            CliCommand::Position(Position {
                ra: args[0].parse()?,
                dec: args[1].parse()?,
            })
        }
        CommandType::Status => {
            expect_args(name, args, 2)?;
            CliCommand::Status(Status {
                category: args[0].to_string(),
                keyword: args[1].to_string(),
            })
        }
        CommandType::Offset => {
            expect_args(name, args, 2)?;
            CliCommand::Offset(Offset {
                d_ra: parse_number(args[0], "RA offset")?,
                d_dec: parse_number(args[1], "Dec offset")?,
            })
        }
        CommandType::Auto => {
            expect_args(name, args, 1)?;
            let state = match args[0].to_ascii_uppercase().as_str() {
                "ON" => AutoguiderState::On,
                "OFF" => AutoguiderState::Off,
                other => return Err(CliError::usage(format!("AUTO takes ON or OFF, not {}", other))),
            };
            CliCommand::Auto(Auto { state })
        }
        CommandType::Rotator => {
            let mode = match args {
                [mode] if mode.eq_ignore_ascii_case("SKY") => RotatorMode::Sky,
                [mode] if mode.eq_ignore_ascii_case("FLOAT") => RotatorMode::Float,
                [mode, angle] if mode.eq_ignore_ascii_case("MOUNT") => {
                    RotatorMode::Mount(parse_number(angle, "mount angle")?)
                }
                _ => return Err(CliError::usage("ROTATOR takes SKY, FLOAT or MOUNT <angle>")),
            };
            CliCommand::Rotator(Rotator { mode })
        }
        CommandType::AgRadial => {
            expect_args(name, args, 1)?;
            CliCommand::AgRadial(AgRadial {
                position: parse_number(args[0], "position")?,
            })
        }
        CommandType::Acquire => {
            expect_args(name, args, 4)?;
            CliCommand::Acquire(Acquire {
                ra: args[0].parse()?,
                dec: args[1].parse()?,
                mode: args[2].parse::<AcquireMode>()?,
                precision: args[3].parse::<AcquirePrecision>()?,
            })
        }
        CommandType::FocalPlane => {
            expect_args(name, args, 1)?;
            CliCommand::FocalPlane(FocalPlane {
                instrument: args[0].to_string(),
            })
        }
        CommandType::Instr => {
            let (inst_id, inst_args, before, after) = match args {
                [inst_id, inst_args @ .., before, after] => (inst_id, inst_args, before, after),
                _ => {
                    return Err(CliError::usage(
                        "INSTR takes <instrument> [INSTRUMENT-ARGS...] <before> <after>",
                    ))
                }
            };
            CliCommand::Instr(Instr {
                config: InstrumentConfig::from_args(inst_id, inst_args)?,
                calibrate_before: parse_flag(before)?,
                calibrate_after: parse_flag(after)?,
            })
        }
        CommandType::Expose => {
            expect_args(name, args, 3)?;
            let start = match args[1].parse::<i32>() {
                Ok(count) => ExposeStart::Count(count),
                Err(_) => ExposeStart::At(
                    NaiveDateTime::parse_from_str(args[1], RUNAT_DATE_FORMAT).map_err(|_| {
                        CliError::usage(format!("{} is neither a count nor a start time", args[1]))
                    })?,
                ),
            };
            CliCommand::Expose(Expose {
                exposure_length: parse_number(args[0], "exposure length")?,
                start,
                data_pipeline: parse_flag(args[2])?,
            })
        }
        CommandType::Arc => {
            expect_args(name, args, 1)?;
            CliCommand::Arc(Arc {
                lamp: args[0].to_string(),
            })
        }
    };
    Ok(command)
}
