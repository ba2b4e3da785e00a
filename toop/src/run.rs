//! Execution of parsed toop command lines

use log::{error, info, warn};
use tooplib::{
    load_config, Connection, InstrumentConfig, SessionData, TcpConnection, TocSession, ToopResult,
};
use crate::args::{CliArgs, CliCommand, CliError, ObservationSequence};

/// Load session data and configuration, run the command and save the session
/// data back, whether or not the command succeeded
pub fn run(args: &CliArgs) -> Result<(), CliError> {
    let mut data = SessionData::load(&args.session_data)?;

    let connection = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            config.apply_to(&mut data);
            TcpConnection::new(config.connection_config())
        }
        None => TcpConnection::default(),
    };

    let mut session = TocSession::new(connection, data);
    let result = run_command(&mut session, &args.command);

    session.save_session_data(args.output_path())?;
    result.map_err(CliError::from)
}

/// Run one command, printing what it returned
pub fn run_command<C: Connection>(session: &mut TocSession<C>, command: &CliCommand) -> ToopResult<()> {
    match command {
        CliCommand::Helo => {
            let reply = session.helo()?;
            println!("session id: {}", reply.session_id);
            println!("session limit: {}s", reply.session_limit);
            println!("time remaining: {}s", reply.time_remaining);
            println!("priority: {}", reply.priority);
        }
        CliCommand::Init => session.init()?,
        CliCommand::When => {
            let reply = session.when()?;
            println!("time: {}s", reply.time);
            println!("current service: {}", reply.current_service);
        }
        CliCommand::Stop => session.stop()?,
        CliCommand::Quit => session.quit()?,
        CliCommand::Position(position) => {
            let reply = session.run(position)?;
            println!("altitude: {}", reply.altitude);
            println!("azimuth: {}", reply.azimuth);
            println!("time to rise: {}s", reply.time_to_rise);
            println!("time to set: {}s", reply.time_to_set);
            println!("moon distance: {}", reply.moon_distance);
            println!("category: {}", reply.category);
            println!("state: {}", reply.state);
        }
        CliCommand::Status(status) => {
            let reply = session.run(status)?;
            println!("{}: {}", reply.keyword, reply.value);
        }
        CliCommand::Expose(expose) => {
            let reply = session.run(expose)?;
            for filename in &reply.filenames {
                println!("{}", filename);
            }
            println!("seeing: {}", reply.seeing);
            println!("counts: {}", reply.counts);
            println!("photometric: {}", reply.photometric);
            println!("sky brightness: {}", reply.sky_brightness);
            println!("x pix: {}", reply.x_pix);
            println!("y pix: {}", reply.y_pix);
        }
        CliCommand::Arc(arc) => {
            for filename in session.arc(&arc.lamp)? {
                println!("{}", filename);
            }
        }
        CliCommand::Slew(slew) => session.run(slew)?,
        CliCommand::Offset(offset) => session.run(offset)?,
        CliCommand::Auto(auto) => session.run(auto)?,
        CliCommand::Rotator(rotator) => session.run(rotator)?,
        CliCommand::AgRadial(ag_radial) => session.run(ag_radial)?,
        CliCommand::Acquire(acquire) => session.run(acquire)?,
        CliCommand::FocalPlane(focal_plane) => session.run(focal_plane)?,
        CliCommand::Instr(instr) => session.run(instr)?,
        CliCommand::Sequence(sequence) => run_sequence(session, sequence)?,
    }
    Ok(())
}

/// HELO, INIT, SLEW, INSTR, EXPOSE, then QUIT however far the rest got
pub fn run_sequence<C: Connection>(
    session: &mut TocSession<C>,
    sequence: &ObservationSequence,
) -> ToopResult<()> {
    info!("Starting observation of {}", sequence.source_id);
    let result = observe(session, sequence);
    if let Err(e) = &result {
        error!("Observation of {} failed: {}", sequence.source_id, e);
    }

    if let Err(e) = session.quit() {
        warn!("QUIT after observation failed: {}", e);
        if result.is_ok() {
            return Err(e);
        }
    }
    result
}

fn observe<C: Connection>(session: &mut TocSession<C>, sequence: &ObservationSequence) -> ToopResult<()> {
    session.helo()?;
    session.init()?;
    session.slew(&sequence.source_id, sequence.ra, sequence.dec)?;
    let config = InstrumentConfig::ratcam(
        sequence.lower_filter.clone(),
        sequence.upper_filter.clone(),
        sequence.bin,
    );
    session.instr(config, false, false)?;
    let reply = session.expose(sequence.exposure_length, sequence.exposure_count, true)?;
    for filename in &reply.filenames {
        println!("{}", filename);
    }
    Ok(())
}
