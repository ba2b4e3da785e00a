//! High-level session interface
//!
//! Provides one method per TOC command on top of a connection and the
//! session data it reads and updates.

use std::path::Path;
use chrono::NaiveDateTime;
use log::info;
use toopproto::{
    Acquire, AcquireMode, AcquirePrecision, AgRadial, Arc, Auto, AutoguiderState, Dec, Expose,
    ExposeReply, ExposeStart, FocalPlane, Helo, HeloReply, Init, Instr, InstrumentConfig, Offset,
    Position, PositionReply, Quit, Ra, Rotator, RotatorMode, SessionData, Slew, Status,
    StatusReply, Stop, TocCommand, ToopResult, When, WhenReply,
};
use crate::client::execute;
use crate::connection::Connection;

/// A conversation with one TOCS
///
/// Commands run one at a time in call order. Nothing enforces the protocol
/// convention of HELO first and QUIT last.
pub struct TocSession<C: Connection> {
    connection: C,
    data: SessionData,
    expose_filenames: Vec<String>,
    arc_filenames: Vec<String>,
}

impl<C: Connection> TocSession<C> {
    pub fn new(connection: C, data: SessionData) -> Self {
        Self {
            connection,
            data,
            expose_filenames: Vec::new(),
            arc_filenames: Vec::new(),
        }
    }

    /// Replace the session data with the contents of a properties file
    pub fn load_session_data<P: AsRef<Path>>(&mut self, path: P) -> ToopResult<()> {
        self.data = SessionData::load(path)?;
        Ok(())
    }

    pub fn save_session_data<P: AsRef<Path>>(&self, path: P) -> ToopResult<()> {
        self.data.save(path)
    }

    pub fn session_data(&self) -> &SessionData {
        &self.data
    }

    pub fn session_data_mut(&mut self) -> &mut SessionData {
        &mut self.data
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn into_parts(self) -> (C, SessionData) {
        (self.connection, self.data)
    }

    /// Filenames reported by the most recent successful EXPOSE
    pub fn expose_filenames(&self) -> &[String] {
        &self.expose_filenames
    }

    /// Filenames reported by the most recent successful ARC
    pub fn arc_filenames(&self) -> &[String] {
        &self.arc_filenames
    }

    /// Run any command, failing with `ToopError::Command`
    pub fn run<K: TocCommand>(&mut self, command: &K) -> ToopResult<K::Output> {
        execute(&mut self.connection, &mut self.data, command).into_result(K::NAME)
    }

    pub fn helo(&mut self) -> ToopResult<HeloReply> {
        let reply = self.run(&Helo)?;
        info!("Session {} opened, {}s remaining", reply.session_id, reply.time_remaining);
        Ok(reply)
    }

    pub fn init(&mut self) -> ToopResult<()> {
        self.run(&Init)
    }

    pub fn when(&mut self) -> ToopResult<WhenReply> {
        self.run(&When)
    }

    pub fn position(&mut self, ra: Ra, dec: Dec) -> ToopResult<PositionReply> {
        self.run(&Position { ra, dec })
    }

    pub fn status(&mut self, category: &str, keyword: &str) -> ToopResult<StatusReply> {
        self.run(&Status {
            category: category.to_string(),
            keyword: keyword.to_string(),
        })
    }

    pub fn slew(&mut self, source_id: &str, ra: Ra, dec: Dec) -> ToopResult<()> {
        self.run(&Slew {
            source_id: source_id.to_string(),
            ra,
            dec,
        })
    }

    /// Offset the pointing by arcseconds in RA and Dec
    pub fn offset(&mut self, d_ra: f64, d_dec: f64) -> ToopResult<()> {
        self.run(&Offset { d_ra, d_dec })
    }

    pub fn auto(&mut self, state: AutoguiderState) -> ToopResult<()> {
        self.run(&Auto { state })
    }

    pub fn rotator(&mut self, mode: RotatorMode) -> ToopResult<()> {
        self.run(&Rotator { mode })
    }

    pub fn ag_radial(&mut self, position: f64) -> ToopResult<()> {
        self.run(&AgRadial { position })
    }

    pub fn acquire(
        &mut self,
        ra: Ra,
        dec: Dec,
        mode: AcquireMode,
        precision: AcquirePrecision,
    ) -> ToopResult<()> {
        self.run(&Acquire {
            ra,
            dec,
            mode,
            precision,
        })
    }

    pub fn focal_plane(&mut self, instrument: &str) -> ToopResult<()> {
        self.run(&FocalPlane {
            instrument: instrument.to_string(),
        })
    }

    pub fn instr(
        &mut self,
        config: InstrumentConfig,
        calibrate_before: bool,
        calibrate_after: bool,
    ) -> ToopResult<()> {
        self.run(&Instr {
            config,
            calibrate_before,
            calibrate_after,
        })
    }

    /// Take `count` exposures of `exposure_length` milliseconds
    pub fn expose(
        &mut self,
        exposure_length: i32,
        count: i32,
        data_pipeline: bool,
    ) -> ToopResult<ExposeReply> {
        self.run_expose(Expose {
            exposure_length,
            start: ExposeStart::Count(count),
            data_pipeline,
        })
    }

    /// Take one exposure starting at `start`
    pub fn expose_at(
        &mut self,
        exposure_length: i32,
        start: NaiveDateTime,
        data_pipeline: bool,
    ) -> ToopResult<ExposeReply> {
        self.run_expose(Expose {
            exposure_length,
            start: ExposeStart::At(start),
            data_pipeline,
        })
    }

    fn run_expose(&mut self, expose: Expose) -> ToopResult<ExposeReply> {
        let reply = self.run(&expose)?;
        info!("EXPOSE produced {} files", reply.filenames.len());
        self.expose_filenames = reply.filenames.clone();
        Ok(reply)
    }

    pub fn arc(&mut self, lamp: &str) -> ToopResult<Vec<String>> {
        let filenames = self.run(&Arc {
            lamp: lamp.to_string(),
        })?;
        self.arc_filenames = filenames.clone();
        Ok(filenames)
    }

    pub fn stop(&mut self) -> ToopResult<()> {
        self.run(&Stop)
    }

    pub fn quit(&mut self) -> ToopResult<()> {
        self.run(&Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use toopproto::{keys, FailureKind, ToopError};
    use crate::client::tests::{session_data, ScriptedConnection};

    #[test]
    fn test_observation_sequence() {
        let connection = ScriptedConnection::new(&[
            "OK sessionID=s-77, sessionLimit=1800, timeRemaining=1700, priority=0",
            "OK ",
            "OK ",
            "OK ",
            "OK file1=c_e_1.fits, file2=c_e_2.fits, seeing=1.2, counts=100, photom=1.0, \
             skybright=20.5, xpix=1024.0, ypix=1024.0",
            "OK ",
        ]);
        let mut data = session_data();
        data.set_init_rotator_option("SKY");
        data.set_init_focus_option("DEFAULT");
        data.set_init_ag_option("OFF");
        let mut session = TocSession::new(connection, data);

        session.helo().unwrap();
        session.init().unwrap();
        session
            .slew("GRB1", "12:00:00".parse().unwrap(), "+30:00:00".parse().unwrap())
            .unwrap();
        session
            .instr(InstrumentConfig::ratcam("SDSS-R", "clear", 2), false, true)
            .unwrap();
        let reply = session.expose(30000, 2, true).unwrap();
        session.quit().unwrap();

        assert_eq!(reply.filenames.len(), 2);
        assert_eq!(session.expose_filenames(), ["c_e_1.fits", "c_e_2.fits"]);
        assert_eq!(session.session_data().get(keys::EXPOSE_COUNTS), Some("100"));
        assert_eq!(
            session.connection().sent_lines(),
            vec![
                "HELO TestService",
                "INIT s-77 SKY DEFAULT OFF",
                "SLEW s-77 GRB1 12:00:00.00 +30:00:00.00",
                "INSTR s-77 RATCAM SDSS-R clear 2 FT",
                "EXPOSE s-77 30000 2 T",
                "QUIT s-77",
            ]
        );
    }

    #[test]
    fn test_failure_carries_command_name() {
        let connection =
            ScriptedConnection::new(&["ERROR ABORTED Code=607001, message=Overridden"]);
        let mut session = TocSession::new(connection, session_data());

        let err = session.slew("T", "01:00:00".parse().unwrap(), "+01:00:00".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, ToopError::Command { ref command, .. } if command == "SLEW"));
        let failure = err.command_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Protocol);
        assert_eq!(failure.code.as_deref(), Some("ABORTED"));
        assert!(err.to_string().starts_with("SLEW failed:ABORTED:Code=607001"));
    }

    #[test]
    fn test_failed_expose_keeps_previous_filenames() {
        let connection = ScriptedConnection::new(&[
            "OK file1=arc_1.fits",
            "ERROR FAILED shutter stuck",
        ]);
        let mut session = TocSession::new(connection, session_data());

        assert_eq!(session.arc("Xe").unwrap(), vec!["arc_1.fits"]);
        assert!(session.expose(1000, 1, false).is_err());
        assert_eq!(session.arc_filenames(), ["arc_1.fits"]);
        assert!(session.expose_filenames().is_empty());
    }

    #[test]
    fn test_out_of_order_commands_are_not_blocked() {
        let connection = ScriptedConnection::new(&["OK "]);
        let mut session = TocSession::new(connection, session_data());
        session.stop().unwrap();
        assert_eq!(session.connection().sent_lines(), vec!["STOP sid42"]);
    }

    #[test]
    fn test_session_data_roundtrip_through_file() {
        let connection = ScriptedConnection::new(&["OK Time=120, Current=Other"]);
        let mut session = TocSession::new(connection, session_data());
        let when = session.when().unwrap();
        assert_eq!(when.time, 120);

        let temp_file = NamedTempFile::new().unwrap();
        session.save_session_data(temp_file.path()).unwrap();

        let mut other = TocSession::new(ScriptedConnection::default(), SessionData::new());
        other.load_session_data(temp_file.path()).unwrap();
        assert_eq!(other.session_data().get(keys::WHEN_TIME), Some("120"));
        assert_eq!(other.session_data().session_id().unwrap(), "sid42");
    }
}
