//! Connection management for talking to a TOCS

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use log::debug;
use toopproto::{ToopError, ToopResult};

/// One request/reply round trip with a TOCS
pub trait Connection {
    /// Send `line` to `host:port` and return the single reply line, without
    /// its terminator
    fn exchange(&mut self, host: &str, port: u16, line: &str) -> ToopResult<String>;
}

/// Socket timeouts applied to each exchange; `None` keeps the OS default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }
}

/// TCP connection opened afresh for every exchange
#[derive(Debug, Clone, Default)]
pub struct TcpConnection {
    config: ConnectionConfig,
}

impl TcpConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn connect(&self, host: &str, port: u16) -> ToopResult<TcpStream> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| transport_error(host, port, "resolve", e))?
            .collect();

        let mut last_error = None;
        for addr in &addrs {
            let result = match self.config.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(addr, timeout),
                None => TcpStream::connect(addr),
            };
            match result {
                Ok(stream) => {
                    debug!("Connected to {} ({}:{})", addr, host, port);
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => transport_error(host, port, "connect", e),
            None => ToopError::Transport(format!("{}:{} did not resolve to any address", host, port)),
        })
    }
}

impl Connection for TcpConnection {
    fn exchange(&mut self, host: &str, port: u16, line: &str) -> ToopResult<String> {
        let mut stream = self.connect(host, port)?;
        stream
            .set_read_timeout(self.config.read_timeout)
            .map_err(|e| transport_error(host, port, "configure", e))?;
        stream
            .set_write_timeout(self.config.write_timeout)
            .map_err(|e| transport_error(host, port, "configure", e))?;

        debug!("Sending to {}:{}: {}", host, port, line);
        stream
            .write_all(format!("{}\n", line).as_bytes())
            .and_then(|_| stream.flush())
            .map_err(|e| transport_error(host, port, "write", e))?;

        let mut reply = String::new();
        {
            let mut reader = BufReader::new(&stream);
            reader
                .read_line(&mut reply)
                .map_err(|e| transport_error(host, port, "read", e))?;
        }
        let reply = reply.trim_end_matches(['\r', '\n']).to_string();
        debug!("Reply from {}:{}: {}", host, port, reply);

        // The TOCS may already have closed its end
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            debug!("Shutdown of {}:{} failed: {}", host, port, e);
        }

        Ok(reply)
    }
}

fn transport_error(host: &str, port: u16, action: &str, e: std::io::Error) -> ToopError {
    ToopError::Transport(format!("{} {}:{} failed: {}", action, host, port, e))
}
