//! TCP transport: delivers newline-delimited text frames to the sync
//! engine and signals connection loss.

use std::{
    io::{self, BufRead, BufReader},
    net::{Shutdown, TcpStream},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::Duration,
};

use cueclock_lib::sync::SyncEngine;
use log::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// One connection to the remote source, with a reader thread feeding
/// the engine.
pub struct Transport {
    engine: Arc<Mutex<SyncEngine>>,
    host: String,
    port: u16,
    closing: Arc<AtomicBool>,
    stream: Option<TcpStream>,
    reader_handle: Option<JoinHandle<()>>,
}

impl Transport {
    pub fn new(engine: Arc<Mutex<SyncEngine>>, host: &str, port: u16) -> Self {
        Self {
            engine,
            host: host.to_string(),
            port,
            closing: Arc::new(AtomicBool::new(false)),
            stream: None,
            reader_handle: None,
        }
    }

    /// Establish the connection and start the reader thread.
    ///
    /// # Errors
    /// Returns an error when the remote source is unreachable.
    pub fn connect(&mut self) -> io::Result<()> {
        self.disconnect();

        let address = format!("{}:{}", self.host, self.port);
        let socket_addr = address
            .parse()
            .or_else(|_| {
                use std::net::ToSocketAddrs;
                address
                    .to_socket_addrs()?
                    .next()
                    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address resolved"))
            })?;
        let stream = TcpStream::connect_timeout(&socket_addr, CONNECT_TIMEOUT)?;
        info!("connected to {}", address);

        self.closing.store(false, Ordering::Relaxed);
        let closing = self.closing.clone();
        let engine = self.engine.clone();
        let reader_stream = stream.try_clone()?;
        self.stream = Some(stream);

        let handle = std::thread::spawn(move || {
            let mut reader = BufReader::new(reader_stream);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => engine.lock().unwrap().handle_frame(&line),
                }
            }
            if !closing.load(Ordering::Relaxed) {
                engine.lock().unwrap().handle_transport_lost();
            }
        });
        self.reader_handle = Some(handle);

        Ok(())
    }

    /// Close the connection and join the reader thread. A no-op when
    /// not connected.
    pub fn disconnect(&mut self) {
        self.closing.store(true, Ordering::Relaxed);
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                warn!("socket shutdown failed: {}", err);
            }
        }
        if let Some(handle) = self.reader_handle.take() {
            if handle.join().is_err() {
                warn!("reader thread panicked during join");
            }
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueclock_lib::settings::ClientSettings;
    use cueclock_lib::sync::SyncState;
    use cueclock_lib::{clock::DisplayFields, display::DisplaySink, snapshot::Snapshot};
    use std::io::Write;
    use std::net::TcpListener;

    struct NullSink;

    impl DisplaySink for NullSink {
        fn set_clock(&mut self, _fields: &DisplayFields) {}
        fn set_progress(&mut self, _current_ms: i64, _duration_ms: i64) {}
        fn set_cue(&mut self, _snapshot: &Snapshot) {}
    }

    fn engine() -> Arc<Mutex<SyncEngine>> {
        Arc::new(Mutex::new(SyncEngine::new(
            Arc::new(Mutex::new(NullSink)),
            || {},
            &ClientSettings::default(),
        )))
    }

    fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not reached in time");
    }

    #[test]
    fn delivers_frames_to_the_engine() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().expect("accept");
            socket
                .write_all(b"3,2,1500,60000,0,25,100,0\n")
                .expect("write");
            socket.flush().expect("flush");
            // Hold the socket open until the client has read the frame.
            std::thread::sleep(Duration::from_millis(200));
        });

        let engine = engine();
        let mut transport = Transport::new(engine.clone(), "127.0.0.1", port);
        transport.connect().expect("connect");

        wait_for(|| engine.lock().unwrap().state() == SyncState::Paused);
        assert_eq!(engine.lock().unwrap().timecode_ms(), 1500);

        transport.disconnect();
        // A deliberate disconnect is not a transport failure.
        assert_eq!(engine.lock().unwrap().state(), SyncState::Paused);
        server.join().expect("server thread");
    }

    #[test]
    fn remote_hangup_signals_transport_loss() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (socket, _) = listener.accept().expect("accept");
            drop(socket);
        });

        let engine = engine();
        let mut transport = Transport::new(engine.clone(), "127.0.0.1", port);
        transport.connect().expect("connect");

        wait_for(|| engine.lock().unwrap().state() == SyncState::ReloadPending);
        server.join().expect("server thread");
    }

    #[test]
    fn unreachable_host_is_an_error() {
        let engine = engine();
        // Reserved TEST-NET address; nothing listens there.
        let mut transport = Transport::new(engine, "192.0.2.1", 1);
        assert!(transport.connect().is_err());
    }
}
