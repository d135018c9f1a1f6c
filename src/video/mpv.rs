// =============================================================================
// MPV PLAYER - LOOPS THE COMPOSITE FILE, SEEKS ON REQUEST
// =============================================================================
//
// mpv plays the whole composite file on an endless loop. We only ever send it
// absolute seeks over its JSON IPC socket:
//
//   -> {"command":["seek",5.4,"absolute"],"request_id":3}
//   <- {"event":"seek"}                              (async events, skipped)
//   <- {"request_id":3,"error":"success","data":null}
//
// =============================================================================

use serde::Deserialize;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::core::{PlaybackError, PlayerConfig};
use crate::playback::PlaybackPort;

#[derive(Debug, Deserialize)]
struct IpcReply {
    request_id: Option<u64>,
    error: Option<String>,
    event: Option<String>,
}

/// Request/reply framing over an mpv IPC connection.
pub struct MpvIpc {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
    // Holds a reply line cut short by a read timeout until the rest arrives
    partial: Vec<u8>,
    next_request: u64,
    timeout_ms: u64,
}

impl MpvIpc {
    pub fn new(stream: UnixStream, timeout: Duration) -> Result<Self, PlaybackError> {
        stream.set_read_timeout(Some(timeout))?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            partial: Vec::new(),
            next_request: 1,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    pub fn command(&mut self, args: serde_json::Value) -> Result<(), PlaybackError> {
        let request_id = self.next_request;
        self.next_request += 1;

        let mut line = serde_json::to_string(&serde_json::json!({
            "command": args,
            "request_id": request_id,
        }))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        loop {
            let line = self.read_reply_line()?;
            let reply: IpcReply = serde_json::from_slice(&line)?;
            if let Some(event) = &reply.event {
                log::debug!("mpv event: {}", event);
                continue;
            }
            if reply.request_id != Some(request_id) {
                log::debug!("Skipping mpv reply for request {:?}", reply.request_id);
                continue;
            }
            return match reply.error.as_deref() {
                Some("success") => Ok(()),
                Some(error) => Err(PlaybackError::Rejected(error.to_string())),
                None => Err(PlaybackError::Rejected("reply without status".to_string())),
            };
        }
    }

    fn read_reply_line(&mut self) -> Result<Vec<u8>, PlaybackError> {
        self.reader.read_until(b'\n', &mut self.partial).map_err(|e| match e.kind() {
            ErrorKind::WouldBlock | ErrorKind::TimedOut => PlaybackError::Timeout(self.timeout_ms),
            _ => PlaybackError::Io(e),
        })?;
        // Anything short of a full line here means mpv closed the socket
        if !self.partial.ends_with(b"\n") {
            return Err(PlaybackError::NotRunning);
        }
        Ok(std::mem::take(&mut self.partial))
    }
}

pub struct MpvPlayer {
    process: Option<Child>,
    ipc: MpvIpc,
}

impl MpvPlayer {
    pub fn launch(config: &PlayerConfig, media_path: &Path) -> anyhow::Result<Self> {
        // A socket left over from a previous run would make us connect too early
        if config.ipc_socket.exists() {
            std::fs::remove_file(&config.ipc_socket)?;
        }

        let mut cmd = Command::new(&config.program);
        cmd.arg("--loop-file=inf")
            .arg("--no-terminal")
            .arg(format!("--input-ipc-server={}", config.ipc_socket.display()))
            .args(&config.extra_args)
            .arg(media_path)
            .stdin(Stdio::null());

        log::info!("Starting {} for {}", config.program.display(), media_path.display());
        let mut process = cmd.spawn()
            .map_err(|e| anyhow::anyhow!("Failed to start {}: {}", config.program.display(), e))?;

        let stream = match Self::connect(&config.ipc_socket, Duration::from_millis(config.startup_timeout_ms)) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = process.kill();
                let _ = process.wait();
                return Err(e);
            }
        };
        let ipc = MpvIpc::new(stream, Duration::from_millis(config.ipc_timeout_ms))?;
        log::info!("Connected to mpv at {}", config.ipc_socket.display());

        Ok(Self {
            process: Some(process),
            ipc,
        })
    }

    /// Wraps an already connected IPC session without owning a process.
    pub fn attach(ipc: MpvIpc) -> Self {
        Self { process: None, ipc }
    }

    fn connect(socket: &Path, timeout: Duration) -> anyhow::Result<UnixStream> {
        let started = Instant::now();
        loop {
            match UnixStream::connect(socket) {
                Ok(stream) => return Ok(stream),
                Err(e) if started.elapsed() >= timeout => {
                    return Err(anyhow::anyhow!(
                        "mpv IPC socket {} not ready after {:?}: {}",
                        socket.display(),
                        timeout,
                        e
                    ));
                }
                Err(_) => thread::sleep(Duration::from_millis(100)),
            }
        }
    }

    pub fn is_running(&mut self) -> bool {
        match self.process.as_mut() {
            Some(process) => matches!(process.try_wait(), Ok(None)),
            None => true,
        }
    }
}

impl PlaybackPort for MpvPlayer {
    fn seek(&mut self, offset_secs: f64) -> Result<(), PlaybackError> {
        if !self.is_running() {
            return Err(PlaybackError::NotRunning);
        }
        self.ipc.command(serde_json::json!(["seek", offset_secs, "absolute"]))
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plays the mpv side of the socket: answers each request with `replies`.
    fn fake_mpv(stream: UnixStream, replies: Vec<Vec<String>>) -> thread::JoinHandle<Vec<serde_json::Value>> {
        thread::spawn(move || {
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            let mut requests = Vec::new();
            for reply_lines in replies {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                requests.push(serde_json::from_str(line.trim()).unwrap());
                for reply in reply_lines {
                    writer.write_all(reply.as_bytes()).unwrap();
                    writer.write_all(b"\n").unwrap();
                }
            }
            requests
        })
    }

    #[test]
    fn test_seek_sends_absolute_seek() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let server = fake_mpv(
            theirs,
            vec![vec![
                r#"{"event":"seek"}"#.to_string(),
                r#"{"request_id":1,"error":"success","data":null}"#.to_string(),
            ]],
        );

        let mut player = MpvPlayer::attach(MpvIpc::new(ours, Duration::from_secs(2)).unwrap());
        player.seek(5.4).unwrap();

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["command"], serde_json::json!(["seek", 5.4, "absolute"]));
        assert_eq!(requests[0]["request_id"], 1);
    }

    #[test]
    fn test_rejected_command_is_reported() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let server = fake_mpv(
            theirs,
            vec![vec![r#"{"request_id":1,"error":"property unavailable"}"#.to_string()]],
        );

        let mut player = MpvPlayer::attach(MpvIpc::new(ours, Duration::from_secs(2)).unwrap());
        match player.seek(1.0) {
            Err(PlaybackError::Rejected(message)) => assert_eq!(message, "property unavailable"),
            other => panic!("Unexpected result: {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_stale_replies_are_skipped() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let server = fake_mpv(
            theirs,
            vec![
                vec![r#"{"request_id":1,"error":"success"}"#.to_string()],
                vec![
                    r#"{"request_id":1,"error":"success"}"#.to_string(),
                    r#"{"request_id":2,"error":"success"}"#.to_string(),
                ],
            ],
        );

        let mut ipc = MpvIpc::new(ours, Duration::from_secs(2)).unwrap();
        ipc.command(serde_json::json!(["seek", 0.4, "absolute"])).unwrap();
        ipc.command(serde_json::json!(["seek", 8.4, "absolute"])).unwrap();

        let requests = server.join().unwrap();
        assert_eq!(requests[1]["request_id"], 2);
    }

    #[test]
    fn test_closed_socket_means_not_running() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let server = fake_mpv(theirs, vec![vec![]]);

        let mut ipc = MpvIpc::new(ours, Duration::from_secs(2)).unwrap();
        let result = ipc.command(serde_json::json!(["seek", 0.4, "absolute"]));
        server.join().unwrap();

        assert!(matches!(result, Err(PlaybackError::NotRunning)));
    }

    #[test]
    fn test_silent_player_times_out() {
        let (ours, _theirs) = UnixStream::pair().unwrap();
        let mut ipc = MpvIpc::new(ours, Duration::from_millis(50)).unwrap();

        let result = ipc.command(serde_json::json!(["seek", 0.4, "absolute"]));
        assert!(matches!(result, Err(PlaybackError::Timeout(50))));
    }

    #[test]
    fn test_reply_split_by_timeout_is_resumed() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let server = thread::spawn(move || {
            let mut writer = theirs.try_clone().unwrap();
            let mut reader = BufReader::new(theirs);
            let mut line = String::new();

            reader.read_line(&mut line).unwrap();
            writer.write_all(br#"{"request_id":1,"err"#).unwrap();

            // The second request only arrives once the first one timed out
            line.clear();
            reader.read_line(&mut line).unwrap();
            let request: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
            writer.write_all(b"or\":\"success\"}\n").unwrap();
            writer.write_all(br#"{"request_id":2,"error":"success"}"#).unwrap();
            writer.write_all(b"\n").unwrap();
            request
        });

        let mut ipc = MpvIpc::new(ours, Duration::from_millis(100)).unwrap();
        let first = ipc.command(serde_json::json!(["seek", 5.4, "absolute"]));
        assert!(matches!(first, Err(PlaybackError::Timeout(100))));

        // The tail of the first reply must not be mistaken for a new line
        ipc.command(serde_json::json!(["seek", 0.4, "absolute"])).unwrap();
        assert_eq!(server.join().unwrap()["request_id"], 2);
    }
}
