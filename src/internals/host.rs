/// Host shell interface
///
/// Embeds an `Engine` behind a background thread fed by a channel of
/// `(writer, line)` pairs, so a transport (serial link, socket, in-process
/// test harness) can hand the engine lines of Forth without owning it or
/// synchronizing on a mutex: only one thread ever touches `Engine`. Grounded
/// in the tethered-host pattern spec.md 4.10 describes, rendered as a
/// `std::sync::mpsc` channel rather than the source's async event loop —
/// the natural translation, since no shared mutable state needs to cross
/// threads this way.
use crate::engine::Engine;
use crate::internals::exception;
use std::sync::mpsc::{Receiver, Sender};

/// One line of input plus a channel to report what it produced.
pub struct HostRequest {
    pub line: String,
    pub writer: Sender<HostResponse>,
}

pub struct HostResponse {
    pub output: String,
    /// 0 on a clean return, the thrown code otherwise, mirroring CATCH's
    /// own convention so a transport can treat the two identically.
    pub code: i32,
}

/// Run the engine loop until `rx` is dropped (every sender gone), processing
/// one request at a time. Each line is wrapped in `CATCH` so a throw from
/// user code never kills the host thread.
pub fn run_host(rx: Receiver<HostRequest>) {
    let mut engine = Engine::new();
    while let Ok(request) = rx.recv() {
        let code = exception::catch_with(&mut engine, |e| e.interpret_line(&request.line));
        let output = engine.take_output();
        let _ = request.writer.send(HostResponse { output, code });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_host_echoes_output_and_clean_code() {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || run_host(rx));
        let (reply_tx, reply_rx) = mpsc::channel();
        tx.send(HostRequest {
            line: "42 .".to_string(),
            writer: reply_tx,
        })
        .unwrap();
        let response = reply_rx.recv().unwrap();
        assert_eq!(response.code, 0);
        assert_eq!(response.output.trim(), "42");
        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_host_reports_thrown_code() {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || run_host(rx));
        let (reply_tx, reply_rx) = mpsc::channel();
        tx.send(HostRequest {
            line: "1 0 /".to_string(),
            writer: reply_tx,
        })
        .unwrap();
        let response = reply_rx.recv().unwrap();
        assert_eq!(response.code, -10);
        drop(tx);
        handle.join().unwrap();
    }
}
