//! Optional TCP streaming of the output soft-symbol stream, enabled with
//! `-n`/`-p`. Ported from the reference implementation's `tcp_init` /
//! `tcp_queue_send`: accept any number of clients on a listening socket and
//! fan out each written chunk to all of them, best-effort (a slow or
//! disconnected client is dropped, not allowed to back-pressure the
//! demodulator).

use crossbeam::channel::{bounded, Receiver, Sender};
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// Broadcasts byte chunks to every currently-connected TCP client.
pub struct TcpBroadcaster {
    tx: Sender<Arc<[u8]>>,
}

impl TcpBroadcaster {
    /// Bind a listener on `port` (0 lets the OS choose) and spawn the
    /// accept loop plus the fan-out loop. Returns the broadcaster handle and
    /// the bound port.
    pub fn spawn(port: u16) -> std::io::Result<(Self, u16)> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        let bound_port = listener.local_addr()?.port();

        let clients: Arc<Mutex<Vec<TcpStream>>> = Arc::new(Mutex::new(Vec::new()));

        let accept_clients = Arc::clone(&clients);
        thread::spawn(move || {
            for incoming in listener.incoming() {
                match incoming {
                    Ok(stream) => {
                        let _ = stream.set_nodelay(true);
                        accept_clients.lock().unwrap().push(stream);
                    }
                    Err(_) => break,
                }
            }
        });

        let (tx, rx): (Sender<Arc<[u8]>>, Receiver<Arc<[u8]>>) = bounded(64);
        let fanout_clients = Arc::clone(&clients);
        thread::spawn(move || {
            while let Ok(chunk) = rx.recv() {
                let mut guard = fanout_clients.lock().unwrap();
                guard.retain_mut(|client| client.write_all(&chunk).is_ok());
            }
        });

        Ok((Self { tx }, bound_port))
    }

    /// Queue a chunk for delivery to all connected clients. Never blocks the
    /// demodulator worker on a slow reader: if the fan-out channel is full,
    /// the chunk is dropped rather than stalling the caller.
    pub fn queue_send(&self, chunk: &[u8]) {
        let _ = self.tx.try_send(Arc::from(chunk));
    }
}
