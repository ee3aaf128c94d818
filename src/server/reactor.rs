//! The readiness reactor.
//!
//! One thread owns the poller, the registration table and the connection
//! count; workers never touch any of them. Exclusive access to a
//! connection's state is enforced by single-shot arming: a connection handed
//! to a worker is removed from the reactor's table, so readiness events for
//! it are ignored until the worker hands it back (over a channel, waking the
//! poller) and the reactor re-arms its registration. At any instant at most
//! one thread owns a given connection.

use std::collections::HashMap;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use mio::event::Event;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, Verdict, WriteOutcome};
use crate::server::pool::{Runnable, WorkerPool};

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

/// Complete reply sent to connections accepted beyond the capacity ceiling.
const BUSY_REPLY: &[u8] = b"HTTP/1.1 503 Service Unavailable\r\n\
    Content-Type: text/plain; charset=utf-8\r\n\
    Content-Length: 12\r\n\
    Connection: close\r\n\r\n\
    server busy\n";

/// One buffered request, ready for the state machine; the unit of work
/// handed to the pool.
pub struct ProcessTask {
    token: Token,
    conn: Connection,
    done: Sender<(Token, Connection, Verdict)>,
    waker: Arc<Waker>,
}

impl Runnable for ProcessTask {
    fn process(self) {
        let ProcessTask {
            token,
            mut conn,
            done,
            waker,
        } = self;
        let verdict = conn.process();
        if done.send((token, conn, verdict)).is_ok() {
            // A failed wake only delays pickup: the reactor drains the
            // hand-back channel on every poll iteration regardless.
            if let Err(e) = waker.wake() {
                warn!("failed to wake reactor: {e}");
            }
        }
    }
}

pub struct Reactor {
    poll: Poll,
    listener: TcpListener,
    waker: Arc<Waker>,
    pool: WorkerPool<ProcessTask>,
    conns: HashMap<Token, Connection>,
    done_tx: Sender<(Token, Connection, Verdict)>,
    done_rx: Receiver<(Token, Connection, Verdict)>,
    next_token: usize,
    active: usize,
    max_connections: usize,
    root: Arc<PathBuf>,
}

impl Reactor {
    pub fn new(cfg: &Config, pool: WorkerPool<ProcessTask>) -> anyhow::Result<Self> {
        let poll = Poll::new()?;
        let addr: SocketAddr = cfg.listen_addr.parse()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
        let (done_tx, done_rx) = channel();

        Ok(Self {
            poll,
            listener,
            waker,
            pool,
            conns: HashMap::new(),
            done_tx,
            done_rx,
            next_token: FIRST_CONNECTION,
            active: 0,
            max_connections: cfg.max_connections,
            root: Arc::new(cfg.root_dir.clone()),
        })
    }

    /// The address the listener is bound to (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the readiness loop; never returns under normal operation.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut events = Events::with_capacity(1024);
        info!("Listening on {}", self.listener.local_addr()?);

        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }
            // Workers may have handed connections back whether or not the
            // wake made it into this batch of events.
            self.drain_handbacks();
            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_ready(),
                    WAKER => {}
                    token => self.conn_ready(token, event),
                }
            }
        }
    }

    /// Accepts until the listener would block, rejecting connections beyond
    /// the ceiling with a synchronous busy reply.
    ///
    /// Accept failures never stop the loop: a connection aborted before the
    /// accept completes is skipped, and anything else (descriptor
    /// exhaustion, transient kernel errors) is logged and retried on the
    /// next readiness event.
    fn accept_ready(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    if self.active >= self.max_connections {
                        warn!("Rejecting {peer}: connection ceiling reached");
                        let _ = stream.write(BUSY_REPLY);
                        continue;
                    }
                    let token = Token(self.next_token);
                    self.next_token += 1;
                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE)
                    {
                        warn!("Registering {peer} failed: {e}");
                        continue;
                    }
                    let conn = Connection::new(stream, Arc::clone(&self.root));
                    self.store(token, conn);
                    self.active += 1;
                    info!("Accepted connection from {peer}");
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::ConnectionAborted => {
                    debug!("Connection aborted before accept: {e}");
                    continue;
                }
                Err(e) => {
                    warn!("Accept failed: {e}");
                    return;
                }
            }
        }
    }

    /// Handles a readiness event for one connection.
    fn conn_ready(&mut self, token: Token, event: &Event) {
        // A missing slot means a worker currently owns this connection (or it
        // is already gone); the event re-fires via reregister on hand-back.
        let Some(mut conn) = self.take(token) else {
            return;
        };

        if event.is_error() || event.is_read_closed() || event.is_write_closed() {
            self.teardown(token, conn);
            return;
        }

        if event.is_readable() {
            if let Err(e) = conn.read() {
                debug!("read on {token:?} failed: {e}");
                self.teardown(token, conn);
                return;
            }
            let task = ProcessTask {
                token,
                conn,
                done: self.done_tx.clone(),
                waker: Arc::clone(&self.waker),
            };
            if let Err(task) = self.pool.submit(task) {
                warn!("Worker queue saturated, closing {token:?}");
                self.teardown(token, task.conn);
            }
            return;
        }

        if event.is_writable() {
            match conn.write() {
                WriteOutcome::Again => self.rearm(token, conn, Interest::WRITABLE),
                WriteOutcome::KeepAlive => self.rearm(token, conn, Interest::READABLE),
                WriteOutcome::Close => self.teardown(token, conn),
            }
            return;
        }

        // Neither readable nor writable: keep the slot, wait for the next event.
        self.store(token, conn);
    }

    /// Re-integrates connections workers have finished with.
    fn drain_handbacks(&mut self) {
        while let Ok((token, conn, verdict)) = self.done_rx.try_recv() {
            match verdict {
                Verdict::RearmRead => self.rearm(token, conn, Interest::READABLE),
                Verdict::StartWrite => {
                    let interest = if conn.has_backlog() {
                        Interest::WRITABLE
                    } else {
                        Interest::READABLE
                    };
                    self.rearm(token, conn, interest);
                }
                Verdict::Close => self.teardown(token, conn),
            }
        }
    }

    /// Re-arms the connection's registration and returns it to the table,
    /// transferring ownership back to the reactor.
    fn rearm(&mut self, token: Token, mut conn: Connection, interest: Interest) {
        if let Err(e) = self.poll.registry().reregister(conn.source(), token, interest) {
            error!("re-arming {token:?} failed: {e}");
            self.teardown(token, conn);
            return;
        }
        self.store(token, conn);
    }

    /// Deregisters and drops the connection, closing the socket and
    /// releasing any mapped file region.
    fn teardown(&mut self, token: Token, mut conn: Connection) {
        debug!("closing connection {token:?}");
        if let Err(e) = self.poll.registry().deregister(conn.source()) {
            debug!("deregistering {token:?} failed: {e}");
        }
        self.active -= 1;
    }

    fn store(&mut self, token: Token, conn: Connection) {
        self.conns.insert(token, conn);
    }

    fn take(&mut self, token: Token) -> Option<Connection> {
        self.conns.remove(&token)
    }
}
