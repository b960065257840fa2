//! Interrogation of BR/EDR peers
//!
//! An [`Interrogator`] queries a connected peer for the information not yet within its
//! [`PeerRecord`]. Method [`start`] returns a [`Session`], a future that sends the commands for
//! the missing information, writes the results into the peer record, and then calls the
//! completion callback with the aggregate result.
//!
//! ```
//! # use bo_tie_interrogator::hci::{CommandChannel, CommandFailure, ConnectionHandle};
//! # use bo_tie_interrogator::hci::events::EventPacket;
//! # use bo_tie_interrogator::hci::link_control::Command;
//! # use bo_tie_interrogator::{BluetoothDeviceAddress, Interrogator, PeerCache};
//! # use std::{cell::RefCell, rc::Rc};
//! # struct Channel;
//! # impl CommandChannel for Channel {
//! #     type Error = &'static str;
//! #     type Completion = std::future::Ready<Result<EventPacket, CommandFailure<&'static str>>>;
//! #     fn send(&self, _: Command) -> Result<Self::Completion, Self::Error> { Err("closed") }
//! # }
//! # let channel = Channel;
//! # let connection_handle = ConnectionHandle::try_from(0x0BAA).unwrap();
//! let peers = Rc::new(RefCell::new(PeerCache::new()));
//!
//! let peer_id = peers
//!     .borrow_mut()
//!     .get_or_create(BluetoothDeviceAddress([1, 0, 0, 0, 0, 0]))
//!     .borrow()
//!     .identifier();
//!
//! let interrogator = Interrogator::new(channel, peers.clone());
//!
//! # futures::executor::block_on(async {
//! match interrogator.interrogate(peer_id, connection_handle).await {
//!     Ok(()) => println!("{:?}", peers.borrow().find_by_id(peer_id)),
//!     Err(e) => println!("interrogation failed, {}", e),
//! }
//! # })
//! ```
//!
//! # Procedures
//! The information of a peer is queried by the procedures *name query*, *version query*,
//! *features query*, and *extended features query*. Only the procedures for information missing
//! from the peer record are started. The extended features query is started for page one when the
//! features (page zero) of the peer contain [`ExtendedFeatures`], and then for page two if the
//! peer reports page two as part of its extended features.
//!
//! # Failure
//! A failing procedure does not stop the other procedures of the session. The aggregate result is
//! the error of the first procedure to fail, whatever was successfully queried is still written to
//! the peer record. Procedures are never retried, another session must be started to query for
//! the information still missing.
//!
//! # Cancellation
//! Dropping a session before it completes stops it without calling the callback. Sessions can also
//! be canceled with method [`cancel`], this calls the callback with [`Error::Canceled`].
//!
//! [`start`]: Interrogator::start
//! [`cancel`]: Interrogator::cancel
//! [`PeerRecord`]: crate::peer::PeerRecord
//! [`ExtendedFeatures`]: crate::features::LmpFeature::ExtendedFeatures

mod join;
mod procedure;
mod sessions;

pub use procedure::{PeerUpdate, ProcedureKind, Transition};

use crate::errors;
use crate::hci::events::{EventError, EventPacket};
use crate::hci::{CommandChannel, CommandFailure, ConnectionHandle};
use crate::peer::{PeerCache, PeerHandle, PeerId};
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use futures::channel::oneshot;
use futures::stream::{FuturesUnordered, StreamExt};
use join::Join;
use procedure::Procedure;
use sessions::{SessionKey, SessionTable};

/// Error of an interrogation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// The command channel rejected a command
    Rejected(E),
    /// The controller or peer returned a non-success status
    Status(errors::Error),
    /// A completion event could not be parsed
    Malformed(EventError),
    /// A completion event was for another peer or connection
    UnexpectedEvent,
    /// A completion event was never received
    Timeout,
    /// The command channel failed after the command was sent
    Transport(E),
    /// The peer is not within the peer cache
    UnknownPeer(PeerId),
    /// The session was canceled
    Canceled,
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Rejected(e) => write!(f, "command rejected, {}", e),
            Error::Status(status) => fmt::Display::fmt(status, f),
            Error::Malformed(e) => write!(f, "malformed event, {}", e),
            Error::UnexpectedEvent => f.write_str("received an event for another peer or connection"),
            Error::Timeout => f.write_str("timed out waiting for a completion event"),
            Error::Transport(e) => write!(f, "transport error, {}", e),
            Error::UnknownPeer(id) => write!(f, "no peer with identifier {}", id),
            Error::Canceled => f.write_str("interrogation canceled"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for Error<E> {}

impl<E> From<CommandFailure<E>> for Error<E> {
    fn from(failure: CommandFailure<E>) -> Self {
        match failure {
            CommandFailure::Status(status) => Error::Status(status),
            CommandFailure::Timeout => Error::Timeout,
            CommandFailure::Transport(e) => Error::Transport(e),
        }
    }
}

impl<E> From<EventError> for Error<E> {
    fn from(e: EventError) -> Self {
        match e {
            EventError::UnexpectedEvent { .. } => Error::UnexpectedEvent,
            e => Error::Malformed(e),
        }
    }
}

/// The interrogator of BR/EDR peers
pub struct Interrogator<C> {
    channel: C,
    peers: Rc<RefCell<PeerCache>>,
    sessions: RefCell<SessionTable>,
}

impl<C: CommandChannel> Interrogator<C> {
    pub fn new(channel: C, peers: Rc<RefCell<PeerCache>>) -> Self {
        Interrogator {
            channel,
            peers,
            sessions: RefCell::new(SessionTable::default()),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn peers(&self) -> &Rc<RefCell<PeerCache>> {
        &self.peers
    }

    /// Start interrogating a peer
    ///
    /// The returned session must be polled to completion, `callback` is called once with the
    /// aggregate result of the session. No commands are sent until the session is first polled.
    ///
    /// `connection_handle` must be the handle of an established connection to the peer.
    pub fn start<F>(&self, peer_id: PeerId, connection_handle: ConnectionHandle, callback: F) -> Session<'_, C, F>
    where
        F: FnOnce(Result<(), Error<C::Error>>),
    {
        let peer = self.peers.borrow().find_by_id(peer_id);

        let (key, canceled) = self.sessions.borrow_mut().insert(peer_id);

        log::info!("(GAP) interrogating peer {} on connection {}", peer_id, connection_handle);

        Session {
            interrogator: self,
            peer_id,
            peer,
            connection_handle,
            procedures: FuturesUnordered::new(),
            join: Join::new(callback),
            launched: false,
            canceled: Some(canceled),
            key: Some(key),
        }
    }

    /// Interrogate a peer
    ///
    /// This is the same as method [`start`](Interrogator::start) except the aggregate result is
    /// the output of the returned future.
    pub async fn interrogate(
        &self,
        peer_id: PeerId,
        connection_handle: ConnectionHandle,
    ) -> Result<(), Error<C::Error>> {
        let mut outcome = None;

        self.start(peer_id, connection_handle, |result| outcome = Some(result))
            .await;

        outcome.unwrap_or(Err(Error::Canceled))
    }

    /// Cancel the interrogation of a peer
    ///
    /// Every session of the peer that has not finished calls its callback with
    /// [`Error::Canceled`] the next time it is polled. The number of canceled sessions is
    /// returned.
    pub fn cancel(&self, peer_id: PeerId) -> usize {
        let count = self.sessions.borrow_mut().cancel(peer_id);

        log::debug!("(GAP) canceled {} interrogation(s) of peer {}", count, peer_id);

        count
    }

    /// Get the number of sessions that have not finished
    pub fn active_sessions(&self) -> usize {
        self.sessions.borrow().len()
    }
}

/// An interrogation session
///
/// This is created by method [`start`](Interrogator::start) of `Interrogator`. The output of a
/// session is `()` as the aggregate result is given to the completion callback.
pub struct Session<'a, C: CommandChannel, F> {
    interrogator: &'a Interrogator<C>,
    peer_id: PeerId,
    peer: Option<PeerHandle>,
    connection_handle: ConnectionHandle,
    procedures: FuturesUnordered<Procedure<C::Completion>>,
    join: Join<F, Error<C::Error>>,
    launched: bool,
    canceled: Option<oneshot::Receiver<()>>,
    key: Option<SessionKey>,
}

impl<C, F> Session<'_, C, F>
where
    C: CommandChannel,
    F: FnOnce(Result<(), Error<C::Error>>),
{
    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn connection_handle(&self) -> ConnectionHandle {
        self.connection_handle
    }

    /// Get the number of procedures that have not resolved
    pub fn outstanding(&self) -> usize {
        self.join.outstanding()
    }

    fn is_canceled(&mut self, cx: &mut Context<'_>) -> bool {
        let receiver = match self.canceled.as_mut() {
            Some(receiver) => receiver,
            None => return false,
        };

        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(())) => true,
            Poll::Ready(Err(_)) => {
                self.canceled = None;
                false
            }
            Poll::Pending => false,
        }
    }

    /// Launch the procedures selected for the peer
    ///
    /// Every procedure is added to the join before any command is sent, a command rejected by the
    /// channel cannot bring the count to zero while other procedures are still to be launched.
    fn launch_all(&mut self, peer: &PeerHandle) {
        let kinds = ProcedureKind::select(&peer.borrow());

        if kinds.is_empty() {
            log::info!("(GAP) nothing to interrogate for peer {}", self.peer_id);
        }

        kinds.iter().for_each(|_| self.join.add());

        for kind in kinds {
            self.launch(peer, kind);
        }
    }

    /// Send the command of a procedure
    ///
    /// The procedure must already be added to the join.
    fn launch(&mut self, peer: &PeerHandle, kind: ProcedureKind) {
        let command = kind.command(&peer.borrow(), self.connection_handle);

        log::info!("(HCI) sending command {}", command);

        match self.interrogator.channel.send(command) {
            Ok(completion) => self.procedures.push(Procedure::new(kind, completion)),
            Err(e) => self.resolve(kind, Err(Error::Rejected(e))),
        }
    }

    /// Process the outcome of a procedure
    fn complete(&mut self, kind: ProcedureKind, outcome: Result<EventPacket, CommandFailure<C::Error>>) {
        let peer = match self.peer.clone() {
            Some(peer) => peer,
            None => return self.resolve(kind, Err(Error::UnknownPeer(self.peer_id))),
        };

        let transition = outcome.map_err(Error::from).and_then(|event| {
            let address = peer.borrow().address();

            kind.process(address, self.connection_handle, &event)
        });

        match transition {
            Ok(Transition { update, next }) => {
                update.apply(&mut peer.borrow_mut());

                // the next procedure is added before this one is resolved so the count cannot
                // reach zero in between
                if let Some(next) = next {
                    self.join.add();

                    self.launch(&peer, next);
                }

                self.resolve(kind, Ok(()))
            }
            Err(e) => self.resolve(kind, Err(e)),
        }
    }

    fn resolve(&mut self, kind: ProcedureKind, result: Result<(), Error<C::Error>>) {
        match &result {
            Ok(()) => log::debug!("(GAP) {} of peer {} succeeded", kind, self.peer_id),
            Err(e) if self.join.is_ok() => log::warn!("(GAP) {} of peer {} failed, {}", kind, self.peer_id, e),
            Err(e) => log::debug!("(GAP) {} of peer {} also failed, {}", kind, self.peer_id, e),
        }

        self.join.resolve(result);
    }

    fn fire(&mut self, result: Result<(), Error<C::Error>>) {
        if let Err(e) = &result {
            log::warn!("(GAP) interrogation of peer {} failed, {}", self.peer_id, e);
        }

        self.join.fire(result)
    }

    /// Remove the session from the table of active sessions
    fn release(&mut self) {
        self.procedures.clear();

        self.canceled = None;

        if let Some(key) = self.key.take() {
            self.interrogator.sessions.borrow_mut().remove(key)
        }
    }
}

impl<C, F> Future for Session<'_, C, F>
where
    C: CommandChannel,
    F: FnOnce(Result<(), Error<C::Error>>),
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.join.is_fired() {
            this.release();

            return Poll::Ready(());
        }

        if this.is_canceled(cx) {
            log::info!("(GAP) interrogation of peer {} canceled", this.peer_id);

            this.release();

            this.fire(Err(Error::Canceled));

            return Poll::Ready(());
        }

        if !this.launched {
            this.launched = true;

            match this.peer.clone() {
                Some(peer) => this.launch_all(&peer),
                None => this.fire(Err(Error::UnknownPeer(this.peer_id))),
            }
        }

        loop {
            if this.join.is_fired() {
                log::info!("(GAP) finished interrogating peer {}", this.peer_id);

                this.release();

                return Poll::Ready(());
            }

            match this.procedures.poll_next_unpin(cx) {
                Poll::Ready(Some((kind, outcome))) => this.complete(kind, outcome),
                Poll::Ready(None) => this.join.finish(),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

// No field of a session is structurally pinned, procedures are pinned within `FuturesUnordered`
impl<C: CommandChannel, F> Unpin for Session<'_, C, F> {}

impl<C: CommandChannel, F> Drop for Session<'_, C, F> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            if !self.procedures.is_empty() {
                log::debug!("(GAP) interrogation of peer {} dropped", self.peer_id);
            }

            self.interrogator.sessions.borrow_mut().remove(key)
        }
    }
}
