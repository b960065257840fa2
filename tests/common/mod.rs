//! A spoof of the controller
//!
//! `MockController` is a `CommandChannel` that never talks to a real controller. Every command
//! sent to it stays pending until the test responds to it.

#![allow(dead_code)]

use bo_tie_interrogator::hci::events::{EventPacket, Events, RemoteNameRequestCompleteData};
use bo_tie_interrogator::hci::link_control::Command;
use bo_tie_interrogator::hci::opcodes::{HciCommand, LinkControl};
use bo_tie_interrogator::hci::{BluetoothDeviceAddress, CommandChannel, CommandFailure, ConnectionHandle};
use bo_tie_interrogator::interrogator::Error;
use bo_tie_interrogator::peer::PeerHandle;
use bo_tie_interrogator::{Interrogator, PeerCache, PeerId};
use futures::channel::oneshot;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

pub const PEER_ADDRESS: BluetoothDeviceAddress = BluetoothDeviceAddress([1, 0, 0, 0, 0, 0]);

pub const PEER_NAME: &str = "Fuchsia";

pub type Response = Result<EventPacket, CommandFailure<MockError>>;

pub type InterrogationResult = Result<(), Error<MockError>>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MockError {
    /// The command was rejected
    Busy,
    /// The controller dropped the command without responding
    Dropped,
}

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MockError::Busy => f.write_str("controller is busy"),
            MockError::Dropped => f.write_str("command dropped by the controller"),
        }
    }
}

struct Pending {
    command: Command,
    responder: oneshot::Sender<Response>,
}

#[derive(Default)]
pub struct MockController {
    sent: RefCell<Vec<Command>>,
    pending: RefCell<Vec<Pending>>,
    rejected: RefCell<Vec<LinkControl>>,
}

impl MockController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every command with the opcode `command`
    pub fn reject(&self, command: LinkControl) {
        self.rejected.borrow_mut().push(command)
    }

    /// Get every command sent in the order they were sent
    pub fn sent_commands(&self) -> Vec<Command> {
        self.sent.borrow().clone()
    }

    pub fn clear_sent_commands(&self) {
        self.sent.borrow_mut().clear()
    }

    /// Get the commands that have not been responded to
    pub fn pending_commands(&self) -> Vec<Command> {
        self.pending.borrow().iter().map(|pending| pending.command).collect()
    }

    /// Respond to the first pending command that matches `predicate`
    ///
    /// `false` is returned if there is no match or the completion of the command was dropped.
    pub fn respond_to<P>(&self, predicate: P, response: Response) -> bool
    where
        P: Fn(&Command) -> bool,
    {
        let pending = {
            let mut pending = self.pending.borrow_mut();

            match pending.iter().position(|p| predicate(&p.command)) {
                Some(index) => pending.remove(index),
                None => return false,
            }
        };

        pending.responder.send(response).is_ok()
    }

    /// Fail the first pending command with the opcode `command`
    pub fn fail(&self, command: LinkControl, failure: CommandFailure<MockError>) -> bool {
        self.respond_to(|c| opcode(c) == command, Err(failure))
    }

    /// Deliver an event to the pending command that it completes
    pub fn deliver(&self, event: EventPacket) -> bool {
        let key = match event.routing_key() {
            Some(key) => key,
            None => return false,
        };

        let code = event.get_event();

        self.respond_to(|c| c.completion_matcher().is_match(code, key), Ok(event))
    }

    /// Respond successfully to every pending command
    ///
    /// The number of commands responded to is returned.
    pub fn respond_all(&self) -> usize {
        let pending: Vec<Pending> = self.pending.borrow_mut().drain(..).collect();

        let count = pending.len();

        for p in pending {
            let _ = p.responder.send(Ok(success_response(&p.command)));
        }

        count
    }
}

impl CommandChannel for MockController {
    type Error = MockError;
    type Completion = MockCompletion;

    fn send(&self, command: Command) -> Result<Self::Completion, Self::Error> {
        if self.rejected.borrow().contains(&opcode(&command)) {
            return Err(MockError::Busy);
        }

        self.sent.borrow_mut().push(command);

        let (responder, receiver) = oneshot::channel();

        self.pending.borrow_mut().push(Pending { command, responder });

        Ok(MockCompletion(receiver))
    }
}

pub struct MockCompletion(oneshot::Receiver<Response>);

impl Future for MockCompletion {
    type Output = Response;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(CommandFailure::Transport(MockError::Dropped))))
    }
}

pub fn opcode(command: &Command) -> LinkControl {
    let HciCommand::LinkControl(opcode) = command.get_command();

    opcode
}

pub fn connection_handle() -> ConnectionHandle {
    ConnectionHandle::try_from(0x0BAA).unwrap()
}

pub fn remote_name_request_complete(address: BluetoothDeviceAddress, name: &str) -> EventPacket {
    let mut parameter = vec![0x00];

    parameter.extend_from_slice(&address.0);

    parameter.extend_from_slice(name.as_bytes());

    parameter.resize(RemoteNameRequestCompleteData::MIN_PARAMETER_LEN, 0);

    EventPacket::new(Events::RemoteNameRequestComplete, parameter)
}

pub fn read_remote_version_info_complete(handle: ConnectionHandle) -> EventPacket {
    let [h0, h1] = handle.get_raw_handle().to_le_bytes();

    // LMP version 5.0, manufacturer 0x00FF, subversion 0x0000
    EventPacket::new(
        Events::ReadRemoteVersionInformationComplete,
        [0x00, h0, h1, 0x09, 0xFF, 0x00, 0x00, 0x00],
    )
}

/// The features of page zero
///
/// The feature *Extended Features* is included when `extended` is true.
pub fn page_zero(extended: bool) -> u64 {
    let features = 0x875B_FFDB_FE8F_FFFFu64 & !(1 << 63);

    if extended {
        features | 1 << 63
    } else {
        features
    }
}

pub fn read_remote_supported_features_complete(handle: ConnectionHandle, extended: bool) -> EventPacket {
    let [h0, h1] = handle.get_raw_handle().to_le_bytes();

    let mut parameter = vec![0x00, h0, h1];

    parameter.extend_from_slice(&page_zero(extended).to_le_bytes());

    EventPacket::new(Events::ReadRemoteSupportedFeaturesComplete, parameter)
}

/// The features of extended page `page`
pub fn extended_page(page: u8) -> u64 {
    match page {
        1 => 0x0F,
        _ => 0x030F,
    }
}

/// The completion of reading an extended page
///
/// The peer reports its maximum page as page three.
pub fn read_remote_extended_complete(handle: ConnectionHandle, page: u8) -> EventPacket {
    let [h0, h1] = handle.get_raw_handle().to_le_bytes();

    let mut parameter = vec![0x00, h0, h1, page, 0x03];

    parameter.extend_from_slice(&extended_page(page).to_le_bytes());

    EventPacket::new(Events::ReadRemoteExtendedFeaturesComplete, parameter)
}

/// Create the event for the successful completion of `command`
pub fn success_response(command: &Command) -> EventPacket {
    match command {
        Command::RemoteNameRequest(p) => remote_name_request_complete(p.bluetooth_address, PEER_NAME),
        Command::ReadRemoteVersionInformation(p) => read_remote_version_info_complete(p.0),
        Command::ReadRemoteSupportedFeatures(p) => read_remote_supported_features_complete(p.0, true),
        Command::ReadRemoteExtendedFeatures(p) => read_remote_extended_complete(p.connection_handle, p.page_number),
    }
}

pub fn init_logger() {
    let _ = simplelog::TestLogger::init(simplelog::LevelFilter::Trace, simplelog::Config::default());
}

/// Create an interrogator with a peer cache containing the peer at `PEER_ADDRESS`
pub fn setup() -> (Interrogator<MockController>, PeerId) {
    init_logger();

    let peers = Rc::new(RefCell::new(PeerCache::new()));

    let peer_id = peers.borrow_mut().get_or_create(PEER_ADDRESS).borrow().identifier();

    (Interrogator::new(MockController::new(), peers), peer_id)
}

pub fn peer(interrogator: &Interrogator<MockController>, peer_id: PeerId) -> PeerHandle {
    interrogator.peers().borrow().find_by_id(peer_id).unwrap()
}

/// Poll `session` until it completes, responding successfully to every command it sends
pub async fn run_to_completion<S>(session: &mut S, controller: &MockController)
where
    S: Future<Output = ()> + Unpin,
{
    loop {
        if let Poll::Ready(()) = futures::poll!(&mut *session) {
            return;
        }

        assert_ne!(0, controller.respond_all(), "session stalled without pending commands");
    }
}
