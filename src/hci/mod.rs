//! The Host Controller Interface (HCI)
//!
//! This is the part of the Host Controller Interface used for interrogating a peer. It contains
//! the commands sent to the controller, the events returned by the controller, and the trait
//! [`CommandChannel`] which is the boundary between this library and the HCI transport.

pub mod events;
pub mod link_control;
pub mod opcodes;

use alloc::vec::Vec;
use core::fmt;
use core::future::Future;

/// Used to get the information required for sending a command from the host to the controller
///
/// The type implementing `CommandParameter` is the structure of the command's parameters.
pub trait CommandParameter<const PARAMETER_SIZE: usize> {
    /// The command to send to the Bluetooth Controller.
    ///
    /// This is the OGF & OCF pair.
    const COMMAND: opcodes::HciCommand;

    /// Convert Self into the parameter form
    ///
    /// The returned parameter is the structure defined as the parameter part of the command packet
    /// for the specific HCI command.
    fn get_parameter(&self) -> [u8; PARAMETER_SIZE];

    /// Get the command packet to be sent to the controller
    ///
    /// The format of the command packet is to send the command opcode, followed by the length of
    /// the parameter, and then finally the parameter.
    ///
    /// # Note
    /// HCI packets do not contain information on the type of packet that they are. The transport
    /// is responsible for adding any packet indicator.
    fn as_command_packet(&self) -> Vec<u8> {
        let parameter = self.get_parameter();

        let mut packet = Vec::with_capacity(PARAMETER_SIZE + 3);

        packet.extend_from_slice(&Self::COMMAND.into_opcode().to_le_bytes());

        packet.push(PARAMETER_SIZE as u8);

        packet.extend_from_slice(&parameter);

        packet
    }
}

/// The connection handle
///
/// This is used as an identifier of a connection by both the host and controller. Its created by
/// the controller when a connection is established between this device and another device.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct ConnectionHandle {
    handle: u16,
}

impl ConnectionHandle {
    pub const MAX: u16 = 0x0EFF;

    const ERROR: &'static str = "Raw connection handle value larger then the maximum (0x0EFF)";

    pub fn get_raw_handle(&self) -> u16 {
        self.handle
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#06x}", self.handle)
    }
}

impl TryFrom<u16> for ConnectionHandle {
    type Error = &'static str;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        if raw <= ConnectionHandle::MAX {
            Ok(ConnectionHandle { handle: raw })
        } else {
            Err(Self::ERROR)
        }
    }
}

impl TryFrom<[u8; 2]> for ConnectionHandle {
    type Error = &'static str;

    fn try_from(raw: [u8; 2]) -> Result<Self, Self::Error> {
        // the upper four bits are the packet boundary and broadcast
        // flags when the handle is part of an ACL header
        ConnectionHandle::try_from(<u16>::from_le_bytes(raw) & 0xFFF)
    }
}

/// A Bluetooth device address (BD_ADDR)
///
/// The bytes are in the order that they are transferred over the HCI, so the least significant
/// byte of the address is the first byte.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BluetoothDeviceAddress(pub [u8; 6]);

impl BluetoothDeviceAddress {
    pub const LEN: usize = 6;
}

impl From<[u8; 6]> for BluetoothDeviceAddress {
    fn from(raw: [u8; 6]) -> Self {
        BluetoothDeviceAddress(raw)
    }
}

impl fmt::Display for BluetoothDeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [b0, b1, b2, b3, b4, b5] = self.0;

        write!(f, "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}", b5, b4, b3, b2, b1, b0)
    }
}

/// The key used for routing a completion event to the command that it completes
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventKey {
    ConnectionHandle(ConnectionHandle),
    Address(BluetoothDeviceAddress),
}

/// A matcher of the event completing a command
///
/// The commands used for interrogation are each completed by an event that is not a *Command
/// Complete* event. The transport uses the `EventMatcher` of a command to determine which
/// received event is the completion of the command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EventMatcher {
    pub event: events::Events,
    pub key: EventKey,
}

impl EventMatcher {
    /// Check if an event with the event code `event` and the routing key `key` matches
    pub fn is_match(&self, event: events::Events, key: EventKey) -> bool {
        self.event == event && self.key == key
    }
}

/// The ways a command can fail after it was accepted by a [`CommandChannel`]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CommandFailure<E> {
    /// The controller returned a non-success status within the *Command Status* event
    Status(crate::errors::Error),
    /// The completion event was never received
    Timeout,
    /// An error specific to the transport
    Transport(E),
}

impl<E: fmt::Display> fmt::Display for CommandFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CommandFailure::Status(status) => write!(f, "command failed with status {}", status),
            CommandFailure::Timeout => f.write_str("timed out waiting for the completion event"),
            CommandFailure::Transport(e) => write!(f, "transport error, {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for CommandFailure<E> {}

/// The channel for sending commands to the controller
///
/// This is the boundary between interrogation and the HCI transport. Queuing of commands and flow
/// control with the controller are the responsibility of the implementor.
///
/// # Sending
/// Method `send` either rejects the command (the channel is busy or closed) or returns the future
/// `Completion`. A rejected command was never sent to the controller.
///
/// # Completion
/// `Completion` first awaits the *Command Status* event for the command. If the status is not a
/// success then the output is [`CommandFailure::Status`]. Otherwise `Completion` continues to await
/// the event that matches the [`EventMatcher`] of the command and outputs the event.
///
/// Multiple commands may be sent before any of them complete, the order in which the `Completion`
/// futures resolve does not need to match the order in which the commands were sent.
pub trait CommandChannel {
    type Error: fmt::Debug + fmt::Display;
    type Completion: Future<Output = Result<events::EventPacket, CommandFailure<Self::Error>>>;

    /// Send a command to the controller
    fn send(&self, command: link_control::Command) -> Result<Self::Completion, Self::Error>;
}
