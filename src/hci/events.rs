//! Host Controller Interface Events
//!
//! These are the events that complete the commands used for interrogation. The transport delivers
//! an event as an [`EventPacket`], the event parameter is then converted into one of the `*Data`
//! types with `TryFrom<&[u8]>`.

use crate::errors::Error;
use crate::hci::{BluetoothDeviceAddress, ConnectionHandle, EventKey};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// "chews-off" and returns a slice of size `$size` from the beginning of `$packet`
///
/// Invoking this with only one parameter returns an u8, otherwise a reference to a slice is
/// returned. If `$packet` is too short the enclosing function returns
/// `EventError::ParameterTooShort`.
macro_rules! chew {
    ( $packet:ident, $event:expr, $size:expr ) => {{
        let chewed = $packet.get(..$size).ok_or(EventError::ParameterTooShort {
            event: $event,
            expected: $size,
            received: $packet.len(),
        })?;
        $packet = &$packet[$size..];
        chewed
    }};
    ( $packet:ident, $event:expr ) => {
        chew!($packet, $event, 1)[0]
    };
}

macro_rules! chew_u16 {
    ( $packet:ident, $event:expr ) => {{
        let chewed = chew!($packet, $event, 2);
        <u16>::from_le_bytes([chewed[0], chewed[1]])
    }};
}

macro_rules! chew_u64 {
    ( $packet:ident, $event:expr ) => {{
        let mut raw = [0u8; 8];
        raw.copy_from_slice(chew!($packet, $event, 8));
        <u64>::from_le_bytes(raw)
    }};
}

macro_rules! chew_baddr {
    ( $packet:ident, $event:expr ) => {{
        let mut address = [0u8; 6];
        address.copy_from_slice(chew!($packet, $event, 6));
        BluetoothDeviceAddress(address)
    }};
}

macro_rules! chew_handle {
    ( $packet:ident, $event:expr ) => {{
        let chewed = chew!($packet, $event, 2);
        ConnectionHandle::try_from([chewed[0], chewed[1]]).map_err(|_| EventError::InvalidConnectionHandle)?
    }};
}

/// Check that `$packet` is at least `$len` bytes before anything is chewed off
macro_rules! check_len {
    ( $packet:ident, $event:expr, $len:expr ) => {
        if $packet.len() < $len {
            return Err(EventError::ParameterTooShort {
                event: $event,
                expected: $len,
                received: $packet.len(),
            });
        }
    };
}

/// The events that complete the interrogation commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Events {
    RemoteNameRequestComplete,
    ReadRemoteSupportedFeaturesComplete,
    ReadRemoteVersionInformationComplete,
    ReadRemoteExtendedFeaturesComplete,
}

impl Events {
    /// Get the event code
    pub fn get_event_code(&self) -> u8 {
        match self {
            Events::RemoteNameRequestComplete => 0x07,
            Events::ReadRemoteSupportedFeaturesComplete => 0x0B,
            Events::ReadRemoteVersionInformationComplete => 0x0C,
            Events::ReadRemoteExtendedFeaturesComplete => 0x23,
        }
    }

    /// Try to get the event from the event code
    pub fn try_from_event_code(code: u8) -> Result<Self, EventError> {
        match code {
            0x07 => Ok(Events::RemoteNameRequestComplete),
            0x0B => Ok(Events::ReadRemoteSupportedFeaturesComplete),
            0x0C => Ok(Events::ReadRemoteVersionInformationComplete),
            0x23 => Ok(Events::ReadRemoteExtendedFeaturesComplete),
            _ => Err(EventError::UnknownEventCode(code)),
        }
    }
}

impl fmt::Display for Events {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Events::RemoteNameRequestComplete => f.write_str("Remote Name Request Complete"),
            Events::ReadRemoteSupportedFeaturesComplete => f.write_str("Read Remote Supported Features Complete"),
            Events::ReadRemoteVersionInformationComplete => f.write_str("Read Remote Version Information Complete"),
            Events::ReadRemoteExtendedFeaturesComplete => f.write_str("Read Remote Extended Features Complete"),
        }
    }
}

/// Error for an invalid event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The event parameter is shorter than the minimum valid encoding
    ParameterTooShort {
        event: Events,
        expected: usize,
        received: usize,
    },
    /// The packet is shorter than the parameter length field states
    PacketTooShort,
    InvalidConnectionHandle,
    /// The remote name is not valid UTF-8
    InvalidRemoteName,
    UnknownEventCode(u8),
    /// The event is not the event expected for the command
    UnexpectedEvent { expected: Events, received: Events },
    /// The page within a *Read Remote Extended Features Complete* event is not the page requested
    UnexpectedPage { requested: u8, received: u8 },
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventError::ParameterTooShort {
                event,
                expected,
                received,
            } => write!(
                f,
                "the parameter of event {} is too short (expected {} bytes, received {})",
                event, expected, received
            ),
            EventError::PacketTooShort => f.write_str("event packet is shorter than its parameter length"),
            EventError::InvalidConnectionHandle => f.write_str("invalid connection handle"),
            EventError::InvalidRemoteName => f.write_str("the remote name is not valid UTF-8"),
            EventError::UnknownEventCode(code) => write!(f, "unknown event code {:#x}", code),
            EventError::UnexpectedEvent { expected, received } => {
                write!(f, "expected event {}, received {}", expected, received)
            }
            EventError::UnexpectedPage { requested, received } => {
                write!(f, "requested feature page {}, received page {}", requested, received)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EventError {}

/// A HCI event packet
///
/// This is the event code along with the raw event parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPacket {
    event: Events,
    parameter: Vec<u8>,
}

impl EventPacket {
    pub fn new<P: Into<Vec<u8>>>(event: Events, parameter: P) -> Self {
        EventPacket {
            event,
            parameter: parameter.into(),
        }
    }

    /// Try to create an `EventPacket` from a HCI event packet
    ///
    /// The packet is the event code, the length of the parameter, and then the parameter.
    pub fn try_from_packet(packet: &[u8]) -> Result<Self, EventError> {
        let (code, len, parameter) = match packet {
            [code, len, parameter @ ..] => (*code, *len as usize, parameter),
            _ => return Err(EventError::PacketTooShort),
        };

        let event = Events::try_from_event_code(code)?;

        let parameter = parameter.get(..len).ok_or(EventError::PacketTooShort)?;

        Ok(EventPacket::new(event, parameter))
    }

    pub fn get_event(&self) -> Events {
        self.event
    }

    pub fn get_parameter(&self) -> &[u8] {
        &self.parameter
    }

    /// Get the key used for routing this event to the command it completes
    ///
    /// `None` is returned if the parameter is too short to contain the key.
    pub fn routing_key(&self) -> Option<EventKey> {
        // every event starts with the status
        let after_status = self.parameter.get(1..)?;

        match self.event {
            Events::RemoteNameRequestComplete => {
                let mut address = [0u8; 6];

                address.copy_from_slice(after_status.get(..6)?);

                Some(EventKey::Address(BluetoothDeviceAddress(address)))
            }
            _ => {
                let raw = [*after_status.first()?, *after_status.get(1)?];

                ConnectionHandle::try_from(raw).ok().map(EventKey::ConnectionHandle)
            }
        }
    }

    /// Convert the parameter into the data type of the event
    ///
    /// An error is returned if this event is not `expected`.
    pub fn try_into_data<'a, T>(&'a self, expected: Events) -> Result<T, EventError>
    where
        T: TryFrom<&'a [u8], Error = EventError>,
    {
        if self.event != expected {
            return Err(EventError::UnexpectedEvent {
                expected,
                received: self.event,
            });
        }

        T::try_from(self.parameter.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNameRequestCompleteData {
    pub status: Error,
    pub bluetooth_address: BluetoothDeviceAddress,
    /// The name is empty when `status` is not `NoError`
    pub remote_name: String,
}

impl RemoteNameRequestCompleteData {
    /// The size of the remote name field
    pub const REMOTE_NAME_LEN: usize = 248;

    /// The status, the address, and the remote name field
    pub const MIN_PARAMETER_LEN: usize = 1 + BluetoothDeviceAddress::LEN + Self::REMOTE_NAME_LEN;
}

impl TryFrom<&[u8]> for RemoteNameRequestCompleteData {
    type Error = EventError;

    // the slice is advanced past the last field as well
    #[allow(unused_assignments)]
    fn try_from(mut packet: &[u8]) -> Result<Self, Self::Error> {
        const EVENT: Events = Events::RemoteNameRequestComplete;

        check_len!(packet, EVENT, Self::MIN_PARAMETER_LEN);

        let status = Error::from(chew!(packet, EVENT));

        let bluetooth_address = chew_baddr!(packet, EVENT);

        let raw_name = chew!(packet, EVENT, Self::REMOTE_NAME_LEN);

        let remote_name = if let Error::NoError = status {
            // the name is null terminated unless it fills the entire field
            let name = raw_name.split(|b| *b == 0).next().unwrap_or_default();

            String::from_utf8(name.to_vec()).map_err(|_| EventError::InvalidRemoteName)?
        } else {
            String::new()
        };

        Ok(RemoteNameRequestCompleteData {
            status,
            bluetooth_address,
            remote_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRemoteVersionInformationCompleteData {
    pub status: Error,
    pub connection_handle: ConnectionHandle,
    pub version: u8,
    pub manufacturer_name: u16,
    pub subversion: u16,
}

impl ReadRemoteVersionInformationCompleteData {
    pub const PARAMETER_LEN: usize = 8;
}

impl TryFrom<&[u8]> for ReadRemoteVersionInformationCompleteData {
    type Error = EventError;

    // the slice is advanced past the last field as well
    #[allow(unused_assignments)]
    fn try_from(mut packet: &[u8]) -> Result<Self, Self::Error> {
        const EVENT: Events = Events::ReadRemoteVersionInformationComplete;

        check_len!(packet, EVENT, Self::PARAMETER_LEN);

        Ok(ReadRemoteVersionInformationCompleteData {
            status: Error::from(chew!(packet, EVENT)),
            connection_handle: chew_handle!(packet, EVENT),
            version: chew!(packet, EVENT),
            manufacturer_name: chew_u16!(packet, EVENT),
            subversion: chew_u16!(packet, EVENT),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRemoteSupportedFeaturesCompleteData {
    pub status: Error,
    pub connection_handle: ConnectionHandle,
    /// The LMP features of page zero
    pub lmp_features: u64,
}

impl ReadRemoteSupportedFeaturesCompleteData {
    pub const PARAMETER_LEN: usize = 11;
}

impl TryFrom<&[u8]> for ReadRemoteSupportedFeaturesCompleteData {
    type Error = EventError;

    // the slice is advanced past the last field as well
    #[allow(unused_assignments)]
    fn try_from(mut packet: &[u8]) -> Result<Self, Self::Error> {
        const EVENT: Events = Events::ReadRemoteSupportedFeaturesComplete;

        check_len!(packet, EVENT, Self::PARAMETER_LEN);

        Ok(ReadRemoteSupportedFeaturesCompleteData {
            status: Error::from(chew!(packet, EVENT)),
            connection_handle: chew_handle!(packet, EVENT),
            lmp_features: chew_u64!(packet, EVENT),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRemoteExtendedFeaturesCompleteData {
    pub status: Error,
    pub connection_handle: ConnectionHandle,
    pub page_number: u8,
    pub maximum_page_number: u8,
    pub extended_lmp_features: u64,
}

impl ReadRemoteExtendedFeaturesCompleteData {
    pub const PARAMETER_LEN: usize = 13;
}

impl TryFrom<&[u8]> for ReadRemoteExtendedFeaturesCompleteData {
    type Error = EventError;

    // the slice is advanced past the last field as well
    #[allow(unused_assignments)]
    fn try_from(mut packet: &[u8]) -> Result<Self, Self::Error> {
        const EVENT: Events = Events::ReadRemoteExtendedFeaturesComplete;

        check_len!(packet, EVENT, Self::PARAMETER_LEN);

        Ok(ReadRemoteExtendedFeaturesCompleteData {
            status: Error::from(chew!(packet, EVENT)),
            connection_handle: chew_handle!(packet, EVENT),
            page_number: chew!(packet, EVENT),
            maximum_page_number: chew!(packet, EVENT),
            extended_lmp_features: chew_u64!(packet, EVENT),
        })
    }
}
