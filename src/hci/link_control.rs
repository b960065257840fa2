//! Link Control Commands
//!
//! These are the commands sent to query a peer. Each of these commands is acknowledged by the
//! controller with a *Command Status* event and then later completed by a dedicated completion
//! event.

use crate::hci::events::Events;
use crate::hci::{CommandParameter, EventKey, EventMatcher};
use alloc::vec::Vec;
use core::fmt;

/// Query a remote device for its user-friendly name
pub mod remote_name_request {
    use crate::hci::{opcodes, BluetoothDeviceAddress, CommandParameter};

    const COMMAND: opcodes::HciCommand = opcodes::HciCommand::LinkControl(opcodes::LinkControl::RemoteNameRequest);

    /// The page scan repetition mode of a remote device
    ///
    /// This is reported by the remote device within an inquiry result. `R2` is used when the mode
    /// is not known.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum PageScanRepetitionMode {
        R0,
        R1,
        #[default]
        R2,
    }

    impl PageScanRepetitionMode {
        pub fn get_raw(&self) -> u8 {
            match self {
                PageScanRepetitionMode::R0 => 0x00,
                PageScanRepetitionMode::R1 => 0x01,
                PageScanRepetitionMode::R2 => 0x02,
            }
        }
    }

    /// The parameter of the remote name request command
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Parameter {
        pub bluetooth_address: BluetoothDeviceAddress,
        pub page_scan_repetition_mode: PageScanRepetitionMode,
        /// The clock offset without the valid flag
        ///
        /// This is `None` when the clock offset of the remote device is not known.
        pub clock_offset: Option<u16>,
    }

    impl Parameter {
        /// Flag set within the clock offset field when the clock offset is valid
        pub const CLOCK_OFFSET_VALID: u16 = 0x8000;
    }

    impl CommandParameter<10> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;

        fn get_parameter(&self) -> [u8; 10] {
            let mut parameter = [0u8; 10];

            parameter[..6].copy_from_slice(&self.bluetooth_address.0);

            parameter[6] = self.page_scan_repetition_mode.get_raw();

            // parameter[7] is reserved and must be zero

            let clock_offset = self
                .clock_offset
                .map(|offset| (offset & 0x7FFF) | Self::CLOCK_OFFSET_VALID)
                .unwrap_or_default();

            parameter[8..].copy_from_slice(&clock_offset.to_le_bytes());

            parameter
        }
    }
}

/// Query a connected device for page zero of its LMP features
pub mod read_remote_supported_features {
    use crate::hci::{opcodes, CommandParameter, ConnectionHandle};

    const COMMAND: opcodes::HciCommand =
        opcodes::HciCommand::LinkControl(opcodes::LinkControl::ReadRemoteSupportedFeatures);

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Parameter(pub ConnectionHandle);

    impl CommandParameter<2> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;

        fn get_parameter(&self) -> [u8; 2] {
            self.0.get_raw_handle().to_le_bytes()
        }
    }
}

/// Query a connected device for a page of its extended LMP features
pub mod read_remote_extended_features {
    use crate::hci::{opcodes, CommandParameter, ConnectionHandle};

    const COMMAND: opcodes::HciCommand =
        opcodes::HciCommand::LinkControl(opcodes::LinkControl::ReadRemoteExtendedFeatures);

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Parameter {
        pub connection_handle: ConnectionHandle,
        pub page_number: u8,
    }

    impl CommandParameter<3> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;

        fn get_parameter(&self) -> [u8; 3] {
            let [b0, b1] = self.connection_handle.get_raw_handle().to_le_bytes();

            [b0, b1, self.page_number]
        }
    }
}

/// Query a connected device for its Controller's version information
pub mod read_remote_version_information {
    use crate::hci::{opcodes, CommandParameter, ConnectionHandle};

    const COMMAND: opcodes::HciCommand =
        opcodes::HciCommand::LinkControl(opcodes::LinkControl::ReadRemoteVersionInformation);

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Parameter(pub ConnectionHandle);

    impl CommandParameter<2> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;

        fn get_parameter(&self) -> [u8; 2] {
            self.0.get_raw_handle().to_le_bytes()
        }
    }
}

/// A command sent to the controller
///
/// This is what is given to a [`CommandChannel`](crate::hci::CommandChannel).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    RemoteNameRequest(remote_name_request::Parameter),
    ReadRemoteSupportedFeatures(read_remote_supported_features::Parameter),
    ReadRemoteExtendedFeatures(read_remote_extended_features::Parameter),
    ReadRemoteVersionInformation(read_remote_version_information::Parameter),
}

impl Command {
    pub fn get_command(&self) -> crate::hci::opcodes::HciCommand {
        match self {
            Command::RemoteNameRequest(_) => <remote_name_request::Parameter as CommandParameter<10>>::COMMAND,
            Command::ReadRemoteSupportedFeatures(_) => {
                <read_remote_supported_features::Parameter as CommandParameter<2>>::COMMAND
            }
            Command::ReadRemoteExtendedFeatures(_) => {
                <read_remote_extended_features::Parameter as CommandParameter<3>>::COMMAND
            }
            Command::ReadRemoteVersionInformation(_) => {
                <read_remote_version_information::Parameter as CommandParameter<2>>::COMMAND
            }
        }
    }

    /// Get the HCI command packet
    pub fn as_command_packet(&self) -> Vec<u8> {
        match self {
            Command::RemoteNameRequest(p) => p.as_command_packet(),
            Command::ReadRemoteSupportedFeatures(p) => p.as_command_packet(),
            Command::ReadRemoteExtendedFeatures(p) => p.as_command_packet(),
            Command::ReadRemoteVersionInformation(p) => p.as_command_packet(),
        }
    }

    /// Get the matcher for the event that completes this command
    ///
    /// The *Remote Name Request Complete* event is matched by the address of the remote device,
    /// the other completion events are matched by the connection handle.
    pub fn completion_matcher(&self) -> EventMatcher {
        match self {
            Command::RemoteNameRequest(p) => EventMatcher {
                event: Events::RemoteNameRequestComplete,
                key: EventKey::Address(p.bluetooth_address),
            },
            Command::ReadRemoteSupportedFeatures(p) => EventMatcher {
                event: Events::ReadRemoteSupportedFeaturesComplete,
                key: EventKey::ConnectionHandle(p.0),
            },
            Command::ReadRemoteExtendedFeatures(p) => EventMatcher {
                event: Events::ReadRemoteExtendedFeaturesComplete,
                key: EventKey::ConnectionHandle(p.connection_handle),
            },
            Command::ReadRemoteVersionInformation(p) => EventMatcher {
                event: Events::ReadRemoteVersionInformationComplete,
                key: EventKey::ConnectionHandle(p.0),
            },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::RemoteNameRequest(p) => write!(f, "remote name request for {}", p.bluetooth_address),
            Command::ReadRemoteSupportedFeatures(p) => write!(f, "read remote supported features ({})", p.0),
            Command::ReadRemoteExtendedFeatures(p) => write!(
                f,
                "read remote extended features page {} ({})",
                p.page_number, p.connection_handle
            ),
            Command::ReadRemoteVersionInformation(p) => write!(f, "read remote version information ({})", p.0),
        }
    }
}
