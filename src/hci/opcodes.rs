//! HCI Command Opcodes
//!
//! Opcodes are composed of a group identifier and an individual command identifier specific to the
//! group. Only the link control group is used for interrogating a peer.
//!
//! ```
//! # use bo_tie_interrogator::hci::opcodes::{HciCommand, LinkControl};
//!
//! assert_eq!(0x41D, HciCommand::LinkControl(LinkControl::ReadRemoteVersionInformation).into_opcode());
//! ```

/// Enumerations of the HCI command opcodes
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HciCommand {
    LinkControl(LinkControl),
}

impl HciCommand {
    /// Get the opcode for this command
    pub const fn into_opcode(self) -> u16 {
        self.into_opcode_pair().into_opcode()
    }

    /// Get the `OpCodePair` for this command
    pub const fn into_opcode_pair(self) -> OpCodePair {
        match self {
            HciCommand::LinkControl(ocf) => ocf.into_opcode_pair(),
        }
    }
}

impl core::fmt::Display for HciCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            HciCommand::LinkControl(c) => {
                let opcode = c.into_opcode_pair();

                write!(f, "link control - {} ({:#x}:{:#x})", c, opcode.ogf, opcode.ocf)
            }
        }
    }
}

/// An type for the pair of OGF (OpCode Group Field) and OCF (OpCode Command Field)
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct OpCodePair {
    pub ogf: u16,
    pub ocf: u16,
}

impl OpCodePair {
    /// Convert the OpCodePair into the opcode
    ///
    /// The returned value is the OpCode used with building a HCI command Packet.
    pub const fn into_opcode(self) -> u16 {
        // The first 10 bits of the OpCode is the OCF field and the last 6 bits is the OGF field.
        (self.ocf & 0x3FFu16) | (self.ogf << 10)
    }
}

impl From<HciCommand> for OpCodePair {
    fn from(cmd: HciCommand) -> OpCodePair {
        cmd.into_opcode_pair()
    }
}

/// Link control commands
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum LinkControl {
    RemoteNameRequest,
    ReadRemoteSupportedFeatures,
    ReadRemoteExtendedFeatures,
    ReadRemoteVersionInformation,
}

impl LinkControl {
    const OGF: u16 = 0x1;

    const fn into_opcode_pair(self) -> OpCodePair {
        use self::LinkControl::*;

        OpCodePair {
            ogf: LinkControl::OGF,
            ocf: match self {
                RemoteNameRequest => 0x19,
                ReadRemoteSupportedFeatures => 0x1b,
                ReadRemoteExtendedFeatures => 0x1c,
                ReadRemoteVersionInformation => 0x1d,
            },
        }
    }
}

impl core::fmt::Display for LinkControl {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            LinkControl::RemoteNameRequest => f.write_str("remote name request"),
            LinkControl::ReadRemoteSupportedFeatures => f.write_str("read remote supported features"),
            LinkControl::ReadRemoteExtendedFeatures => f.write_str("read remote extended features"),
            LinkControl::ReadRemoteVersionInformation => f.write_str("read remote version information"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_control_opcodes() {
        let opcode = |command| HciCommand::LinkControl(command).into_opcode();

        assert_eq!(0x0419, opcode(LinkControl::RemoteNameRequest));
        assert_eq!(0x041B, opcode(LinkControl::ReadRemoteSupportedFeatures));
        assert_eq!(0x041C, opcode(LinkControl::ReadRemoteExtendedFeatures));

        assert_eq!(
            OpCodePair { ogf: 0x1, ocf: 0x1d },
            OpCodePair::from(HciCommand::LinkControl(LinkControl::ReadRemoteVersionInformation))
        );
    }
}
