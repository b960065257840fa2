//! Controller Error Codes
//!
//! These are the status codes that a Controller returns within the events sent in response to
//! the commands used for interrogation.

use core::fmt::{self, Display, Formatter};

/// Generates [`Error`] along with the conversions to and from the raw error code
///
/// Each entry is the enum name, the raw code, and the description used by the `Display`
/// implementation.
macro_rules! controller_errors {
    ( $( $name:ident = $code:literal, $description:literal; )* ) => {
        /// A Controller Error
        ///
        /// `Error` is an enum of the controller error codes listed in volume one part F of the
        /// Bluetooth Core Specification. `Debug` prints the enum name with the raw code and
        /// `Display` prints a description of the error.
        ///
        /// ### `NoError`
        /// There is no official error for the code zero. It is used by events to signify there
        /// was no error.
        ///
        /// ### `Unknown`
        /// An error code that is not part of the Bluetooth Specification. This can be a
        /// manufacturer specific error code or a bug within the controller.
        ///
        /// ### `MissingErrorCode`
        /// The error code was not present. This means an event was received containing an
        /// incomplete event parameter.
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Hash)]
        pub enum Error {
            NoError,
            Unknown(u8),
            MissingErrorCode,
            $( $name, )*
        }

        impl From<u8> for Error {
            fn from(raw: u8) -> Self {
                match raw {
                    0x00 => Error::NoError,
                    $( $code => Error::$name, )*
                    _ => Error::Unknown(raw),
                }
            }
        }

        impl From<Error> for Option<u8> {
            fn from(error: Error) -> Self {
                match error {
                    Error::NoError => Some(0),
                    Error::Unknown(raw) => Some(raw),
                    Error::MissingErrorCode => None,
                    $( Error::$name => Some($code), )*
                }
            }
        }

        impl fmt::Debug for Error {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                match *self {
                    Error::NoError => f.write_str("NoError"),
                    Error::Unknown(raw) => write!(f, "Unknown Error Code (0x{:X})", raw),
                    Error::MissingErrorCode => f.write_str("MissingErrorCode"),
                    $( Error::$name => write!(f, "{} (0x{:X})", stringify!($name), $code), )*
                }
            }
        }

        impl Display for Error {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                match *self {
                    Error::NoError => f.write_str("no error"),
                    Error::Unknown(raw) => write!(f, "unknown error code (0x{:X})", raw),
                    Error::MissingErrorCode => f.write_str("missing error parameter"),
                    $(
                        Error::$name => write!(
                            f,
                            "controller error: {} (see the Bluetooth Core Specification vol 1, \
                            part F: Controller Error Codes)",
                            $description
                        ),
                    )*
                }
            }
        }
    };
}

controller_errors! {
    UnknownHciCommand = 0x01, "unknown HCI command";
    UnknownConnectionIdentifier = 0x02, "unknown connection identifier";
    HardwareFailure = 0x03, "hardware failure";
    PageTimeout = 0x04, "page timeout";
    AuthenticationFailure = 0x05, "authentication failure";
    PinOrKeyMissing = 0x06, "PIN or key missing";
    MemoryCapacityExceeded = 0x07, "memory capacity exceeded";
    ConnectionTimeout = 0x08, "connection timeout";
    ConnectionLimitExceeded = 0x09, "connection limit exceeded";
    SynchronousConnectionLimitToADeviceExceeded = 0x0a, "synchronous connection limit to a device exceeded";
    ConnectionAlreadyExists = 0x0b, "connection already exists";
    CommandDisallowed = 0x0c, "command disallowed";
    ConnectionRejectedDueToLimitedResources = 0x0d, "connection rejected due to limited resources";
    ConnectionRejectedDueToSecurityReasons = 0x0e, "connection rejected due to security reasons";
    ConnectionRejectedDueToUnacceptableBluetoothAddress = 0x0f,
        "connection rejected due to unacceptable bluetooth address";
    ConnectionAcceptTimeoutExceeded = 0x10, "connection accept timeout exceeded";
    UnsupportedFeatureOrParameterValue = 0x11, "unsupported feature or parameter value";
    InvalidHciCommandParameters = 0x12, "invalid HCI command parameters";
    RemoteUserTerminatedConnection = 0x13, "remote user terminated connection";
    RemoteDeviceTerminatedConnectionDueToLowResources = 0x14,
        "remote device terminated connection due to low resources";
    RemoteDeviceTerminatedConnectionDueToPowerOff = 0x15, "remote device terminated connection due to power off";
    ConnectionTerminatedByLocalHost = 0x16, "connection terminated by local host";
    RepeatedAttempts = 0x17, "repeated attempts";
    PairingNotAllowed = 0x18, "pairing not allowed";
    UnknownLmpPdu = 0x19, "unknown LMP PDU";
    UnsupportedRemoteFeature = 0x1a, "unsupported remote feature";
    ScoOffsetRejected = 0x1b, "SCO offset rejected";
    ScoIntervalRejected = 0x1c, "SCO interval rejected";
    ScoAirModeRejected = 0x1d, "SCO air mode rejected";
    InvalidLmpParametersOrInvalidLlParameters = 0x1e, "invalid LMP parameters / invalid LL parameters";
    UnspecifiedError = 0x1f, "unspecified error";
    UnsupportedLmpParameterValueOrUnsupportedLlParameterValue = 0x20,
        "unsupported LMP parameter value / unsupported LL parameter value";
    RoleChangeNotAllowed = 0x21, "role change not allowed";
    LmpResponseTimeoutOrLlResponseTimeout = 0x22, "LMP response timeout / LL response timeout";
    LmpErrorTransactionCollisionOrLlProcedureCollision = 0x23,
        "LMP error transaction collision / LL procedure collision";
    LmpPduNotAllowed = 0x24, "LMP PDU not allowed";
    EncryptionModeNotAcceptable = 0x25, "encryption mode not acceptable";
    LinkKeyCannotBeChanged = 0x26, "link key cannot be changed";
    RequestedQosNotSupported = 0x27, "requested QoS not supported";
    InstantPassed = 0x28, "instant passed";
    PairingWithUnitKeyNotSupported = 0x29, "pairing with unit key not supported";
    DifferentTransactionCollision = 0x2a, "different transaction collision";
    QosUnacceptableParameter = 0x2c, "QoS unacceptable parameter";
    QosRejected = 0x2d, "QoS rejected";
    ChannelAssessmentNotSupported = 0x2e, "channel assessment not supported";
    InsufficientSecurity = 0x2f, "insufficient security";
    ParameterOutOfMandatoryRange = 0x30, "parameter out of mandatory range";
    RoleSwitchPending = 0x32, "role switch pending";
    ReservedSlotViolation = 0x34, "reserved slot violation";
    RoleSwitchFailed = 0x35, "role switch failed";
    ExtendedInquiryResponseTooLarge = 0x36, "extended inquiry response too large";
    SimplePairingNotSupportedByHost = 0x37, "simple pairing not supported by host";
    HostBusyBecausePairing = 0x38, "host busy because pairing";
    ConnectionRejectedDueToNoSuitableChannelFound = 0x39, "connection rejected due to no suitable channel found";
    ControllerBusy = 0x3a, "controller busy";
    UnacceptableConnectionParameters = 0x3b, "unacceptable connection parameters";
    AdvertisingTimeout = 0x3c, "advertising timeout";
    ConnectionTerminatedDueToMicFailure = 0x3d, "connection terminated due to MIC failure";
    ConnectionFailedToBeEstablishedOrSynchronizationTimeout = 0x3e,
        "connection failed to be established / synchronization timeout";
    CoarseClockAdjustmentRejectedButWillTryToAdjustUsingClockDragging = 0x40,
        "coarse clock adjustment rejected but will try to adjust using clock dragging";
    Type0SubmapNotDefined = 0x41, "type0 sub-map not defined";
    UnknownAdvertisingIdentifier = 0x42, "unknown advertising identifier";
    LimitReached = 0x43, "limit reached";
    OperationCancelledByHost = 0x44, "operation cancelled by host";
    PacketTooLong = 0x45, "packet too long";
}

impl Error {
    /// Convert into a `Result`
    ///
    /// `NoError` is converted into `Ok(())`, every other error is mapped by `err`.
    pub fn ok_or_else<F, E>(self, err: F) -> Result<(), E>
    where
        F: FnOnce(Self) -> E,
    {
        if let Error::NoError = self {
            Ok(())
        } else {
            Err(err(self))
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_code_conversions() {
        assert_eq!(Error::NoError, Error::from(0));
        assert_eq!(Error::UnspecifiedError, Error::from(0x1f));
        assert_eq!(Error::PageTimeout, Error::from(0x04));

        // 0x2b is reserved by the specification
        assert_eq!(Error::Unknown(0x2b), Error::from(0x2b));

        assert_eq!(Some(0x1f), Option::<u8>::from(Error::UnspecifiedError));
        assert_eq!(None, Option::<u8>::from(Error::MissingErrorCode));
    }

    #[test]
    fn ok_or_else() {
        assert_eq!(Ok(()), Error::NoError.ok_or_else(|e| e));
        assert_eq!(Err(Error::PageTimeout), Error::PageTimeout.ok_or_else(|e| e));
    }
}
