//! BR/EDR Peer Interrogation
//!
//! After a BR/EDR connection is established the host queries the peer device for the information
//! it needs before any profile can use the link. This is the *interrogation* of the peer. It
//! consists of the remote name, the LMP version information, and the supported LMP features
//! (including the extended feature pages when the peer supports them).
//!
//! ## Commands
//! The HCI commands and events used for interrogation are within the module [`hci`]. Sending of
//! commands and the routing of events is done by the implementation of [`CommandChannel`]. This
//! library only builds the command parameters and parses the event parameters.
//!
//! ## Peers
//! The information discovered about a peer is written into its [`PeerRecord`] within a
//! [`PeerCache`]. Fields of the record are only ever filled in by interrogation, so an
//! interrogation started for a peer that was interrogated before will only query for the
//! information that is still missing.
//!
//! ## Interrogation
//! An [`Interrogator`] starts a [`Session`] for a peer and the connection handle of its link. The
//! session is a future that must be polled to completion; the completion callback is called once
//! with the aggregate result of every query made by the session.
//!
//! [`CommandChannel`]: hci::CommandChannel
//! [`PeerRecord`]: peer::PeerRecord
//! [`PeerCache`]: peer::PeerCache
//! [`Interrogator`]: interrogator::Interrogator
//! [`Session`]: interrogator::Session

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod errors;
pub mod features;
pub mod hci;
pub mod interrogator;
pub mod peer;

pub use features::{FeaturePages, LmpFeature};
pub use hci::{BluetoothDeviceAddress, CommandChannel, ConnectionHandle};
pub use interrogator::{Interrogator, Session};
pub use peer::{PeerCache, PeerId, PeerRecord};
