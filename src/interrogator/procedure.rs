//! Interrogation procedures
//!
//! A procedure is one query of a peer. It sends a single command and is resolved by the event
//! that completes the command. Processing of the event is a plain function of the procedure kind
//! and the event, the result is a [`Transition`] containing the update to the peer record and the
//! next procedure of the extended features cascade (if any).

use super::Error;
use crate::errors;
use crate::features::{FeaturePages, LmpFeature};
use crate::hci::events::{
    EventError, EventPacket, Events, ReadRemoteExtendedFeaturesCompleteData, ReadRemoteSupportedFeaturesCompleteData,
    ReadRemoteVersionInformationCompleteData, RemoteNameRequestCompleteData,
};
use crate::hci::link_control::{
    read_remote_extended_features, read_remote_supported_features, read_remote_version_information,
    remote_name_request, Command,
};
use crate::hci::{BluetoothDeviceAddress, CommandFailure, ConnectionHandle};
use crate::peer::{PeerRecord, VersionInfo};
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

/// The kind of a procedure
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ProcedureKind {
    NameQuery,
    VersionQuery,
    FeaturesQuery,
    /// Query for an extended features page
    ExtendedFeaturesQuery(u8),
}

impl ProcedureKind {
    /// Select the procedures for the information not yet known about `peer`
    ///
    /// The returned procedures are in the order their commands are sent. When page zero of the
    /// features is already known and the peer has extended features, the features query is skipped
    /// and the extended features cascade is started from page one.
    pub fn select(peer: &PeerRecord) -> Vec<ProcedureKind> {
        let mut procedures = Vec::with_capacity(3);

        if peer.name().is_none() {
            procedures.push(ProcedureKind::NameQuery);
        } else {
            log::debug!("(GAP) name of peer {} is known", peer.identifier());
        }

        if peer.version().is_none() {
            procedures.push(ProcedureKind::VersionQuery);
        } else {
            log::debug!("(GAP) version of peer {} is known", peer.identifier());
        }

        if !peer.features().has_page(0) {
            procedures.push(ProcedureKind::FeaturesQuery);
        } else if peer.features().has_feature(LmpFeature::ExtendedFeatures) {
            log::debug!(
                "(GAP) features page 0 of peer {} is known, reading extended features",
                peer.identifier()
            );

            procedures.push(ProcedureKind::ExtendedFeaturesQuery(1));
        } else {
            log::debug!("(GAP) features of peer {} are known", peer.identifier());
        }

        procedures
    }

    /// Create the command sent for this procedure
    pub fn command(&self, peer: &PeerRecord, connection_handle: ConnectionHandle) -> Command {
        match *self {
            ProcedureKind::NameQuery => Command::RemoteNameRequest(remote_name_request::Parameter {
                bluetooth_address: peer.address(),
                page_scan_repetition_mode: peer.page_scan_repetition_mode().unwrap_or_default(),
                clock_offset: peer.clock_offset(),
            }),
            ProcedureKind::VersionQuery => Command::ReadRemoteVersionInformation(
                read_remote_version_information::Parameter(connection_handle),
            ),
            ProcedureKind::FeaturesQuery => {
                Command::ReadRemoteSupportedFeatures(read_remote_supported_features::Parameter(connection_handle))
            }
            ProcedureKind::ExtendedFeaturesQuery(page_number) => {
                Command::ReadRemoteExtendedFeatures(read_remote_extended_features::Parameter {
                    connection_handle,
                    page_number,
                })
            }
        }
    }

    fn expected_event(&self) -> Events {
        match self {
            ProcedureKind::NameQuery => Events::RemoteNameRequestComplete,
            ProcedureKind::VersionQuery => Events::ReadRemoteVersionInformationComplete,
            ProcedureKind::FeaturesQuery => Events::ReadRemoteSupportedFeaturesComplete,
            ProcedureKind::ExtendedFeaturesQuery(_) => Events::ReadRemoteExtendedFeaturesComplete,
        }
    }

    /// Process the event completing this procedure
    ///
    /// The event must be for the peer at `address` on the connection `connection_handle`.
    pub fn process<E>(
        &self,
        address: BluetoothDeviceAddress,
        connection_handle: ConnectionHandle,
        event: &EventPacket,
    ) -> Result<Transition, Error<E>> {
        log::trace!("(GAP) {} event parameter: {:x?}", self, event.get_parameter());

        let expected = self.expected_event();

        match *self {
            ProcedureKind::NameQuery => {
                let data: RemoteNameRequestCompleteData = event.try_into_data(expected)?;

                if data.bluetooth_address != address {
                    return Err(Error::UnexpectedEvent);
                }

                check_status(data.status)?;

                Ok(Transition::new(PeerUpdate::Name(data.remote_name), None))
            }
            ProcedureKind::VersionQuery => {
                let data: ReadRemoteVersionInformationCompleteData = event.try_into_data(expected)?;

                check_handle(data.connection_handle, connection_handle)?;

                check_status(data.status)?;

                let version = VersionInfo {
                    manufacturer: data.manufacturer_name,
                    lmp_version: data.version,
                    lmp_subversion: data.subversion,
                };

                Ok(Transition::new(PeerUpdate::Version(version), None))
            }
            ProcedureKind::FeaturesQuery => {
                let data: ReadRemoteSupportedFeaturesCompleteData = event.try_into_data(expected)?;

                check_handle(data.connection_handle, connection_handle)?;

                check_status(data.status)?;

                let extended = data.lmp_features & (1 << LmpFeature::ExtendedFeatures.bit()) != 0;

                let next = extended.then_some(ProcedureKind::ExtendedFeaturesQuery(1));

                Ok(Transition::new(PeerUpdate::Features(data.lmp_features), next))
            }
            ProcedureKind::ExtendedFeaturesQuery(requested) => {
                let data: ReadRemoteExtendedFeaturesCompleteData = event.try_into_data(expected)?;

                check_handle(data.connection_handle, connection_handle)?;

                check_status(data.status)?;

                if data.page_number != requested {
                    return Err(Error::Malformed(EventError::UnexpectedPage {
                        requested,
                        received: data.page_number,
                    }));
                }

                let last_page = core::cmp::min(data.maximum_page_number, FeaturePages::MAX_PAGE);

                let next = (requested < last_page).then(|| ProcedureKind::ExtendedFeaturesQuery(requested + 1));

                let update = PeerUpdate::ExtendedFeatures {
                    page: data.page_number,
                    maximum_page: data.maximum_page_number,
                    features: data.extended_lmp_features,
                };

                Ok(Transition::new(update, next))
            }
        }
    }
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProcedureKind::NameQuery => f.write_str("name query"),
            ProcedureKind::VersionQuery => f.write_str("version query"),
            ProcedureKind::FeaturesQuery => f.write_str("features query"),
            ProcedureKind::ExtendedFeaturesQuery(page) => write!(f, "extended features query (page {})", page),
        }
    }
}

fn check_status<E>(status: errors::Error) -> Result<(), Error<E>> {
    status.ok_or_else(Error::Status)
}

fn check_handle<E>(received: ConnectionHandle, expected: ConnectionHandle) -> Result<(), Error<E>> {
    if received == expected {
        Ok(())
    } else {
        Err(Error::UnexpectedEvent)
    }
}

/// An update to a peer record
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PeerUpdate {
    Name(String),
    Version(VersionInfo),
    /// Page zero of the features
    Features(u64),
    ExtendedFeatures {
        page: u8,
        maximum_page: u8,
        features: u64,
    },
}

impl PeerUpdate {
    /// Apply the update to `peer`
    pub fn apply(self, peer: &mut PeerRecord) {
        match self {
            PeerUpdate::Name(name) => peer.set_name(name),
            PeerUpdate::Version(version) => peer.set_version(version),
            PeerUpdate::Features(features) => {
                peer.features_mut().set_page(0, features);
            }
            PeerUpdate::ExtendedFeatures {
                page,
                maximum_page,
                features,
            } => {
                let pages = peer.features_mut();

                pages.set_page(page, features);

                let last_page = core::cmp::max(page, maximum_page);

                if last_page > pages.last_page_number() {
                    pages.set_last_page_number(last_page);
                }
            }
        }
    }
}

/// The outcome of a successful procedure
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transition {
    pub update: PeerUpdate,
    /// The procedure to launch next
    pub next: Option<ProcedureKind>,
}

impl Transition {
    fn new(update: PeerUpdate, next: Option<ProcedureKind>) -> Self {
        Transition { update, next }
    }
}

/// An in-flight procedure
///
/// This is the completion future of the command sent for the procedure, tagged with the kind of
/// procedure.
pub(crate) struct Procedure<C> {
    kind: ProcedureKind,
    completion: C,
}

impl<C> Procedure<C> {
    pub fn new(kind: ProcedureKind, completion: C) -> Self {
        Procedure { kind, completion }
    }
}

impl<C, E> Future for Procedure<C>
where
    C: Future<Output = Result<EventPacket, CommandFailure<E>>>,
{
    type Output = (ProcedureKind, Result<EventPacket, CommandFailure<E>>);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let kind = self.kind;

        // SAFETY: `completion` is never moved out of a pinned `Procedure`
        let completion = unsafe { self.map_unchecked_mut(|procedure| &mut procedure.completion) };

        completion.poll(cx).map(|outcome| (kind, outcome))
    }
}
