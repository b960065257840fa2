//! Peer Records
//!
//! A [`PeerRecord`] is the information known about a peer device. Records are kept within a
//! [`PeerCache`] for as long as the cache lives, so what is learned about a peer during one
//! connection is still known for the next connection.

use crate::features::FeaturePages;
use crate::hci::BluetoothDeviceAddress;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

pub use crate::hci::link_control::remote_name_request::PageScanRepetitionMode;

/// The identifier of a peer
///
/// Identifiers are assigned by a [`PeerCache`] and are never reused by the cache.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The version information of the Link Manager of a peer
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionInfo {
    /// The company identifier of the manufacturer
    pub manufacturer: u16,
    pub lmp_version: u8,
    pub lmp_subversion: u16,
}

impl VersionInfo {
    /// Get the version of the Bluetooth Core Specification for the LMP version
    ///
    /// `None` is returned for versions that are not assigned.
    pub fn core_version(&self) -> Option<&'static str> {
        match self.lmp_version {
            0 => Some("1.0b"),
            1 => Some("1.1"),
            2 => Some("1.2"),
            3 => Some("2.0 + EDR"),
            4 => Some("2.1 + EDR"),
            5 => Some("3.0 + HS"),
            6 => Some("4.0"),
            7 => Some("4.1"),
            8 => Some("4.2"),
            9 => Some("5.0"),
            10 => Some("5.1"),
            11 => Some("5.2"),
            12 => Some("5.3"),
            13 => Some("5.4"),
            _ => None,
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.core_version() {
            Some(version) => write!(f, "Bluetooth {}", version)?,
            None => write!(f, "LMP version {:#x}", self.lmp_version)?,
        }

        write!(
            f,
            " (manufacturer: {:#06x}, subversion: {:#06x})",
            self.manufacturer, self.lmp_subversion
        )
    }
}

/// The information known about a peer
///
/// The optional fields are `None` until they are discovered. Once set a field is only ever
/// replaced by a newer value, it is never cleared.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeerRecord {
    identifier: PeerId,
    address: BluetoothDeviceAddress,
    name: Option<String>,
    version: Option<VersionInfo>,
    features: FeaturePages,
    page_scan_repetition_mode: Option<PageScanRepetitionMode>,
    clock_offset: Option<u16>,
}

impl PeerRecord {
    pub fn new(identifier: PeerId, address: BluetoothDeviceAddress) -> Self {
        PeerRecord {
            identifier,
            address,
            name: None,
            version: None,
            features: FeaturePages::default(),
            page_scan_repetition_mode: None,
            clock_offset: None,
        }
    }

    pub fn identifier(&self) -> PeerId {
        self.identifier
    }

    pub fn address(&self) -> BluetoothDeviceAddress {
        self.address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = Some(name.into())
    }

    pub fn version(&self) -> Option<&VersionInfo> {
        self.version.as_ref()
    }

    pub fn set_version(&mut self, version: VersionInfo) {
        self.version = Some(version)
    }

    pub fn features(&self) -> &FeaturePages {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeaturePages {
        &mut self.features
    }

    pub fn page_scan_repetition_mode(&self) -> Option<PageScanRepetitionMode> {
        self.page_scan_repetition_mode
    }

    /// Set the page scan repetition mode
    ///
    /// This is usually learned from an inquiry result.
    pub fn set_page_scan_repetition_mode(&mut self, mode: PageScanRepetitionMode) {
        self.page_scan_repetition_mode = Some(mode)
    }

    /// Get the clock offset
    ///
    /// This is bits 16 through 2 of the difference between the peer's clock and this device's
    /// clock.
    pub fn clock_offset(&self) -> Option<u16> {
        self.clock_offset
    }

    pub fn set_clock_offset(&mut self, clock_offset: u16) {
        self.clock_offset = Some(clock_offset & 0x7FFF)
    }
}

/// A shared handle to a [`PeerRecord`]
pub type PeerHandle = Rc<RefCell<PeerRecord>>;

/// The in-memory store of peer records
#[derive(Debug, Default)]
pub struct PeerCache {
    next_id: u64,
    peers: Vec<PeerHandle>,
}

impl PeerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new record for the peer with the address `address`
    ///
    /// `None` is returned if there is already a record for the address.
    pub fn new_peer(&mut self, address: BluetoothDeviceAddress) -> Option<PeerHandle> {
        if self.find_by_address(address).is_some() {
            return None;
        }

        Some(self.insert(address))
    }

    /// Get the record for the peer with the address `address`, creating it if needed
    pub fn get_or_create(&mut self, address: BluetoothDeviceAddress) -> PeerHandle {
        match self.find_by_address(address) {
            Some(peer) => peer,
            None => self.insert(address),
        }
    }

    fn insert(&mut self, address: BluetoothDeviceAddress) -> PeerHandle {
        let identifier = PeerId(self.next_id);

        self.next_id += 1;

        let peer = Rc::new(RefCell::new(PeerRecord::new(identifier, address)));

        self.peers.push(peer.clone());

        log::debug!("(GAP) new peer {} with address {}", identifier, address);

        peer
    }

    pub fn find_by_id(&self, identifier: PeerId) -> Option<PeerHandle> {
        self.peers
            .iter()
            .find(|peer| peer.borrow().identifier == identifier)
            .cloned()
    }

    pub fn find_by_address(&self, address: BluetoothDeviceAddress) -> Option<PeerHandle> {
        self.peers.iter().find(|peer| peer.borrow().address == address).cloned()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
