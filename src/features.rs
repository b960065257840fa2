//! LMP Features
//!
//! The features of a BR/EDR device are reported in pages of 64 bits. Page zero is the base page
//! returned by the *Read Remote Supported Features* command, pages one and two are the extended
//! pages returned by the *Read Remote Extended Features* command. A device only has extended pages
//! if the feature [`ExtendedFeatures`] is set within page zero.
//!
//! [`ExtendedFeatures`]: LmpFeature::ExtendedFeatures

use core::fmt;

/// Generates [`LmpFeature`] from a table of features
///
/// Each entry is the feature followed by the page it is in and the bit position within the page.
macro_rules! lmp_features {
    ( $( $(#[$attrs:meta])* $name:ident = ($page:literal, $bit:literal), )* ) => {
        /// An LMP feature
        ///
        /// This is the enumeration of the LMP features within pages zero through two.
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
        pub enum LmpFeature {
            $( $(#[$attrs])* $name, )*
        }

        impl LmpFeature {
            /// All features in order of page and then bit position
            pub const ALL: &'static [LmpFeature] = &[ $( LmpFeature::$name, )* ];

            /// Get the page containing this feature
            pub fn page(&self) -> u8 {
                match self {
                    $( LmpFeature::$name => $page, )*
                }
            }

            /// Get the position of the feature bit within its page
            pub fn bit(&self) -> u8 {
                match self {
                    $( LmpFeature::$name => $bit, )*
                }
            }
        }
    };
}

lmp_features! {
    ThreeSlotPackets = (0, 0),
    FiveSlotPackets = (0, 1),
    Encryption = (0, 2),
    SlotOffset = (0, 3),
    TimingAccuracy = (0, 4),
    RoleSwitch = (0, 5),
    HoldMode = (0, 6),
    SniffMode = (0, 7),
    PowerControlRequests = (0, 9),
    /// CQDDR
    ChannelQualityDrivenDataRate = (0, 10),
    ScoLink = (0, 11),
    Hv2Packets = (0, 12),
    Hv3Packets = (0, 13),
    MuLawLogSynchronousData = (0, 14),
    ALawLogSynchronousData = (0, 15),
    CvsdSynchronousData = (0, 16),
    PagingParameterNegotiation = (0, 17),
    PowerControl = (0, 18),
    TransparentSynchronousData = (0, 19),
    BroadcastEncryption = (0, 23),
    EnhancedDataRateAcl2MbsMode = (0, 25),
    EnhancedDataRateAcl3MbsMode = (0, 26),
    EnhancedInquiryScan = (0, 27),
    InterlacedInquiryScan = (0, 28),
    InterlacedPageScan = (0, 29),
    RssiWithInquiryResults = (0, 30),
    /// EV3 packets
    ExtendedScoLink = (0, 31),
    Ev4Packets = (0, 32),
    Ev5Packets = (0, 33),
    AfhCapablePeripheral = (0, 35),
    AfhClassificationPeripheral = (0, 36),
    BrEdrNotSupported = (0, 37),
    LeSupportedController = (0, 38),
    ThreeSlotEnhancedDataRateAclPackets = (0, 39),
    FiveSlotEnhancedDataRateAclPackets = (0, 40),
    SniffSubrating = (0, 41),
    PauseEncryption = (0, 42),
    AfhCapableCentral = (0, 43),
    AfhClassificationCentral = (0, 44),
    EnhancedDataRateEsco2MbsMode = (0, 45),
    EnhancedDataRateEsco3MbsMode = (0, 46),
    ThreeSlotEnhancedDataRateEscoPackets = (0, 47),
    ExtendedInquiryResponse = (0, 48),
    SimultaneousLeAndBrEdrToSameDeviceCapable = (0, 49),
    SecureSimplePairing = (0, 51),
    EncapsulatedPdu = (0, 52),
    ErroneousDataReporting = (0, 53),
    NonFlushablePacketBoundaryFlag = (0, 54),
    LinkSupervisionTimeoutChangedEvent = (0, 56),
    InquiryTxPowerLevel = (0, 57),
    EnhancedPowerControl = (0, 58),
    /// The device has extended feature pages
    ExtendedFeatures = (0, 63),
    SecureSimplePairingHostSupport = (1, 0),
    LeSupportedByHost = (1, 1),
    SimultaneousLeAndBrEdrToSameDeviceCapableByHost = (1, 2),
    SecureConnectionsHostSupport = (1, 3),
    ConnectionlessPeripheralBroadcastCentralOperation = (2, 0),
    ConnectionlessPeripheralBroadcastPeripheralOperation = (2, 1),
    SynchronizationTrain = (2, 2),
    SynchronizationScan = (2, 3),
    InquiryResponseNotificationEvent = (2, 4),
    GeneralizedInterlacedScan = (2, 5),
    CoarseClockAdjustment = (2, 6),
    SecureConnectionsControllerSupport = (2, 8),
    Ping = (2, 9),
    SlotAvailabilityMask = (2, 10),
    TrainNudging = (2, 11),
}

/// The feature pages of a device
///
/// A page is only present once it has been read from the device.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeaturePages {
    pages: [Option<u64>; FeaturePages::MAX_PAGE as usize + 1],
    last_page_number: u8,
}

impl FeaturePages {
    /// The last extended page defined by the Bluetooth Core Specification
    pub const MAX_PAGE: u8 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Check if page `page` has been set
    pub fn has_page(&self, page: u8) -> bool {
        self.page(page).is_some()
    }

    /// Get the bits of page `page`
    pub fn page(&self, page: u8) -> Option<u64> {
        self.pages.get(page as usize).copied().flatten()
    }

    /// Set the bits of page `page`
    ///
    /// The page is ignored and `false` is returned if `page` is larger than [`MAX_PAGE`].
    ///
    /// [`MAX_PAGE`]: FeaturePages::MAX_PAGE
    pub fn set_page(&mut self, page: u8, bits: u64) -> bool {
        match self.pages.get_mut(page as usize) {
            Some(entry) => {
                *entry = Some(bits);
                true
            }
            None => false,
        }
    }

    /// Check if the bit at position `bit` of page `page` is set
    ///
    /// `false` is returned if the page is not set.
    pub fn has_bit(&self, page: u8, bit: u8) -> bool {
        bit < 64 && self.page(page).map(|bits| bits & (1 << bit) != 0).unwrap_or_default()
    }

    /// Check if a feature is supported
    pub fn has_feature(&self, feature: LmpFeature) -> bool {
        self.has_bit(feature.page(), feature.bit())
    }

    /// Get the number of the highest page the device reported supporting
    ///
    /// This is zero until an extended page is read.
    pub fn last_page_number(&self) -> u8 {
        self.last_page_number
    }

    /// Set the last page number
    ///
    /// The page number is capped at [`MAX_PAGE`] as there are no higher pages.
    ///
    /// [`MAX_PAGE`]: FeaturePages::MAX_PAGE
    pub fn set_last_page_number(&mut self, page: u8) {
        self.last_page_number = core::cmp::min(page, Self::MAX_PAGE)
    }

    /// Iterate over the supported features within the set pages
    pub fn enabled_features(&self) -> impl Iterator<Item = LmpFeature> + '_ {
        LmpFeature::ALL.iter().copied().filter(move |feature| self.has_feature(*feature))
    }
}

impl fmt::Display for FeaturePages {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("[")?;

        for (page, bits) in self.pages.iter().enumerate() {
            if page != 0 {
                f.write_str(", ")?;
            }

            match bits {
                Some(bits) => write!(f, "page {}: {:#018x}", page, bits)?,
                None => write!(f, "page {}: unknown", page)?,
            }
        }

        write!(f, "] (last page {})", self.last_page_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_positions() {
        assert_eq!((0, 63), (LmpFeature::ExtendedFeatures.page(), LmpFeature::ExtendedFeatures.bit()));
        assert_eq!((0, 51), (LmpFeature::SecureSimplePairing.page(), LmpFeature::SecureSimplePairing.bit()));
        assert_eq!(
            (2, 8),
            (
                LmpFeature::SecureConnectionsControllerSupport.page(),
                LmpFeature::SecureConnectionsControllerSupport.bit()
            )
        );
    }

    #[test]
    fn pages() {
        let mut pages = FeaturePages::new();

        assert!(!pages.has_page(0));
        assert!(!pages.has_feature(LmpFeature::ExtendedFeatures));

        assert!(pages.set_page(0, 1 << 63 | 1));
        assert!(pages.set_page(1, 0x0F));
        assert!(!pages.set_page(3, 0xFF));

        assert!(pages.has_page(0));
        assert!(pages.has_page(1));
        assert!(!pages.has_page(2));
        assert!(!pages.has_page(3));

        assert!(pages.has_feature(LmpFeature::ExtendedFeatures));
        assert!(pages.has_feature(LmpFeature::SecureConnectionsHostSupport));
        assert!(!pages.has_bit(0, 64));

        let enabled: Vec<_> = pages.enabled_features().collect();

        assert_eq!(
            vec![
                LmpFeature::ThreeSlotPackets,
                LmpFeature::ExtendedFeatures,
                LmpFeature::SecureSimplePairingHostSupport,
                LmpFeature::LeSupportedByHost,
                LmpFeature::SimultaneousLeAndBrEdrToSameDeviceCapableByHost,
                LmpFeature::SecureConnectionsHostSupport,
            ],
            enabled
        );
    }

    #[test]
    fn last_page_number_is_capped() {
        let mut pages = FeaturePages::new();

        assert_eq!(0, pages.last_page_number());

        pages.set_last_page_number(7);

        assert_eq!(FeaturePages::MAX_PAGE, pages.last_page_number());

        pages.set_last_page_number(1);

        assert_eq!(1, pages.last_page_number());
    }
}
