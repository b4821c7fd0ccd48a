//! 支持的PCI设备表

use serde::{Deserialize, Serialize};
use std::fmt;

/// AMD的PCI厂商ID
pub const PCI_VENDOR_ID_AMD: u16 = 0x1022;

/// PCI厂商/设备ID对
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PciId {
    pub vendor: u16,
    pub device: u16,
}

impl PciId {
    pub const fn new(vendor: u16, device: u16) -> Self {
        Self { vendor, device }
    }

    /// 是否在驱动支持的设备表中
    pub fn is_supported(&self) -> bool {
        SUPPORTED_DEVICES.contains(self)
    }
}

impl fmt::Display for PciId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.device)
    }
}

/// 驱动可以绑定的设备
///
/// 新平台的设备ID可以从`lspci -nn`中00:00.0主桥的条目得到。
pub const SUPPORTED_DEVICES: &[PciId] = &[
    // Ryzen 7000 / Ryzen 7000X3D
    PciId::new(PCI_VENDOR_ID_AMD, 0x14d8),
];
