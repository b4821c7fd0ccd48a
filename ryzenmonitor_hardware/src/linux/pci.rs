//! sysfs PCI配置空间访问与设备发现

use crate::device::PciId;
use crate::error::{HardwareResult, IoContext};
use crate::host::ConfigBus;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

/// sysfs中PCI设备目录
pub const DEFAULT_PCI_DEVICES_ROOT: &str = "/sys/bus/pci/devices";

/// 通过sysfs `config`文件访问单个设备的配置空间
#[derive(Debug)]
pub struct SysfsConfigBus {
    config: File,
}

impl SysfsConfigBus {
    /// 以读写方式打开设备目录下的`config`
    pub fn open<P: AsRef<Path>>(device_dir: P) -> io::Result<Self> {
        let config = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device_dir.as_ref().join("config"))?;
        Ok(Self { config })
    }
}

impl ConfigBus for SysfsConfigBus {
    fn write_dword(&self, offset: u16, value: u32) -> HardwareResult<()> {
        self.config
            .write_all_at(&value.to_le_bytes(), u64::from(offset))
            .config_space(offset)
    }

    fn read_dword(&self, offset: u16) -> HardwareResult<u32> {
        let mut buf = [0u8; 4];
        self.config
            .read_exact_at(&mut buf, u64::from(offset))
            .config_space(offset)?;
        Ok(u32::from_le_bytes(buf))
    }
}

/// sysfs中发现的PCI设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PciDeviceInfo {
    /// 例如`0000:00:00.0`
    pub address: String,
    pub id: PciId,
    pub path: PathBuf,
}

impl PciDeviceInfo {
    /// 读取设备目录下的`vendor`与`device`文件
    pub fn from_dir<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let address = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "device path has no name"))?;
        let id = PciId::new(read_hex_id(&path.join("vendor"))?, read_hex_id(&path.join("device"))?);
        Ok(Self {
            address,
            id,
            path: path.to_path_buf(),
        })
    }

    /// 打开该设备的配置空间
    pub fn open_config_bus(&self) -> io::Result<SysfsConfigBus> {
        SysfsConfigBus::open(&self.path)
    }
}

/// 解析sysfs中`0x1022`形式的ID
fn read_hex_id(path: &Path) -> io::Result<u16> {
    let text = fs::read_to_string(path)?;
    let digits = text.trim().trim_start_matches("0x");
    u16::from_str_radix(digits, 16).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {}", path.display(), e),
        )
    })
}

/// 扫描PCI设备目录，返回第一个在设备表中的设备
///
/// 无法解析的条目会被跳过。
pub fn find_supported_device<P: AsRef<Path>>(root: P) -> io::Result<Option<PciDeviceInfo>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        match PciDeviceInfo::from_dir(&path) {
            Ok(info) if info.id.is_supported() => {
                tracing::debug!(target: "pci", "Found supported device {} ({})", info.address, info.id);
                return Ok(Some(info));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::trace!(target: "pci", "Skipping {}: {}", path.display(), e);
            }
        }
    }
    Ok(None)
}
