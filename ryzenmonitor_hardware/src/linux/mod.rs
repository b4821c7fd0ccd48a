//! Linux主机后端
//!
//! - PCI配置空间：`/sys/bus/pci/devices/<bdf>/config`
//! - MSR：`/dev/cpu/<n>/msr`（需要加载`msr`内核模块）
//! - CPU识别：CPUID + `/sys/devices/system/cpu/online`

pub mod cpu;
pub mod msr;
pub mod pci;

pub use cpu::{count_cpu_list, NativeCpuTopology, DEFAULT_CPU_ONLINE_LIST};
pub use msr::{DevMsr, DEFAULT_MSR_ROOT};
pub use pci::{find_supported_device, PciDeviceInfo, SysfsConfigBus, DEFAULT_PCI_DEVICES_ROOT};
