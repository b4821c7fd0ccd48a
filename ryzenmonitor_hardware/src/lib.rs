//! Ryzen 硬件访问模块
//!
//! 提供SMU寄存器通道、寄存器解码、CPU拓扑探测以及Linux主机后端。

pub mod decode;
pub mod device;
pub mod error;
pub mod host;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod registers;
pub mod smu;
pub mod topology;

// Re-export public API
pub use device::{PciId, SUPPORTED_DEVICES};
pub use error::{BusError, BusPhase, DecodeError, HardwareResult, HostError, IoContext, TopologyError};
pub use host::{ConfigBus, CpuTopologySource, MsrAccess};
pub use smu::RegisterChannel;
pub use topology::{Topology, TopologyProbe, MAX_DOMAINS};
