//! 主机原语抽象
//!
//! 驱动核心只通过这些trait接触硬件，便于替换为Linux后端或测试桩。

use crate::error::HardwareResult;

/// 单个PCI设备的配置空间（按双字访问）
pub trait ConfigBus: Send + Sync {
    /// 向配置空间偏移写入一个32位字
    fn write_dword(&self, offset: u16, value: u32) -> HardwareResult<()>;

    /// 从配置空间偏移读取一个32位字
    fn read_dword(&self, offset: u16) -> HardwareResult<u32>;
}

/// 按逻辑核心读取MSR
pub trait MsrAccess: Send + Sync {
    fn read_msr(&self, cpu: u16, register: u32) -> HardwareResult<u64>;
}

/// CPU识别与在线核心数查询
pub trait CpuTopologySource: Send + Sync {
    /// 当前在线的逻辑核心数
    fn online_logical_cores(&self) -> HardwareResult<u32>;

    /// 每个物理核心的线程数（SMT）
    fn threads_per_core(&self) -> HardwareResult<u8>;
}
