//! Family 19h 寄存器地址

/// SMN索引寄存器在数据结构PCI功能配置空间中的偏移
pub const SMN_INDEX_OFFSET: u16 = 0x60;
/// SMN数据寄存器偏移
pub const SMN_DATA_OFFSET: u16 = 0x64;

/// Tdie（整颗芯片温度）
pub const SMN_TDIE_ADDR: u32 = 0x0005_9800;
/// CCD0温度，后续CCD依次间隔4字节
pub const SMN_TCCD_BASE: u32 = 0x0005_9b08;

/// 当前P-state状态（频率FID/DID）
pub const MSR_CORE_FREQ: u32 = 0xC001_0293;
/// RAPL功率单位
pub const MSR_ENERGY_UNIT: u32 = 0xC001_0299;
/// 封装累计能量
pub const MSR_PACKAGE_ENERGY: u32 = 0xC001_029B;

/// 处理器拓扑信息叶（EBX[15:8] = 每核线程数 - 1）
pub const CPUID_TOPOLOGY_LEAF: u32 = 0x8000_001E;

/// 第`domain`个CCD温度寄存器的SMN地址
pub const fn tccd_addr(domain: u8) -> u32 {
    SMN_TCCD_BASE + (domain as u32) * 4
}
