/// 硬件访问错误处理
///
/// 总线事务、主机原语、寄存器解码和拓扑探测各自的错误类型

use std::fmt;
use std::io;
use thiserror::Error;

/// SMN两阶段事务的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusPhase {
    /// 写入地址到索引寄存器
    Command,
    /// 从数据寄存器读回结果
    Response,
}

impl fmt::Display for BusPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusPhase::Command => f.write_str("command"),
            BusPhase::Response => f.write_str("response"),
        }
    }
}

/// SMN总线事务失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("SMN read of {addr:#010x} failed in {phase} phase: {source}")]
pub struct BusError {
    pub addr: u32,
    pub phase: BusPhase,
    #[source]
    pub source: HostError,
}

/// 主机提供的底层原语失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// PCI配置空间访问失败
    #[error("PCI config access at offset {offset:#04x} failed: {reason}")]
    ConfigSpace { offset: u16, reason: String },

    /// MSR读取失败
    #[error("MSR {register:#010x} on cpu {cpu} unreadable: {reason}")]
    Msr { register: u32, cpu: u16, reason: String },

    /// CPUID查询失败
    #[error("CPU identification failed: {0}")]
    Cpuid(String),
}

/// 主机原语结果类型
pub type HardwareResult<T> = Result<T, HostError>;

/// 寄存器解码失败
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// P-state状态寄存器中的除数为0
    #[error("core frequency divisor is zero (raw {raw:#010x})")]
    ZeroDivisor { raw: u32 },
}

/// 拓扑探测失败，探测结果无法用于构建属性树
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// 没有任何CCD温度传感器返回有效读数
    #[error("no CCD temperature sensor reported a reading inside (0, 225) C")]
    NoDomainsDetected,

    /// 物理核心数无法均分到各个CCD
    #[error(
        "{logical_cores} logical cores at {threads_per_core} threads per core \
         cannot be split evenly across {domain_count} domains"
    )]
    InconsistentCoreCount {
        logical_cores: u32,
        threads_per_core: u8,
        domain_count: u8,
    },

    /// 探测所需的主机查询失败
    #[error("topology query failed: {0}")]
    Host(#[from] HostError),
}

/// 为`io::Result`附加寄存器上下文
pub trait IoContext<T> {
    /// 标记为PCI配置空间访问错误
    fn config_space(self, offset: u16) -> HardwareResult<T>;

    /// 标记为MSR访问错误
    fn msr(self, register: u32, cpu: u16) -> HardwareResult<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn config_space(self, offset: u16) -> HardwareResult<T> {
        self.map_err(|e| HostError::ConfigSpace {
            offset,
            reason: e.to_string(),
        })
    }

    fn msr(self, register: u32, cpu: u16) -> HardwareResult<T> {
        self.map_err(|e| HostError::Msr {
            register,
            cpu,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_error_display() {
        let error = BusError {
            addr: 0x0005_9800,
            phase: BusPhase::Response,
            source: HostError::ConfigSpace {
                offset: 0x64,
                reason: "device gone".to_string(),
            },
        };

        let text = error.to_string();
        assert!(text.contains("0x00059800"));
        assert!(text.contains("response"));
        assert!(text.contains("0x64"));
    }

    #[test]
    fn test_io_context() {
        let result: io::Result<u64> = Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "Operation not permitted",
        ));

        match result.msr(0xC001_0299, 0) {
            Err(HostError::Msr { register, cpu, reason }) => {
                assert_eq!(register, 0xC001_0299);
                assert_eq!(cpu, 0);
                assert!(reason.contains("not permitted"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_topology_error_from_host() {
        let error: TopologyError = HostError::Cpuid("leaf unsupported".to_string()).into();
        assert!(matches!(error, TopologyError::Host(_)));
        assert!(error.to_string().contains("leaf unsupported"));
    }
}
