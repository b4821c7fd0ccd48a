//! CPU识别与在线核心数

use crate::error::{HardwareResult, HostError};
use crate::host::CpuTopologySource;
use std::fs;
use std::path::PathBuf;

/// 内核导出的在线CPU列表
pub const DEFAULT_CPU_ONLINE_LIST: &str = "/sys/devices/system/cpu/online";

/// 使用本机CPUID和内核在线CPU列表
///
/// 在线核心数取自sysfs，不受进程亲和性和cgroup配额影响；列表不可用时退回
/// `num_cpus::get()`。
#[derive(Debug, Clone)]
pub struct NativeCpuTopology {
    online_list: PathBuf,
}

impl NativeCpuTopology {
    pub fn new() -> Self {
        Self::with_online_list(DEFAULT_CPU_ONLINE_LIST)
    }

    /// 指定在线CPU列表文件
    pub fn with_online_list<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            online_list: path.into(),
        }
    }
}

impl Default for NativeCpuTopology {
    fn default() -> Self {
        Self::new()
    }
}

/// 统计`0-3,8-11`形式CPU列表中的CPU数
///
/// 格式错误或列表为空时返回`None`。
pub fn count_cpu_list(list: &str) -> Option<u32> {
    let list = list.trim();
    if list.is_empty() {
        return None;
    }

    let mut total: u32 = 0;
    for range in list.split(',') {
        let count = match range.split_once('-') {
            Some((first, last)) => {
                let first: u32 = first.trim().parse().ok()?;
                let last: u32 = last.trim().parse().ok()?;
                last.checked_sub(first)?.checked_add(1)?
            }
            None => {
                range.trim().parse::<u32>().ok()?;
                1
            }
        };
        total = total.checked_add(count)?;
    }
    Some(total)
}

impl CpuTopologySource for NativeCpuTopology {
    fn online_logical_cores(&self) -> HardwareResult<u32> {
        let listed = fs::read_to_string(&self.online_list)
            .ok()
            .and_then(|text| count_cpu_list(&text));
        if let Some(count) = listed {
            return Ok(count);
        }

        tracing::debug!(target: "topology",
            "{} unavailable, using scheduler CPU count", self.online_list.display());
        u32::try_from(num_cpus::get())
            .map_err(|e| HostError::Cpuid(format!("online core count out of range: {}", e)))
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn threads_per_core(&self) -> HardwareResult<u8> {
        use crate::registers::CPUID_TOPOLOGY_LEAF;

        raw_cpuid::CpuId::new()
            .get_processor_topology_info()
            .map(|info| info.threads_per_core())
            .ok_or_else(|| HostError::Cpuid(format!("leaf {:#x} not supported", CPUID_TOPOLOGY_LEAF)))
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    fn threads_per_core(&self) -> HardwareResult<u8> {
        Err(HostError::Cpuid("CPUID is only available on x86".to_string()))
    }
}
