//! CPU拓扑探测
//!
//! 通过逐个探测CCD温度寄存器确定CCD数量，再结合在线核心数和SMT线程数
//! 计算每个CCD的物理核心数。

use crate::decode;
use crate::error::{HardwareResult, TopologyError};
use crate::host::{CpuTopologySource, MsrAccess};
use crate::registers::{tccd_addr, MSR_ENERGY_UNIT};
use crate::smu::RegisterChannel;
use serde::{Deserialize, Serialize};

/// 该处理器家族的最大CCD数
pub const MAX_DOMAINS: u8 = 8;

/// 一次挂载期间不变的拓扑
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub domain_count: u8,
    pub cores_per_domain: u8,
    pub energy_unit: u32,
}

impl Topology {
    /// 物理核心总数
    pub fn physical_cores(&self) -> u16 {
        u16::from(self.domain_count) * u16::from(self.cores_per_domain)
    }
}

/// 拓扑探测器
pub struct TopologyProbe<'a> {
    channel: &'a RegisterChannel,
    msr: &'a dyn MsrAccess,
    cpu: &'a dyn CpuTopologySource,
}

impl<'a> TopologyProbe<'a> {
    pub fn new(
        channel: &'a RegisterChannel,
        msr: &'a dyn MsrAccess,
        cpu: &'a dyn CpuTopologySource,
    ) -> Self {
        Self { channel, msr, cpu }
    }

    /// 探测完整拓扑
    pub fn discover(&self) -> Result<Topology, TopologyError> {
        let domain_count = self.count_domains();
        tracing::info!(target: "topology", "Detected {} CCDs", domain_count);
        if domain_count == 0 {
            return Err(TopologyError::NoDomainsDetected);
        }

        let logical_cores = self.cpu.online_logical_cores()?;
        let threads_per_core = self.cpu.threads_per_core()?;
        let cores_per_domain = split_cores(logical_cores, threads_per_core, domain_count)?;
        tracing::info!(target: "topology",
            "Detected {} logical cores on {} physical cores",
            logical_cores,
            u32::from(cores_per_domain) * u32::from(domain_count));

        let energy_unit = read_energy_unit(self.msr)?;
        tracing::debug!(target: "topology", "Energy unit {}", energy_unit);

        Ok(Topology {
            domain_count,
            cores_per_domain,
            energy_unit,
        })
    }

    /// 连续有效的CCD温度读数个数
    ///
    /// 读失败与超出范围同样视为该CCD不存在。
    pub fn count_domains(&self) -> u8 {
        (0..MAX_DOMAINS)
            .take_while(|&domain| match self.channel.read(tccd_addr(domain)) {
                Ok(raw) => {
                    let celsius = decode::domain_temperature(raw);
                    tracing::debug!(target: "topology", "CCD {} reads {} C", domain, celsius);
                    decode::is_valid_domain_temperature(celsius)
                }
                Err(e) => {
                    tracing::warn!(target: "topology", "CCD {} probe failed: {}", domain, e);
                    false
                }
            })
            .count() as u8
    }
}

/// 把物理核心均分到各CCD
pub fn split_cores(
    logical_cores: u32,
    threads_per_core: u8,
    domain_count: u8,
) -> Result<u8, TopologyError> {
    if domain_count == 0 {
        return Err(TopologyError::NoDomainsDetected);
    }
    let inconsistent = || TopologyError::InconsistentCoreCount {
        logical_cores,
        threads_per_core,
        domain_count,
    };
    if threads_per_core == 0 {
        return Err(inconsistent());
    }

    let physical_cores = logical_cores / u32::from(threads_per_core);
    let domains = u32::from(domain_count);
    if physical_cores == 0 || physical_cores % domains != 0 {
        return Err(inconsistent());
    }
    u8::try_from(physical_cores / domains).map_err(|_| inconsistent())
}

/// 在逻辑核心0上读取能量单位（寄存器在整个封装内共享）
pub fn read_energy_unit(msr: &dyn MsrAccess) -> HardwareResult<u32> {
    let raw = msr.read_msr(0, MSR_ENERGY_UNIT)?;
    Ok(decode::energy_unit(raw as u32))
}
