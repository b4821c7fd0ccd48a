//! `/dev/cpu/<n>/msr`访问

use crate::error::{HardwareResult, IoContext};
use crate::host::MsrAccess;
use std::collections::HashMap;
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// MSR设备根目录
pub const DEFAULT_MSR_ROOT: &str = "/dev/cpu";

type CoreSlot = Arc<Mutex<Option<File>>>;

/// 按核心缓存文件句柄的MSR读取器
///
/// 每个核心一把锁，不同核心的读取互不阻塞。
#[derive(Debug)]
pub struct DevMsr {
    root: PathBuf,
    cores: Mutex<HashMap<u16, CoreSlot>>,
}

impl DevMsr {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_MSR_ROOT)
    }

    pub fn with_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            cores: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, cpu: u16) -> CoreSlot {
        let mut cores = self.cores.lock().unwrap_or_else(PoisonError::into_inner);
        cores.entry(cpu).or_default().clone()
    }
}

impl Default for DevMsr {
    fn default() -> Self {
        Self::new()
    }
}

impl MsrAccess for DevMsr {
    fn read_msr(&self, cpu: u16, register: u32) -> HardwareResult<u64> {
        let slot = self.slot(cpu);
        let mut handle = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if handle.is_none() {
            let path = self.root.join(cpu.to_string()).join("msr");
            *handle = Some(File::open(&path).msr(register, cpu)?);
        }

        let mut buf = [0u8; 8];
        if let Some(file) = handle.as_ref() {
            // 读失败后丢弃句柄，下次重新打开
            if let Err(e) = file.read_exact_at(&mut buf, u64::from(register)) {
                *handle = None;
                return Err::<u64, _>(e).msr(register, cpu);
            }
        }
        Ok(u64::from_le_bytes(buf))
    }
}
