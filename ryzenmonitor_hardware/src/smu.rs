//! SMU寄存器通道
//!
//! SMN地址空间通过数据结构PCI功能的一对配置寄存器间接访问：先把地址写入
//! 索引寄存器，再从数据寄存器读回结果。总线本身没有事务标识，两个阶段必须
//! 在同一次加锁内完成。

use crate::error::{BusError, BusPhase};
use crate::host::ConfigBus;
use crate::registers::{SMN_DATA_OFFSET, SMN_INDEX_OFFSET};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// 串行化的SMN读通道
pub struct RegisterChannel {
    bus: Arc<dyn ConfigBus>,
    lock: Mutex<()>,
}

impl RegisterChannel {
    pub fn new(bus: Arc<dyn ConfigBus>) -> Self {
        Self {
            bus,
            lock: Mutex::new(()),
        }
    }

    /// 读取一个SMN地址
    ///
    /// 任一阶段失败都会立即释放锁并返回，不重试。失败只记录`debug`日志，
    /// 由调用方决定是否升级。
    pub fn read(&self, addr: u32) -> Result<u32, BusError> {
        // 锁只保护总线状态，毒化不影响后续事务
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Err(source) = self.bus.write_dword(SMN_INDEX_OFFSET, addr) {
            tracing::debug!(target: "smu",
                "Failed to write {:#x} to PCI config space {:#x}: {}", addr, SMN_INDEX_OFFSET, source);
            return Err(BusError {
                addr,
                phase: BusPhase::Command,
                source,
            });
        }

        self.bus.read_dword(SMN_DATA_OFFSET).map_err(|source| {
            tracing::debug!(target: "smu",
                "Failed to read PCI config space {:#x} for {:#x}: {}", SMN_DATA_OFFSET, addr, source);
            BusError {
                addr,
                phase: BusPhase::Response,
                source,
            }
        })
    }
}

impl fmt::Debug for RegisterChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterChannel").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HardwareResult, HostError};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    /// 模拟SMN索引/数据寄存器对，两个阶段之间可选地睡眠以放大竞争窗口
    struct SmnStub {
        values: HashMap<u32, u32>,
        index: Mutex<u32>,
        phase_gap: Duration,
        fail_write: bool,
        reads: AtomicUsize,
    }

    impl SmnStub {
        fn new(values: &[(u32, u32)]) -> Self {
            Self {
                values: values.iter().copied().collect(),
                index: Mutex::new(0),
                phase_gap: Duration::ZERO,
                fail_write: false,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl ConfigBus for SmnStub {
        fn write_dword(&self, offset: u16, value: u32) -> HardwareResult<()> {
            assert_eq!(offset, SMN_INDEX_OFFSET);
            if self.fail_write {
                return Err(HostError::ConfigSpace {
                    offset,
                    reason: "injected".to_string(),
                });
            }
            *self.index.lock().unwrap() = value;
            thread::sleep(self.phase_gap);
            Ok(())
        }

        fn read_dword(&self, offset: u16) -> HardwareResult<u32> {
            assert_eq!(offset, SMN_DATA_OFFSET);
            self.reads.fetch_add(1, Ordering::SeqCst);
            let index = *self.index.lock().unwrap();
            Ok(self.values.get(&index).copied().unwrap_or(!index))
        }
    }

    #[test]
    fn test_read_two_phase() {
        let stub = Arc::new(SmnStub::new(&[(0x0005_9800, 0xBC00_0000)]));
        let channel = RegisterChannel::new(stub);
        assert_eq!(channel.read(0x0005_9800), Ok(0xBC00_0000));
    }

    #[test]
    fn test_command_failure_skips_response() {
        let mut stub = SmnStub::new(&[]);
        stub.fail_write = true;
        let stub = Arc::new(stub);
        let channel = RegisterChannel::new(stub.clone());

        let error = channel.read(0x0005_9b08).unwrap_err();
        assert_eq!(error.addr, 0x0005_9b08);
        assert_eq!(error.phase, BusPhase::Command);
        assert_eq!(stub.reads.load(Ordering::SeqCst), 0);
    }

    /// 收集日志输出
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn read_logged(level: tracing::Level, channel: &RegisterChannel, addr: u32) -> String {
        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(buffer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            assert!(channel.read(addr).is_err());
        });
        buffer.contents()
    }

    #[test]
    fn test_failed_read_logs_below_warn() {
        let mut stub = SmnStub::new(&[]);
        stub.fail_write = true;
        let channel = RegisterChannel::new(Arc::new(stub));

        // 持续失败的传感器不会在默认级别刷屏
        assert_eq!(read_logged(tracing::Level::INFO, &channel, 0x0005_9800), "");

        let debug = read_logged(tracing::Level::DEBUG, &channel, 0x0005_9800);
        assert!(debug.contains("DEBUG"));
        assert!(debug.contains("0x59800"));
    }

    #[test]
    fn test_concurrent_reads_never_interleave() {
        let values: Vec<(u32, u32)> = (0..8u32).map(|i| (0x1000 + i * 4, 0xA000 + i)).collect();
        let mut stub = SmnStub::new(&values);
        stub.phase_gap = Duration::from_millis(1);
        let channel = Arc::new(RegisterChannel::new(Arc::new(stub)));

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let channel = channel.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        assert_eq!(channel.read(0x1000 + i * 4), Ok(0xA000 + i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
