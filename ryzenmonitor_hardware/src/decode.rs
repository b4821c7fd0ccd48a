//! 寄存器解码
//!
//! 纯函数：把原始寄存器字转换为物理单位。不做任何I/O。

use crate::error::DecodeError;

/// CCD温度的有效范围下限（不含）
pub const DOMAIN_TEMPERATURE_MIN: i32 = 0;
/// CCD温度的有效范围上限（不含）
pub const DOMAIN_TEMPERATURE_MAX: i32 = 225;

/// Tdie，单位摄氏度
///
/// 温度值位于bit[31:21]，以1/8度为单位，偏移49度。
pub fn die_temperature(raw: u32) -> i32 {
    (((raw >> 21) & 0x7FF) / 8) as i32 - 49
}

/// CCD温度，单位摄氏度
///
/// 低12位为读数，`读数 * 0.125 - 305`，整数运算向零截断。
pub fn domain_temperature(raw: u32) -> i32 {
    (((raw & 0xFFF) as i32) * 125 - 305_000) / 1000
}

/// 读数是否落在AMD规格范围 (0, 225) 内
pub fn is_valid_domain_temperature(celsius: i32) -> bool {
    celsius > DOMAIN_TEMPERATURE_MIN && celsius < DOMAIN_TEMPERATURE_MAX
}

/// 核心频率，单位MHz
///
/// `FID / DID * 200`，与硬件手册一致先做整数除法。
pub fn core_frequency(eax: u32) -> Result<u32, DecodeError> {
    let fid = eax & 0xFF;
    let did = (eax >> 8) & 0x3F;
    if did == 0 {
        return Err(DecodeError::ZeroDivisor { raw: eax });
    }
    Ok(fid / did * 200)
}

/// 能量单位：`2^ESU`，ESU位于bit[12:8]
pub fn energy_unit(eax: u32) -> u32 {
    1u32 << ((eax >> 8) & 0x1F)
}

/// 累计能量计数器（硬件单位，尚未除以能量单位）
pub fn energy(eax: u32) -> u32 {
    eax
}
