mod em;

pub use em::EmReader;
#[cfg(test)]
pub(crate) use em::em_bytes;

/// 获取所有可用的读取器
pub fn get_all_readers() -> Vec<Box<dyn crate::utils::parser::VolumeReader>> {
    vec![Box::new(EmReader::new())]
}
