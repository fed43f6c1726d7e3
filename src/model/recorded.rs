// 该文件是 Jishu （计数） 项目的一部分。
// src/model/recorded.rs - 回放已记录的模型输出
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, frame::ModelInput, model::InferenceBackend, tensor::RawOutput,
};

#[derive(Error, Debug)]
pub enum RecordedBackendError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 解析错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 从 JSON 文件读取一次推理的原始输出，每次推理都返回同一结果。
///
/// 文件格式: `{"shape": [1, 5, 8400], "data": [...]}`，数据按行优先存放。
pub struct RecordedBackend {
  output: RawOutput,
}

impl FromUrlWithScheme for RecordedBackend {
  const SCHEME: &'static str = "tensor";
}

impl FromUrl for RecordedBackend {
  type Error = RecordedBackendError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(RecordedBackendError::SchemeMismatch(url.scheme().to_string()));
    }
    Self::open(url.path())
  }
}

impl RecordedBackend {
  pub fn new(output: RawOutput) -> Self {
    Self { output }
  }

  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecordedBackendError> {
    let path = path.as_ref();
    info!("加载输出记录: {}", path.display());
    let file = std::fs::File::open(path)?;
    let output: RawOutput = serde_json::from_reader(std::io::BufReader::new(file))?;
    debug!(
      "输出记录形状: {:?}, 数据长度: {}",
      output.shape,
      output.data.len()
    );
    Ok(Self { output })
  }
}

impl InferenceBackend for RecordedBackend {
  type Error = RecordedBackendError;

  fn infer(&self, input: &ModelInput) -> Result<RawOutput, Self::Error> {
    debug!("回放输出记录, 输入形状: {:?}", input.shape());
    Ok(self.output.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn loads_from_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.json");
    std::fs::write(&path, r#"{"shape": [1, 2, 5], "data": [1,2,3,4,0.5, 6,7,8,9,0.95]}"#).unwrap();

    let url = Url::parse(&format!("tensor://{}", path.display())).unwrap();
    let backend = RecordedBackend::from_url(&url).unwrap();

    let image = image::RgbImage::new(4, 4);
    let output = backend.infer(&ModelInput::from_image(&image, 4)).unwrap();
    assert_eq!(output.shape, vec![1, 2, 5]);
    assert_eq!(output.data.len(), 10);
    assert_eq!(output.data[9], 0.95);
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("image:///tmp/output.json").unwrap();
    assert!(matches!(
      RecordedBackend::from_url(&url),
      Err(RecordedBackendError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn reports_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"shape\": [1, 5").unwrap();
    assert!(matches!(
      RecordedBackend::open(&path),
      Err(RecordedBackendError::JsonError(_))
    ));
  }
}
