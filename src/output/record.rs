// 该文件是 Jishu （计数） 项目的一部分。
// src/output/record.rs - 检测结果记录
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

use std::{io::Write, path::PathBuf};

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, model::DetectionResult, output::Render};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON 序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 以 JSON 形式写出检测框、数量与平均置信度
pub struct RecordOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    Ok(RecordOutput {
      path: PathBuf::from(uri.path()),
    })
  }
}

impl RecordOutput {
  pub fn new<P: Into<PathBuf>>(path: P) -> Self {
    Self { path: path.into() }
  }
}

impl Render for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, _image: &RgbImage, result: &DetectionResult) -> Result<(), Self::Error> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let mut writer = std::io::BufWriter::new(std::fs::File::create(&self.path)?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    info!("保存检测记录到文件: {}", self.path.display());
    Ok(())
  }
}
