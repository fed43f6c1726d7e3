// 该文件是 Jishu （计数） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use image::RgbImage;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::DetectionResult,
  output::{
    Render,
    draw::{Annotator, AnnotatorError},
  },
};

/// 绘制检测框后保存为图像文件，格式由扩展名决定。
///
/// 默认使用内置字体，可通过查询参数 `font` 指定其他字体，例如 `image:///tmp/out.png?font=/usr/share/fonts/DejaVuSans.ttf`。
pub struct SaveImageFileOutput {
  path: String,
  annotator: Annotator,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("字体错误: {0}")]
  FontError(#[from] AnnotatorError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let annotator = match uri.query_pairs().find(|(k, _)| k == "font") {
      Some((_, font)) => Annotator::from_font_file(font.into_owned())?,
      None => Annotator::new(),
    };

    Ok(SaveImageFileOutput {
      path: uri.path().to_string(),
      annotator,
    })
  }
}

impl SaveImageFileOutput {
  pub fn new<P: Into<String>>(path: P, annotator: Annotator) -> Self {
    Self {
      path: path.into(),
      annotator,
    }
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    info!("保存图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, image: &RgbImage, result: &DetectionResult) -> Result<(), Self::Error> {
    let annotation = self.annotator.annotate(image, &result.boxes);
    self.save_image(&annotation.image)
  }
}
