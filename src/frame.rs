// 该文件是 Jishu （计数） 项目的一部分。
// src/frame.rs - 模型输入帧
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

use image::RgbImage;
use tracing::debug;

const RGB_CHANNELS: usize = 3;

/// 模型输入，NHWC 排布的 `[1, S, S, 3]` 浮点张量，取值范围 `[0, 1]`
#[derive(Debug, Clone)]
pub struct ModelInput {
  size: u32,
  data: Box<[f32]>,
}

impl ModelInput {
  /// 将原图直接拉伸到 `size x size` 并归一化，不保持宽高比
  pub fn from_image(image: &RgbImage, size: u32) -> Self {
    let resized = image::imageops::resize(
      image,
      size,
      size,
      image::imageops::FilterType::Triangle,
    );
    debug!(
      "输入图像 {}x{} 缩放到 {}x{}",
      image.width(),
      image.height(),
      size,
      size
    );

    let data: Vec<f32> = resized
      .into_raw()
      .into_iter()
      .map(|v| v as f32 / 255.0)
      .collect();

    Self {
      size,
      data: data.into_boxed_slice(),
    }
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn shape(&self) -> [usize; 4] {
    let size = self.size as usize;
    [1, size, size, RGB_CHANNELS]
  }

  pub fn as_nhwc(&self) -> &[f32] {
    &self.data
  }
}
