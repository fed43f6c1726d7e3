// 该文件是 Jishu （计数） 项目的一部分。
// src/pipeline.rs - 解码、抑制与绘制
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

use crate::{
  config::DetectorConfig,
  model::{DetectError, DetectionResult, postprocess},
  output::draw::Annotator,
  tensor::RawTensor,
};

/// 从原始输出到绘制结果的完整流程。
///
/// 形状错误时不返回任何部分结果。
pub fn run(
  shape: &[usize],
  data: Vec<f32>,
  image: &RgbImage,
  config: &DetectorConfig,
  annotator: &Annotator,
) -> Result<(DetectionResult, RgbImage), DetectError> {
  let tensor = RawTensor::new(shape, data)?;
  let result = postprocess(&tensor, config, image.width(), image.height())?;
  let annotation = annotator.annotate(image, &result.boxes);
  Ok((result, annotation.image))
}
