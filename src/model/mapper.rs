// 该文件是 Jishu （计数） 项目的一部分。
// src/model/mapper.rs - 坐标映射
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

use crate::model::{BoundingBox, Detection};

/// 将模型输入空间中的框映射到原图像素坐标。
///
/// 宽高各自使用独立的缩放比例，与推理前把原图直接拉伸到正方形的做法对应。
/// 结果不会裁剪到图像范围内，需要时调用 [`BoundingBox::clamped`]。
pub fn to_image_space(
  detection: &Detection,
  model_input_size: u32,
  image_width: u32,
  image_height: u32,
) -> BoundingBox {
  let size = model_input_size as f32;
  let w_ratio = image_width as f32 / size;
  let h_ratio = image_height as f32 / size;

  let half_w = detection.w / 2.0;
  let half_h = detection.h / 2.0;

  BoundingBox {
    left: (detection.cx - half_w) * w_ratio,
    top: (detection.cy - half_h) * h_ratio,
    right: (detection.cx + half_w) * w_ratio,
    bottom: (detection.cy + half_h) * h_ratio,
    confidence: detection.confidence,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_with_independent_ratios() {
    let detection = Detection {
      cx: 320.0,
      cy: 320.0,
      w: 100.0,
      h: 50.0,
      confidence: 0.95,
    };
    let bbox = to_image_space(&detection, 640, 1280, 960);
    // 2.0 / 1.5 的比例下结果可精确表示
    assert_eq!(bbox.left, 540.0);
    assert_eq!(bbox.top, 442.5);
    assert_eq!(bbox.right, 740.0);
    assert_eq!(bbox.bottom, 517.5);
    assert_eq!(bbox.confidence, 0.95);
  }

  #[test]
  fn does_not_clamp() {
    let detection = Detection {
      cx: 0.0,
      cy: 640.0,
      w: 100.0,
      h: 100.0,
      confidence: 0.9,
    };
    let bbox = to_image_space(&detection, 640, 640, 640);
    assert_eq!(bbox.left, -50.0);
    assert_eq!(bbox.bottom, 690.0);

    let clamped = bbox.clamped(640, 640);
    assert_eq!(clamped.left, 0.0);
    assert_eq!(clamped.bottom, 640.0);
  }

  #[test]
  fn propagates_non_finite_values() {
    let detection = Detection {
      cx: f32::NAN,
      cy: f32::INFINITY,
      w: 10.0,
      h: 10.0,
      confidence: 0.9,
    };
    let bbox = to_image_space(&detection, 640, 640, 480);
    assert!(bbox.left.is_nan());
    assert!(bbox.top.is_infinite());
  }
}
