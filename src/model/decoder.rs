// 该文件是 Jishu （计数） 项目的一部分。
// src/model/decoder.rs - 原始输出解码
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

use tracing::debug;

use crate::{model::Detection, tensor::RawTensor};

const CHANNEL_CX: usize = 0;
const CHANNEL_CY: usize = 1;
const CHANNEL_W: usize = 2;
const CHANNEL_H: usize = 3;
const CHANNEL_CONF: usize = 4;

/// 将原始输出解码为模型空间中的候选框，按锚点顺序返回。
/// 置信度低于阈值的锚点不会生成 [`Detection`]。
pub fn decode(tensor: &RawTensor, confidence_threshold: f32) -> Vec<Detection> {
  let num_anchors = tensor.num_anchors();
  let mut detections = Vec::new();

  for anchor in 0..num_anchors {
    let confidence = tensor.value(anchor, CHANNEL_CONF);
    if confidence.is_nan() || confidence < confidence_threshold {
      continue;
    }

    detections.push(Detection {
      cx: tensor.value(anchor, CHANNEL_CX),
      cy: tensor.value(anchor, CHANNEL_CY),
      w: tensor.value(anchor, CHANNEL_W),
      h: tensor.value(anchor, CHANNEL_H),
      confidence,
    });
  }

  debug!(
    "解码 {} 个锚点 ({:?}), 保留 {} 个候选框",
    num_anchors,
    tensor.layout(),
    detections.len()
  );

  detections
}
