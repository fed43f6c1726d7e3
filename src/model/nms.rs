// 该文件是 Jishu （计数） 项目的一部分。
// src/model/nms.rs - 非极大值抑制
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

use tracing::{debug, trace};

use crate::model::BoundingBox;

/// IoU 分母上的平滑项，避免两个退化框相除为零
pub const IOU_EPSILON: f32 = 1e-6;

/// 计算两个边界框的 IoU
///
/// 面积为零或非有限值的框按退化框处理，与任何框的 IoU 都为 0。
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
  let area_a = a.area();
  let area_b = b.area();
  if area_a == 0.0 || area_b == 0.0 {
    trace!("退化框参与 IoU 计算: {:?} / {:?}", a, b);
    return 0.0;
  }

  let inter_w = (a.right.min(b.right) - a.left.max(b.left)).max(0.0);
  let inter_h = (a.bottom.min(b.bottom) - a.top.max(b.top)).max(0.0);
  let intersection = inter_w * inter_h;
  let union = area_a + area_b - intersection;

  intersection / (union + IOU_EPSILON)
}

/// 贪心 NMS，返回按置信度降序排列、两两 IoU 不超过阈值的框。
///
/// 排序是稳定的，置信度相同的框保持输入顺序。输入不会被修改。
pub fn suppress(boxes: &[BoundingBox], iou_threshold: f32) -> Vec<BoundingBox> {
  // NaN 置信度排在最后
  let key = |i: usize| {
    let confidence = boxes[i].confidence;
    if confidence.is_nan() {
      f32::NEG_INFINITY
    } else {
      confidence
    }
  };

  let mut order: Vec<usize> = (0..boxes.len()).collect();
  order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));

  let mut suppressed = vec![false; order.len()];
  let mut selected = Vec::new();

  for i in 0..order.len() {
    if suppressed[i] {
      continue;
    }

    let best = &boxes[order[i]];
    selected.push(best.clone());

    for j in (i + 1)..order.len() {
      if !suppressed[j] && iou(best, &boxes[order[j]]) > iou_threshold {
        suppressed[j] = true;
      }
    }
  }

  debug!("NMS: {} 个候选框, 保留 {} 个", boxes.len(), selected.len());

  selected
}
