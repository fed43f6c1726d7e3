// 该文件是 Jishu （计数） 项目的一部分。
// src/tensor.rs - 原始输出张量
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// 每个锚点携带的通道数：cx, cy, w, h, conf
pub const BOX_CHANNELS: usize = 5;

const TENSOR_RANK: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
  #[error("张量维度必须为 3, 实际形状: {0:?}")]
  Rank(Vec<usize>),
  #[error("批大小必须为 1, 实际形状: {0:?}")]
  Batch(Vec<usize>),
  #[error("形状 {0:?} 中没有长度为 5 的通道轴")]
  NoChannelAxis(Vec<usize>),
  #[error("形状 {0:?} 的元素总数溢出")]
  Overflow(Vec<usize>),
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  DataLength { expected: usize, actual: usize },
}

/// 张量在内存中的排布
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
  /// `[1, 5, N]`，同一通道的锚点连续存放
  ChannelMajor,
  /// `[1, N, 5]`，同一锚点的五个通道连续存放
  AnchorMajor,
}

impl Layout {
  /// 由 `[1, A, B]` 中的 A、B 推断排布，长度为 5 的轴即通道轴。
  /// 两轴都为 5 时按锚点优先处理。
  pub fn infer(a: usize, b: usize) -> Result<Self, ShapeError> {
    if b == BOX_CHANNELS {
      Ok(Layout::AnchorMajor)
    } else if a == BOX_CHANNELS {
      Ok(Layout::ChannelMajor)
    } else {
      Err(ShapeError::NoChannelAxis(vec![1, a, b]))
    }
  }
}

/// 推理后端交出的未经检查的输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
  pub shape: Vec<usize>,
  pub data: Vec<f32>,
}

impl TryFrom<RawOutput> for RawTensor {
  type Error = ShapeError;

  fn try_from(output: RawOutput) -> Result<Self, Self::Error> {
    RawTensor::new(&output.shape, output.data)
  }
}

/// 检测头的原始输出，形状为 `[1, A, B]`，行优先存放
#[derive(Debug, Clone)]
pub struct RawTensor {
  rows: usize,
  cols: usize,
  layout: Layout,
  data: Box<[f32]>,
}

impl RawTensor {
  pub fn new(shape: &[usize], data: Vec<f32>) -> Result<Self, ShapeError> {
    if shape.len() != TENSOR_RANK {
      error!("输出张量形状无法识别: {:?}", shape);
      return Err(ShapeError::Rank(shape.to_vec()));
    }
    if shape[0] != 1 {
      error!("输出张量批大小不为 1: {:?}", shape);
      return Err(ShapeError::Batch(shape.to_vec()));
    }

    let (rows, cols) = (shape[1], shape[2]);
    let layout = Layout::infer(rows, cols).inspect_err(|_| {
      error!("输出张量形状无法识别: {:?}", shape);
    })?;

    let Some(expected) = rows.checked_mul(cols) else {
      error!("输出张量形状过大: {:?}", shape);
      return Err(ShapeError::Overflow(shape.to_vec()));
    };
    if data.len() != expected {
      return Err(ShapeError::DataLength {
        expected,
        actual: data.len(),
      });
    }

    debug!("输出张量形状: {:?}, 排布: {:?}", shape, layout);
    Ok(Self {
      rows,
      cols,
      layout,
      data: data.into_boxed_slice(),
    })
  }

  pub fn shape(&self) -> [usize; 3] {
    [1, self.rows, self.cols]
  }

  pub fn layout(&self) -> Layout {
    self.layout
  }

  /// 锚点数量 N
  pub fn num_anchors(&self) -> usize {
    match self.layout {
      Layout::ChannelMajor => self.cols,
      Layout::AnchorMajor => self.rows,
    }
  }

  /// 读取第 `anchor` 个锚点的第 `channel` 个通道
  #[inline]
  pub fn value(&self, anchor: usize, channel: usize) -> f32 {
    match self.layout {
      Layout::ChannelMajor => self.data[channel * self.cols + anchor],
      Layout::AnchorMajor => self.data[anchor * self.cols + channel],
    }
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn infers_layout_from_channel_axis() {
    assert_eq!(Layout::infer(5, 8400), Ok(Layout::ChannelMajor));
    assert_eq!(Layout::infer(8400, 5), Ok(Layout::AnchorMajor));
    assert_eq!(Layout::infer(5, 5), Ok(Layout::AnchorMajor));
    assert_eq!(Layout::infer(3, 5), Ok(Layout::AnchorMajor));
    assert_eq!(Layout::infer(5, 3), Ok(Layout::ChannelMajor));
    assert!(matches!(
      Layout::infer(4, 8400),
      Err(ShapeError::NoChannelAxis(_))
    ));
  }

  #[test]
  fn rejects_bad_shapes() {
    assert!(matches!(
      RawTensor::new(&[5, 10], vec![0.0; 50]),
      Err(ShapeError::Rank(_))
    ));
    assert!(matches!(
      RawTensor::new(&[1, 1, 5, 10], vec![0.0; 50]),
      Err(ShapeError::Rank(_))
    ));
    assert!(matches!(
      RawTensor::new(&[2, 5, 10], vec![0.0; 100]),
      Err(ShapeError::Batch(_))
    ));
    assert!(matches!(
      RawTensor::new(&[1, 4, 10], vec![0.0; 40]),
      Err(ShapeError::NoChannelAxis(_))
    ));
    assert_eq!(
      RawTensor::new(&[1, 5, 10], vec![0.0; 49]).unwrap_err(),
      ShapeError::DataLength {
        expected: 50,
        actual: 49
      }
    );
  }

  #[test]
  fn rejects_overflowing_shapes() {
    let output: RawOutput =
      serde_json::from_str(r#"{"shape":[1,5,4611686018427387904],"data":[]}"#).unwrap();
    assert!(matches!(
      RawTensor::try_from(output),
      Err(ShapeError::Overflow(_))
    ));

    // 乘积回绕到 4 的形状不能靠 4 个元素通过检查
    let wrapping = (usize::MAX / 5) + 1;
    assert!(matches!(
      RawTensor::new(&[1, 5, wrapping], vec![0.0; 4]),
      Err(ShapeError::Overflow(_))
    ));
  }

  #[test]
  fn accessor_follows_layout() {
    // 两个锚点: (1,2,3,4,5) 与 (6,7,8,9,10)
    let channel_major = RawTensor::new(
      &[1, 5, 2],
      vec![1.0, 6.0, 2.0, 7.0, 3.0, 8.0, 4.0, 9.0, 5.0, 10.0],
    )
    .unwrap();
    let anchor_major = RawTensor::new(
      &[1, 2, 5],
      vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
    )
    .unwrap();

    assert_eq!(channel_major.num_anchors(), 2);
    assert_eq!(anchor_major.num_anchors(), 2);
    for anchor in 0..2 {
      for channel in 0..BOX_CHANNELS {
        assert_eq!(
          channel_major.value(anchor, channel),
          anchor_major.value(anchor, channel)
        );
      }
    }
    assert_eq!(anchor_major.value(1, 4), 10.0);
  }
}
