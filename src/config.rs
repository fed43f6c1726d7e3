// 该文件是 Jishu （计数） 项目的一部分。
// src/config.rs - 检测配置
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

use thiserror::Error;

pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 640;
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.90;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.40;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  #[error("模型输入尺寸必须大于 0")]
  ZeroInputSize,
  #[error("置信度阈值必须在 [0, 1] 内, 实际为 {0}")]
  ConfidenceThreshold(f32),
  #[error("IoU 阈值必须在 [0, 1] 内, 实际为 {0}")]
  IouThreshold(f32),
}

/// 检测流水线参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
  /// 模型输入正方形的边长（像素）
  pub model_input_size: u32,
  /// 保留候选框的最低置信度
  pub confidence_threshold: f32,
  /// NMS 允许的最大重叠
  pub iou_threshold: f32,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      model_input_size: DEFAULT_MODEL_INPUT_SIZE,
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
    }
  }
}

impl DetectorConfig {
  pub fn with_model_input_size(mut self, size: u32) -> Self {
    self.model_input_size = size;
    self
  }

  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.model_input_size == 0 {
      return Err(ConfigError::ZeroInputSize);
    }
    if !(0.0..=1.0).contains(&self.confidence_threshold) {
      return Err(ConfigError::ConfidenceThreshold(self.confidence_threshold));
    }
    if !(0.0..=1.0).contains(&self.iou_threshold) {
      return Err(ConfigError::IouThreshold(self.iou_threshold));
    }
    Ok(())
  }
}
