// 该文件是 Jishu （计数） 项目的一部分。
// src/model.rs - 检测模型与后处理
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
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
  config::{ConfigError, DetectorConfig},
  frame::ModelInput,
  tensor::{RawOutput, RawTensor, ShapeError},
};

pub mod decoder;
pub mod mapper;
pub mod nms;

#[cfg(feature = "recorded_backend")]
mod recorded;
#[cfg(feature = "recorded_backend")]
pub use self::recorded::{RecordedBackend, RecordedBackendError};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 外部推理后端，输入预处理后的张量，输出检测头的原始结果
pub trait InferenceBackend {
  type Error: std::error::Error + Send + Sync + 'static;

  fn infer(&self, input: &ModelInput) -> Result<RawOutput, Self::Error>;
}

/// 模型输入空间中的候选框（中心点 + 宽高）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
  pub cx: f32,
  pub cy: f32,
  pub w: f32,
  pub h: f32,
  pub confidence: f32,
}

/// 原图像素坐标下的边界框
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
  pub confidence: f32,
}

impl BoundingBox {
  pub fn width(&self) -> f32 {
    (self.right - self.left).max(0.0)
  }

  pub fn height(&self) -> f32 {
    (self.bottom - self.top).max(0.0)
  }

  /// 面积，宽或高为负、结果非有限时为 0
  pub fn area(&self) -> f32 {
    let area = self.width() * self.height();
    if area.is_finite() { area } else { 0.0 }
  }

  /// 裁剪到 `[0, width] x [0, height]`
  pub fn clamped(&self, width: u32, height: u32) -> Self {
    let (w, h) = (width as f32, height as f32);
    Self {
      left: self.left.clamp(0.0, w),
      top: self.top.clamp(0.0, h),
      right: self.right.clamp(0.0, w),
      bottom: self.bottom.clamp(0.0, h),
      confidence: self.confidence,
    }
  }
}

/// 平均置信度（百分比），没有框时为 0
pub fn average_confidence_percent(boxes: &[BoundingBox]) -> f32 {
  if boxes.is_empty() {
    return 0.0;
  }
  let sum: f32 = boxes.iter().map(|b| b.confidence).sum();
  sum / boxes.len() as f32 * 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
  pub boxes: Box<[BoundingBox]>,
  pub count: usize,
  pub average_confidence_percent: f32,
}

impl DetectionResult {
  pub fn from_boxes(boxes: Vec<BoundingBox>) -> Self {
    let average_confidence_percent = average_confidence_percent(&boxes);
    Self {
      count: boxes.len(),
      boxes: boxes.into_boxed_slice(),
      average_confidence_percent,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.boxes.is_empty()
  }
}

/// 解码、映射并抑制一次推理的原始输出
pub fn postprocess(
  tensor: &RawTensor,
  config: &DetectorConfig,
  image_width: u32,
  image_height: u32,
) -> Result<DetectionResult, ConfigError> {
  config.validate()?;

  let boxes: Vec<BoundingBox> = decoder::decode(tensor, config.confidence_threshold)
    .iter()
    .map(|d| mapper::to_image_space(d, config.model_input_size, image_width, image_height))
    .collect();
  let boxes = nms::suppress(&boxes, config.iou_threshold);

  debug!("检测到 {} 个目标", boxes.len());
  Ok(DetectionResult::from_boxes(boxes))
}

#[derive(Error, Debug)]
pub enum DetectError {
  #[error("输出张量形状错误: {0}")]
  Shape(#[from] ShapeError),
  #[error("配置错误: {0}")]
  Config(#[from] ConfigError),
  #[error("推理后端错误: {0}")]
  Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// 单类别检测器：预处理、推理、后处理
pub struct Detector<B> {
  backend: B,
  config: DetectorConfig,
}

impl<B: InferenceBackend> Detector<B> {
  pub fn new(backend: B, config: DetectorConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self { backend, config })
  }

  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }

  pub fn detect(&self, image: &RgbImage) -> Result<DetectionResult, DetectError> {
    let input = ModelInput::from_image(image, self.config.model_input_size);
    let output = self
      .backend
      .infer(&input)
      .map_err(|e| DetectError::Backend(Box::new(e)))?;
    let tensor = RawTensor::try_from(output)?;
    Ok(postprocess(
      &tensor,
      &self.config,
      image.width(),
      image.height(),
    )?)
  }
}

impl<B: InferenceBackend> Model for Detector<B> {
  type Input = RgbImage;
  type Output = DetectionResult;
  type Error = DetectError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.detect(input)
  }
}
