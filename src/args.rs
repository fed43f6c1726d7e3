// 该文件是 Jishu （计数） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use jishu::config::{
  DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MODEL_INPUT_SIZE, DetectorConfig,
};

/// Jishu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型原始输出记录
  /// - tensor:///path/to/output.json
  #[arg(long, value_name = "TENSOR")]
  pub tensor: Url,

  /// 输入图像
  /// - image:///path/to/input.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径，可重复指定
  /// - image:///path/to/output.png[?font=/path/to/font.ttf]
  /// - record:///path/to/output.json
  #[arg(long, value_name = "OUTPUT")]
  pub output: Vec<Url>,

  /// 模型输入边长（像素）
  #[arg(long, default_value_t = DEFAULT_MODEL_INPUT_SIZE, value_name = "SIZE")]
  pub model_input_size: u32,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_CONFIDENCE_THRESHOLD, value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD, value_name = "THRESHOLD")]
  pub iou_threshold: f32,
}

impl Args {
  pub fn detector_config(&self) -> DetectorConfig {
    DetectorConfig::default()
      .with_model_input_size(self.model_input_size)
      .with_confidence_threshold(self.confidence)
      .with_iou_threshold(self.iou_threshold)
  }
}
