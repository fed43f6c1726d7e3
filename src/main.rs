// 该文件是 Jishu （计数） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use jishu::{
  FromUrl,
  input::InputWrapper,
  model::{Detector, RecordedBackend},
  output::OutputWrapper,
  task::{OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();
  let config = args.detector_config();

  info!("模型输出记录: {}", args.tensor);
  info!("输入来源: {}", args.input);
  info!("输出路径: {:?}", args.output.iter().map(|u| u.as_str()).collect::<Vec<_>>());
  info!(
    "模型输入尺寸: {}, 置信度阈值: {}, NMS 阈值: {}",
    config.model_input_size, config.confidence_threshold, config.iou_threshold
  );

  let input = InputWrapper::from_url(&args.input)?;
  let backend = RecordedBackend::from_url(&args.tensor)?;
  let detector = Detector::new(backend, config)?;
  let outputs = args
    .output
    .iter()
    .map(OutputWrapper::from_url)
    .collect::<Result<Vec<_>, _>>()?;

  let result = OneShotTask.run_task(input, detector, outputs)?;

  println!("检测数量: {}", result.count);
  println!("平均置信度: {:.1}%", result.average_confidence_percent);

  Ok(())
}
