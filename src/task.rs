// 该文件是 Jishu （计数） 项目的一部分。
// src/task.rs - 推理任务
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
use tracing::info;

use crate::{
  model::{DetectionResult, Model},
  output::Render,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<DetectionResult, Self::Error>;
}

/// 取第一帧图像，推理并渲染一次
pub struct OneShotTask;

impl<
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RgbImage>,
  M: Model<Input = RgbImage, Output = DetectionResult, Error = ME>,
  O: Render<Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<DetectionResult, Self::Error> {
    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功 ({}x{})，开始推理...", image.width(), image.height());

    let now = std::time::Instant::now();
    let result = model.infer(&image)?;
    let elapsed = now.elapsed();
    info!(
      "推理完成，耗时: {:.2?}，检测到 {} 个目标，平均置信度 {:.1}%",
      elapsed, result.count, result.average_confidence_percent
    );

    let now = std::time::Instant::now();
    output.render_result(&image, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(result)
  }
}
