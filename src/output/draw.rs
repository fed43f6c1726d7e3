// 该文件是 Jishu （计数） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{BoundingBox, average_confidence_percent};

// 绘制常量
const LABEL_FONT_SIZE: f32 = 28.0;
const LABEL_PADDING: i64 = 3;
const BOX_THICKNESS: i64 = 3;
const BOX_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const TEXT_COLOR: [u8; 3] = [255, 255, 255]; // 白色

// 内置默认字体 DejaVu Sans，许可见 assets/LICENSE-font.txt
static DEFAULT_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

#[derive(Error, Debug)]
pub enum AnnotatorError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 绘制后的图像与统计信息
#[derive(Debug, Clone)]
pub struct Annotation {
  pub image: RgbImage,
  pub count: usize,
  pub average_confidence_percent: f32,
}

/// 标签文本，置信度以百分比显示并保留一位小数
pub fn confidence_label(confidence: f32) -> String {
  format!("{:.1}%", confidence * 100.0)
}

pub struct Annotator {
  font: Option<FontArc>,
  font_size: f32,
  box_color: Rgb<u8>,
  text_color: Rgb<u8>,
}

impl Default for Annotator {
  fn default() -> Self {
    Self::new()
  }
}

impl Annotator {
  /// 使用内置字体的绘制器
  pub fn new() -> Self {
    let font = FontArc::try_from_slice(DEFAULT_FONT)
      .inspect_err(|e| warn!("无法加载内置字体, 将不绘制置信度标签: {}", e))
      .ok();
    Self {
      font,
      font_size: LABEL_FONT_SIZE,
      box_color: Rgb(BOX_COLOR),
      text_color: Rgb(TEXT_COLOR),
    }
  }

  pub fn with_font(font: FontArc) -> Self {
    Self {
      font: Some(font),
      font_size: LABEL_FONT_SIZE,
      box_color: Rgb(BOX_COLOR),
      text_color: Rgb(TEXT_COLOR),
    }
  }

  pub fn from_font_file<P: AsRef<Path>>(path: P) -> Result<Self, AnnotatorError> {
    let path = path.as_ref();
    info!("加载字体文件: {}", path.display());
    let data = std::fs::read(path)?;
    let font = FontArc::try_from_vec(data)?;
    Ok(Self::with_font(font))
  }

  pub fn font_size(mut self, font_size: f32) -> Self {
    self.font_size = font_size;
    self
  }

  pub fn box_color(mut self, color: [u8; 3]) -> Self {
    self.box_color = Rgb(color);
    self
  }

  /// 在输入图像的副本上绘制检测框，输入图像不会被修改
  pub fn annotate(&self, image: &RgbImage, boxes: &[BoundingBox]) -> Annotation {
    let mut image = image.clone();
    for bbox in boxes {
      self.draw_bbox_with_label(&mut image, bbox);
    }

    Annotation {
      image,
      count: boxes.len(),
      average_confidence_percent: average_confidence_percent(boxes),
    }
  }

  fn draw_bbox_with_label(&self, image: &mut RgbImage, bbox: &BoundingBox) {
    if !(bbox.left.is_finite()
      && bbox.top.is_finite()
      && bbox.right.is_finite()
      && bbox.bottom.is_finite())
    {
      debug!("跳过坐标非有限的框: {:?}", bbox);
      return;
    }

    // 超出 i64 的坐标按饱和转换处理
    let x_min = bbox.left.floor() as i64;
    let y_min = bbox.top.floor() as i64;
    let x_max = bbox.right.ceil() as i64;
    let y_max = bbox.bottom.ceil() as i64;

    // 边框向内加粗
    for t in 0..BOX_THICKNESS {
      let (l, r) = (x_min.saturating_add(t), x_max.saturating_sub(t));
      let (top, bottom) = (y_min.saturating_add(t), y_max.saturating_sub(t));
      if l > r || top > bottom {
        break;
      }
      draw_hline(image, l, r, top, self.box_color);
      draw_hline(image, l, r, bottom, self.box_color);
      draw_vline(image, l, top, bottom, self.box_color);
      draw_vline(image, r, top, bottom, self.box_color);
    }

    if let Some(font) = &self.font {
      self.draw_label(image, font, x_min, y_min, bbox.confidence);
    }
  }

  // 标签放在框左上角的上方，超出图像的部分不绘制
  fn draw_label(&self, image: &mut RgbImage, font: &FontArc, x: i64, y: i64, confidence: f32) {
    let label = confidence_label(confidence);
    let scale = PxScale::from(self.font_size);
    let (text_w, text_h) = text_size(scale, font, &label);

    let label_w = text_w as i64 + 2 * LABEL_PADDING;
    let label_h = text_h as i64 + 2 * LABEL_PADDING;
    let label_x = x;
    let label_y = y.saturating_sub(label_h);

    let (w, h) = (image.width() as i64, image.height() as i64);
    let visible = label_x < w
      && label_y < h
      && label_x.saturating_add(label_w) > 0
      && label_y.saturating_add(label_h) > 0;
    if !visible || label_w <= 0 || label_h <= 0 {
      return;
    }

    // 可见时坐标落在 i32 范围内
    let rect = Rect::at(label_x as i32, label_y as i32).of_size(label_w as u32, label_h as u32);
    draw_filled_rect_mut(image, rect, self.box_color);
    draw_text_mut(
      image,
      self.text_color,
      (label_x + LABEL_PADDING) as i32,
      (label_y + LABEL_PADDING) as i32,
      scale,
      font,
      &label,
    );
  }
}

fn draw_hline(image: &mut RgbImage, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
  let (w, h) = (image.width() as i64, image.height() as i64);
  if y < 0 || y >= h {
    return;
  }
  for x in x0.max(0)..=x1.min(w - 1) {
    image.put_pixel(x as u32, y as u32, color);
  }
}

fn draw_vline(image: &mut RgbImage, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
  let (w, h) = (image.width() as i64, image.height() as i64);
  if x < 0 || x >= w {
    return;
  }
  for y in y0.max(0)..=y1.min(h - 1) {
    image.put_pixel(x as u32, y as u32, color);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bbox(left: f32, top: f32, right: f32, bottom: f32, confidence: f32) -> BoundingBox {
    BoundingBox {
      left,
      top,
      right,
      bottom,
      confidence,
    }
  }

  #[test]
  fn formats_label_with_one_decimal() {
    assert_eq!(confidence_label(0.95), "95.0%");
    assert_eq!(confidence_label(0.9234), "92.3%");
    assert_eq!(confidence_label(1.0), "100.0%");
  }

  #[test]
  fn draws_on_a_copy() {
    let image = RgbImage::from_pixel(40, 30, Rgb([10, 20, 30]));
    let boxes = [bbox(5.0, 5.0, 20.0, 20.0, 0.9)];
    let annotation = Annotator::new().annotate(&image, &boxes);

    assert_eq!(image.get_pixel(5, 5), &Rgb([10, 20, 30]));
    assert_eq!(annotation.image.dimensions(), image.dimensions());
    for (x, y) in [(5, 5), (20, 5), (5, 20), (20, 20), (7, 7), (12, 5)] {
      assert_eq!(annotation.image.get_pixel(x, y), &Rgb(BOX_COLOR));
    }
    // 边框内部与外部保持原样
    assert_eq!(annotation.image.get_pixel(12, 12), &Rgb([10, 20, 30]));
    assert_eq!(annotation.image.get_pixel(30, 25), &Rgb([10, 20, 30]));
  }

  #[test]
  fn reports_count_and_average() {
    let image = RgbImage::new(64, 64);
    let boxes = [
      bbox(0.0, 0.0, 10.0, 10.0, 0.92),
      bbox(20.0, 20.0, 30.0, 30.0, 0.98),
    ];
    let annotation = Annotator::new().annotate(&image, &boxes);
    assert_eq!(annotation.count, 2);
    assert!((annotation.average_confidence_percent - 95.0).abs() < 1e-4);

    let empty = Annotator::new().annotate(&image, &[]);
    assert_eq!(empty.count, 0);
    assert_eq!(empty.average_confidence_percent, 0.0);
    assert_eq!(empty.image, image);
  }

  #[test]
  fn tolerates_boxes_outside_the_image() {
    let image = RgbImage::new(32, 32);
    let boxes = [
      bbox(-10.0, -10.0, 10.0, 10.0, 0.9),
      bbox(100.0, 100.0, 200.0, 200.0, 0.9),
      bbox(-1e30, -1e30, 1e30, 1e30, 0.9),
      bbox(f32::NAN, 0.0, 10.0, 10.0, 0.9),
      bbox(10.0, 10.0, 5.0, 5.0, 0.9),
    ];
    let annotation = Annotator::new().annotate(&image, &boxes);
    assert_eq!(annotation.count, 5);
    assert_eq!(annotation.image.get_pixel(10, 0), &Rgb(BOX_COLOR));
    assert_eq!(annotation.image.get_pixel(0, 10), &Rgb(BOX_COLOR));
  }

  fn changed_pixels(a: &RgbImage, b: &RgbImage, rows: std::ops::Range<u32>) -> usize {
    rows
      .flat_map(|y| (0..a.width()).map(move |x| (x, y)))
      .filter(|&(x, y)| a.get_pixel(x, y) != b.get_pixel(x, y))
      .count()
  }

  #[test]
  fn draws_label_above_top_left_corner() {
    let image = RgbImage::new(200, 200);
    let annotation = Annotator::new().annotate(&image, &[bbox(50.0, 100.0, 150.0, 180.0, 0.953)]);
    let out = &annotation.image;

    // 标签底色紧贴框的上边
    assert_eq!(out.get_pixel(50, 99), &Rgb(BOX_COLOR));
    assert_eq!(out.get_pixel(51, 97), &Rgb(BOX_COLOR));
    assert_eq!(out.get_pixel(49, 99), &Rgb([0, 0, 0]));
    assert!(changed_pixels(&image, out, 0..98) > 0);

    // 文字为白色, 与底色混合后红色分量不为 0
    let text_pixels = (0..100u32)
      .flat_map(|y| (50..150u32).map(move |x| (x, y)))
      .filter(|&(x, y)| out.get_pixel(x, y).0[0] > 128)
      .count();
    assert!(text_pixels > 0);

    // 框内部不受标签影响
    assert_eq!(out.get_pixel(100, 140), &Rgb([0, 0, 0]));
  }

  #[test]
  fn labels_follow_the_font() {
    let image = RgbImage::new(200, 200);
    let boxes = [bbox(50.0, 100.0, 150.0, 180.0, 0.9)];
    let small = Annotator::new().font_size(12.0).annotate(&image, &boxes);
    let large = Annotator::new().font_size(40.0).annotate(&image, &boxes);
    assert!(changed_pixels(&image, &large.image, 0..98) > changed_pixels(&image, &small.image, 0..98));

    let font = FontArc::try_from_slice(DEFAULT_FONT).unwrap();
    let explicit = Annotator::with_font(font).annotate(&image, &boxes);
    assert_eq!(explicit.image, Annotator::new().annotate(&image, &boxes).image);
  }

  #[test]
  fn clips_labels_at_image_edges() {
    let image = RgbImage::new(64, 64);
    let boxes = [
      // 标签完全在图像上方
      bbox(10.0, 0.0, 30.0, 20.0, 0.9),
      // 标签超出右边
      bbox(50.0, 40.0, 63.0, 60.0, 0.9),
      // 标签在图像左侧之外
      bbox(-500.0, 40.0, -400.0, 60.0, 0.9),
    ];
    let annotation = Annotator::new().annotate(&image, &boxes);
    assert_eq!(annotation.count, 3);
    assert_eq!(annotation.image.get_pixel(50, 39), &Rgb(BOX_COLOR));
    assert!((0..40).any(|y| annotation.image.get_pixel(63, y) == &Rgb(BOX_COLOR)));
    assert_eq!(annotation.image.get_pixel(0, 39), &Rgb([0, 0, 0]));
  }

  #[test]
  fn rejects_invalid_font_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("font.ttf");
    std::fs::write(&path, b"not a font").unwrap();
    assert!(matches!(
      Annotator::from_font_file(&path),
      Err(AnnotatorError::InvalidFont(_))
    ));
    assert!(matches!(
      Annotator::from_font_file(dir.path().join("missing.ttf")),
      Err(AnnotatorError::IoError(_))
    ));
  }
}
