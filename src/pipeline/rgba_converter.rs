use std::convert::TryFrom;

use anyhow::{Result, anyhow};
use image::{RgbaImage, imageops};
use nokhwa::{Buffer, utils::FrameFormat};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

use crate::types::Frame;

#[derive(Debug)]
pub struct RgbaFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn convert_camera_frame(frame: &Buffer) -> Result<RgbaFrame> {
    let resolution = frame.resolution();
    let width = resolution.width_x;
    let height = resolution.height_y;
    let rgba = convert_raw(frame.source_frame_format(), frame.buffer(), width, height)?;

    Ok(RgbaFrame {
        rgba,
        width,
        height,
    })
}

pub fn convert_raw(format: FrameFormat, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    match format {
        FrameFormat::NV12 => nv12_to_rgba(data, width, height),
        FrameFormat::YUYV => yuyv_to_rgba(data, width, height),
        FrameFormat::MJPEG => mjpeg_to_rgba(data),
        FrameFormat::RAWRGB => packed_to_rgba(data, width, height, PackedLayout::Rgb),
        FrameFormat::RAWBGR => packed_to_rgba(data, width, height, PackedLayout::Bgr),
        FrameFormat::GRAY => packed_to_rgba(data, width, height, PackedLayout::Gray),
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

fn ensure_len(label: &str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(anyhow!(
            "{label} buffer too small: got {}, expected {expected}",
            data.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_len = pixel_count(width, height);
    let uv_len = y_len / 2;
    ensure_len("NV12", data, y_len + uv_len)?;

    let image = YuvBiPlanarImage {
        y_plane: &data[..y_len],
        y_stride: width,
        uv_plane: &data[y_len..y_len + uv_len],
        uv_stride: width,
        width,
        height,
    };

    let mut rgba = vec![0u8; y_len * 4];
    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    ensure_len("YUYV", data, pixel_count(width, height) * 2)?;

    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    let mut rgba = vec![0u8; pixel_count(width, height) * 4];
    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422→RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn mjpeg_to_rgba(data: &[u8]) -> Result<Vec<u8>> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    if let Some(info) = decoder.info() {
        let expected_len = usize::try_from(info.width)
            .and_then(|w| usize::try_from(info.height).map(|h| w * h * 4))
            .map_err(|_| anyhow!("MJPEG dimensions do not fit usize"))?;
        ensure_len("MJPEG output", &rgba, expected_len)?;
    }

    Ok(rgba)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PackedLayout {
    Rgb,
    Bgr,
    Gray,
}

impl PackedLayout {
    fn bytes_per_pixel(self) -> usize {
        match self {
            PackedLayout::Rgb | PackedLayout::Bgr => 3,
            PackedLayout::Gray => 1,
        }
    }
}

fn packed_to_rgba(data: &[u8], width: u32, height: u32, layout: PackedLayout) -> Result<Vec<u8>> {
    let bpp = layout.bytes_per_pixel();
    let pixels = pixel_count(width, height);
    ensure_len(&format!("{layout:?}"), data, pixels * bpp)?;

    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data[..pixels * bpp].par_chunks_exact(bpp))
        .for_each(|(dst, src)| {
            let [r, g, b] = match layout {
                PackedLayout::Rgb => [src[0], src[1], src[2]],
                PackedLayout::Bgr => [src[2], src[1], src[0]],
                PackedLayout::Gray => [src[0], src[0], src[0]],
            };
            dst.copy_from_slice(&[r, g, b, 255]);
        });

    Ok(rgba)
}

/// Flips the frame left to right so the preview behaves like a mirror.
pub fn mirror_horizontal(frame: &mut Frame) -> Result<()> {
    let rgba = std::mem::take(&mut frame.rgba);
    let len = rgba.len();
    let mut image = RgbaImage::from_raw(frame.width, frame.height, rgba).ok_or_else(|| {
        anyhow!(
            "frame buffer size mismatch: got {len} bytes for {}x{}",
            frame.width,
            frame.height
        )
    })?;
    imageops::flip_horizontal_in_place(&mut image);
    frame.rgba = image.into_raw();
    Ok(())
}

/// Packs RGBA bytes into `0x00RRGGBB` words for the preview window.
pub fn rgba_to_0rgb(rgba: &[u8], out: &mut Vec<u32>) {
    out.clear();
    out.extend(rgba.chunks_exact(4).map(|px| {
        ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_is_swapped_into_rgba() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let rgba = convert_raw(FrameFormat::RAWBGR, &data, 2, 1).unwrap();
        assert_eq!(rgba, vec![3, 2, 1, 255, 6, 5, 4, 255]);
    }

    #[test]
    fn gray_is_expanded() {
        let rgba = convert_raw(FrameFormat::GRAY, &[7, 9], 2, 1).unwrap();
        assert_eq!(rgba, vec![7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(convert_raw(FrameFormat::RAWRGB, &[0u8; 5], 2, 1).is_err());
        assert!(convert_raw(FrameFormat::YUYV, &[0u8; 3], 2, 1).is_err());
        assert!(convert_raw(FrameFormat::NV12, &[0u8; 4], 2, 2).is_err());
    }

    #[test]
    fn mirror_swaps_columns() {
        let mut frame = Frame::new(
            vec![
                1, 1, 1, 255, 2, 2, 2, 255, 3, 3, 3, 255, //
                4, 4, 4, 255, 5, 5, 5, 255, 6, 6, 6, 255,
            ],
            3,
            2,
        );
        mirror_horizontal(&mut frame).unwrap();
        let firsts: Vec<u8> = frame.rgba.chunks_exact(4).map(|px| px[0]).collect();
        assert_eq!(firsts, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn mirror_rejects_bad_dimensions() {
        let mut frame = Frame::new(vec![0u8; 12], 4, 4);
        assert!(mirror_horizontal(&mut frame).is_err());
    }

    #[test]
    fn packs_for_window() {
        let mut out = Vec::new();
        rgba_to_0rgb(&[0x12, 0x34, 0x56, 255, 0xff, 0, 0, 255], &mut out);
        assert_eq!(out, vec![0x0012_3456, 0x00ff_0000]);
    }
}
