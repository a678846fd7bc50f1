use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;

use crate::drivers::error::PlotError;
use crate::drivers::{DrawSpan, Rgb565};

fn rgb(color: Rgb565) -> RGBColor {
    let (r, g, b) = color.to_rgb888();
    RGBColor(r, g, b)
}

/// Paints `spans` over a `background` panel of the given size and returns PNG bytes.
pub fn render_spans_png(
    spans: &[DrawSpan],
    width: u32,
    height: u32,
    background: Rgb565,
) -> Result<Vec<u8>, PlotError> {
    if width == 0 || height == 0 {
        return Err(PlotError::EmptySnapshot { width, height });
    }
    let mut buffer = vec![0u8; rgb_buffer_len(width, height)];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&rgb(background))?;
        for span in spans {
            root.draw(&Rectangle::new(
                [
                    (span.x0 as i32, span.y0 as i32),
                    (span.x1 as i32, span.y1 as i32),
                ],
                rgb(span.color).filled(),
            ))?;
        }
        root.present()?;
    }
    encode_png(&buffer, width, height)
}

// RGB888, sized in usize so big canvases do not wrap
fn rgb_buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PlotError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| PlotError::Snapshot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_show_up_in_the_png() {
        let spans = [DrawSpan {
            x0: 10,
            y0: 10,
            x1: 29,
            y1: 29,
            color: Rgb565::RED,
        }];
        let png = render_spans_png(&spans, 40, 40, Rgb565::BLACK).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (40, 40));
        assert_eq!(decoded.get_pixel(20, 20).0, [255, 0, 0]);
        assert_eq!(decoded.get_pixel(2, 2).0, [0, 0, 0]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn buffer_len_does_not_wrap_at_u32() {
        assert_eq!(rgb_buffer_len(40, 40), 4800);
        assert_eq!(rgb_buffer_len(65_536, 32_768), 6_442_450_944);
    }

    #[test]
    fn empty_canvas_is_rejected() {
        let err = render_spans_png(&[], 0, 10, Rgb565::BLACK).unwrap_err();
        assert!(matches!(err, PlotError::EmptySnapshot { .. }));
    }
}
