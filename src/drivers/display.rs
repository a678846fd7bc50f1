/// 16-bit 5-6-5 color as the panel driver takes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Rgb565 = Rgb565(0x0000);
    pub const WHITE: Rgb565 = Rgb565(0xFFFF);
    pub const RED: Rgb565 = Rgb565(0xF800);
    pub const GREEN: Rgb565 = Rgb565(0x07E0);
    pub const BLUE: Rgb565 = Rgb565(0x001F);
    pub const YELLOW: Rgb565 = Rgb565(0xFFE0);
    pub const CYAN: Rgb565 = Rgb565(0x07FF);
    pub const DARK_GRAY: Rgb565 = Rgb565(0x4208);
    pub const ORANGE: Rgb565 = Rgb565(0xFC00);

    pub fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        Rgb565(((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3))
    }

    /// Expands to 8 bits per channel, replicating the high bits into the low ones.
    pub fn to_rgb888(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }
}

/// Inclusive rectangle fill in display coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawSpan {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
    pub color: Rgb565,
}

impl DrawSpan {
    /// One-pixel-wide vertical run.
    pub fn column(x: u16, top: u16, bottom: u16, color: Rgb565) -> Self {
        Self {
            x0: x,
            y0: top.min(bottom),
            x1: x,
            y1: top.max(bottom),
            color,
        }
    }

    pub fn width(&self) -> usize {
        (self.x1 - self.x0) as usize + 1
    }

    pub fn height(&self) -> usize {
        (self.y1 - self.y0) as usize + 1
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }
}

/// The display driver side of the boundary: something that can fill spans.
pub trait DisplaySink {
    fn fill_span(&mut self, span: &DrawSpan);
}

/// Keeps every span it is handed, in order.
#[derive(Debug, Default)]
pub struct SpanRecorder {
    pub spans: Vec<DrawSpan>,
}

impl DisplaySink for SpanRecorder {
    fn fill_span(&mut self, span: &DrawSpan) {
        self.spans.push(*span);
    }
}

/// In-memory RGB565 panel. Fills are clipped to the panel.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u16>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize, fill: Rgb565) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb565> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Rgb565(self.pixels[y * self.width + x]))
    }

    /// Packed RGB888 rows, top to bottom.
    pub fn to_rgb888(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &raw in &self.pixels {
            let (r, g, b) = Rgb565(raw).to_rgb888();
            out.extend_from_slice(&[r, g, b]);
        }
        out
    }
}

impl DisplaySink for Framebuffer {
    fn fill_span(&mut self, span: &DrawSpan) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let x_end = (span.x1 as usize).min(self.width - 1);
        let y_end = (span.y1 as usize).min(self.height - 1);
        for y in span.y0 as usize..=y_end {
            let row = y * self.width;
            for x in span.x0 as usize..=x_end {
                self.pixels[row + x] = span.color.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb565_expands_to_full_range() {
        assert_eq!(Rgb565::WHITE.to_rgb888(), (255, 255, 255));
        assert_eq!(Rgb565::BLACK.to_rgb888(), (0, 0, 0));
        assert_eq!(Rgb565::GREEN.to_rgb888(), (0, 255, 0));
        assert_eq!(Rgb565::from_rgb888(255, 0, 0), Rgb565::RED);
    }

    #[test]
    fn framebuffer_clips_fills() {
        let mut fb = Framebuffer::new(4, 3, Rgb565::BLACK);
        fb.fill_span(&DrawSpan::column(2, 5, 1, Rgb565::RED));
        assert_eq!(fb.pixel(2, 0), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(2, 1), Some(Rgb565::RED));
        assert_eq!(fb.pixel(2, 2), Some(Rgb565::RED));
        assert_eq!(fb.pixel(1, 2), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(2, 3), None);

        fb.fill_span(&DrawSpan {
            x0: 10,
            y0: 0,
            x1: 12,
            y1: 2,
            color: Rgb565::RED,
        });
        assert_eq!(fb.to_rgb888().len(), 4 * 3 * 3);
    }

    #[test]
    fn column_span_orders_its_ends() {
        let span = DrawSpan::column(7, 30, 10, Rgb565::CYAN);
        assert_eq!((span.y0, span.y1), (10, 30));
        assert_eq!(span.height(), 21);
        assert_eq!(span.width(), 1);
        assert!(span.contains(7, 20));
        assert!(!span.contains(8, 20));
    }
}
