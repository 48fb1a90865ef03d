//! Owned single-channel depth map in row-major layout (stride == width).
//!
//! Values are whatever the external depth estimator produced (relative
//! depth, not metric). Non-finite values are treated as missing samples.
use super::traits::{ImageView, ImageViewMut};
use crate::types::PixelRect;

#[derive(Clone, Debug)]
pub struct DepthMap {
    /// Map width in pixels
    pub w: usize,
    /// Map height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

/// Integer pixel window `[x0, x1) × [y0, y1)` clipped to a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Window {
    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// The four corner sub-windows (TL, TR, BL, BR), each a quarter of the
    /// width and height. `None` when the window is smaller than 4×4.
    pub fn corner_windows(&self) -> Option<[Window; 4]> {
        let (qw, qh) = (self.width() / 4, self.height() / 4);
        if qw == 0 || qh == 0 {
            return None;
        }
        let (x0, y0, x1, y1) = (self.x0, self.y0, self.x1, self.y1);
        Some([
            Window {
                x0,
                y0,
                x1: x0 + qw,
                y1: y0 + qh,
            },
            Window {
                x0: x1 - qw,
                y0,
                x1,
                y1: y0 + qh,
            },
            Window {
                x0,
                y0: y1 - qh,
                x1: x0 + qw,
                y1,
            },
            Window {
                x0: x1 - qw,
                y0: y1 - qh,
                x1,
                y1,
            },
        ])
    }
}

impl DepthMap {
    /// Construct a zero-initialized map of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, 0.0)
    }

    /// Construct a map of size `w × h` with every sample set to `value`.
    pub fn filled(w: usize, h: usize, value: f32) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![value; w * h],
        }
    }

    /// Wrap an existing row-major buffer. `None` if the size does not match.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == w * h).then_some(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    /// Sample at a sub-pixel location (truncated to the containing pixel).
    /// `None` outside the map or when the sample is not finite.
    pub fn sample(&self, p: [f32; 2]) -> Option<f32> {
        if !(p[0] >= 0.0 && p[1] >= 0.0) {
            return None;
        }
        let (x, y) = (p[0] as usize, p[1] as usize);
        if x >= self.w || y >= self.h {
            return None;
        }
        let v = self.get(x, y);
        v.is_finite().then_some(v)
    }

    /// Clip a pixel rectangle to the map. `None` when nothing remains.
    pub fn clip(&self, rect: &PixelRect) -> Option<Window> {
        if !(rect.x.is_finite()
            && rect.y.is_finite()
            && rect.width.is_finite()
            && rect.height.is_finite())
        {
            return None;
        }
        let x0 = rect.x.floor().max(0.0) as usize;
        let y0 = rect.y.floor().max(0.0) as usize;
        let x1 = ((rect.x + rect.width).ceil().max(0.0) as usize).min(self.w);
        let y1 = ((rect.y + rect.height).ceil().max(0.0) as usize).min(self.h);
        let win = Window { x0, y0, x1, y1 };
        (!win.is_empty()).then_some(win)
    }

    /// Window covering the central `fraction × fraction` of the map.
    pub fn central_window(&self, fraction: f32) -> Option<Window> {
        let f = fraction.clamp(0.0, 1.0);
        let cw = self.w as f32 * f;
        let ch = self.h as f32 * f;
        let rect = PixelRect::new(
            (self.w as f32 - cw) * 0.5,
            (self.h as f32 - ch) * 0.5,
            cw,
            ch,
        );
        self.clip(&rect)
    }

    /// Finite samples inside `win`.
    pub fn window_values(&self, win: &Window) -> Vec<f32> {
        let mut out = Vec::with_capacity(win.width() * win.height());
        for y in win.y0..win.y1.min(self.h) {
            let row = self.row(y);
            let x1 = win.x1.min(self.w);
            if win.x0 >= x1 {
                continue;
            }
            out.extend(row[win.x0..x1].iter().copied().filter(|v| v.is_finite()));
        }
        out
    }

    /// Median of the finite samples inside `win`.
    pub fn window_median(&self, win: &Window) -> Option<f32> {
        let mut values = self.window_values(win);
        median(&mut values)
    }

    /// Overwrite every sample inside `rect` (clipped) with `value`.
    pub fn fill_rect(&mut self, rect: &PixelRect, value: f32) {
        if let Some(win) = self.clip(rect) {
            for y in win.y0..win.y1 {
                self.row_mut(y)[win.x0..win.x1].fill(value);
            }
        }
    }
}

/// Median of a slice, reordering it in place. Even lengths average the two
/// middle values. `None` for an empty slice.
pub fn median(values: &mut [f32]) -> Option<f32> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        Some(upper)
    } else {
        let lower_max = lower.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Some(0.5 * (lower_max + upper))
    }
}

impl ImageView for DepthMap {
    type Pixel = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}

impl ImageViewMut for DepthMap {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.stride;
        let end = start + self.w;
        &mut self.data[start..end]
    }
}
