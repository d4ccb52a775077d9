//! Domain-to-screen mappings: band, linear and sequential colour scales,
//! plus the size-derived margins every chart uses.
//!
//! The band and linear scales follow d3-scale semantics so the charts keep
//! the proportions the dashboard was designed with.

use std::fmt;

use serde::Serialize;

use crate::config::MarginConfig;
use crate::layout::Size;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margin {
    /// Margins grow with the smaller container side but never drop below the
    /// configured floors.
    pub fn from_size(size: Size, config: &MarginConfig) -> Self {
        let base = size.width.min(size.height);
        Self {
            top: config.top_floor.max(base * config.top_ratio),
            right: config.right_floor.max(base * config.right_ratio),
            bottom: config.bottom_floor.max(base * config.bottom_ratio),
            left: config.left_floor.max(base * config.left_ratio),
        }
    }

    /// Drawing area left inside `size`, `None` when nothing would fit.
    pub fn inner(&self, size: Size) -> Option<Size> {
        let inner = Size::new(
            size.width - self.left - self.right,
            size.height - self.top - self.bottom,
        );
        (!inner.is_empty()).then_some(inner)
    }
}

pub fn scaled_font(base: f32, ratio: f32, floor: f32) -> f32 {
    floor.max(base * ratio)
}

/// Discrete keys to equal-width slots, in domain order.
#[derive(Debug, Clone)]
pub struct BandScale {
    domain: Vec<String>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
}

impl BandScale {
    pub fn new(domain: Vec<String>, range: (f32, f32)) -> Self {
        Self {
            domain,
            range: (f64::from(range.0), f64::from(range.1)),
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
        }
    }

    /// Sets inner and outer padding together, as a fraction of the step.
    pub fn padding(mut self, padding: f32) -> Self {
        let padding = f64::from(padding).clamp(0.0, 1.0);
        self.padding_inner = padding;
        self.padding_outer = padding;
        self
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    fn geometry(&self) -> (f64, f64, f64) {
        let n = self.domain.len() as f64;
        let (r0, r1) = self.range;
        let (lo, hi) = if r1 < r0 { (r1, r0) } else { (r0, r1) };
        let step = (hi - lo) / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        let start = lo + (hi - lo - step * (n - self.padding_inner)) * self.align;
        (start, step, step * (1.0 - self.padding_inner))
    }

    pub fn step(&self) -> f32 {
        self.geometry().1 as f32
    }

    pub fn bandwidth(&self) -> f32 {
        self.geometry().2 as f32
    }

    /// Start of the slot for `key`, `None` for keys outside the domain.
    pub fn position(&self, key: &str) -> Option<f32> {
        let idx = self.domain.iter().position(|item| item == key)?;
        let (start, step, _) = self.geometry();
        let slot = if self.range.1 < self.range.0 {
            self.domain.len() - 1 - idx
        } else {
            idx
        };
        Some((start + step * slot as f64) as f32)
    }

    pub fn center(&self, key: &str) -> Option<f32> {
        self.position(key).map(|pos| pos + self.bandwidth() / 2.0)
    }
}

/// Continuous numeric domain to a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self {
            domain,
            range: (f64::from(range.0), f64::from(range.1)),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn map(&self, value: f64) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d0 == d1 {
            return ((r0 + r1) / 2.0) as f32;
        }
        (r0 + (value - d0) / (d1 - d0) * (r1 - r0)) as f32
    }

    /// Extends the domain to round tick boundaries.
    pub fn nice(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        let reversed = stop < start;
        if reversed {
            std::mem::swap(&mut start, &mut stop);
        }
        let mut previous = None;
        for _ in 0..10 {
            let step = tick_increment(start, stop, count as f64);
            if previous == Some(step) {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            previous = Some(step);
        }
        self.domain = if reversed { (stop, start) } else { (start, stop) };
        self
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        ticks(d0.min(d1), d0.max(d1), count)
    }
}

fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    let step = (stop - start) / count.max(0.0);
    if !step.is_finite() || step <= 0.0 {
        return 0.0;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    if power >= 0.0 {
        factor * 10f64.powf(power)
    } else {
        -10f64.powf(-power) / factor
    }
}

/// Round tick values covering `[start, stop]`.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if !start.is_finite() || !stop.is_finite() || count == 0 {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let step = tick_increment(start, stop, count as f64);
    if step > 0.0 {
        let first = (start / step).ceil() as i64;
        let last = (stop / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    } else if step < 0.0 {
        let inv = -step;
        let first = (start * inv).ceil() as i64;
        let last = (stop * inv).floor() as i64;
        (first..=last).map(|i| i as f64 / inv).collect()
    } else {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const YL_OR_BR: [Rgb; 9] = [
    Rgb::from_hex(0xffffe5),
    Rgb::from_hex(0xfff7bc),
    Rgb::from_hex(0xfee391),
    Rgb::from_hex(0xfec44f),
    Rgb::from_hex(0xfe9929),
    Rgb::from_hex(0xec7014),
    Rgb::from_hex(0xcc4c02),
    Rgb::from_hex(0x993404),
    Rgb::from_hex(0x662506),
];

/// Colour ramps over `t` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolator {
    /// Yellow through orange to brown, light to dark.
    YlOrBr,
}

impl Interpolator {
    pub fn color(self, t: f64) -> Rgb {
        match self {
            Self::YlOrBr => rgb_basis(&YL_OR_BR, t),
        }
    }
}

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

fn basis_channel(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let (i, t) = if t <= 0.0 {
        (0, 0.0)
    } else if t >= 1.0 {
        (n - 1, 1.0)
    } else {
        ((t * n as f64).floor() as usize, t)
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { values[i + 2] } else { 2.0 * v2 - v1 };
    basis((t - i as f64 / n as f64) * n as f64, v0, v1, v2, v3)
}

/// Uniform cubic B-spline through the ramp stops, per channel.
fn rgb_basis(stops: &[Rgb], t: f64) -> Rgb {
    let channel = |pick: fn(&Rgb) -> u8| {
        let values: Vec<f64> = stops.iter().map(|c| f64::from(pick(c))).collect();
        basis_channel(&values, t).round().clamp(0.0, 255.0) as u8
    };
    Rgb {
        r: channel(|c| c.r),
        g: channel(|c| c.g),
        b: channel(|c| c.b),
    }
}

/// Numeric domain to colour. With `inverted`, the domain maximum lands on
/// the start of the ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequentialColorScale {
    domain: (f64, f64),
    interpolator: Interpolator,
    inverted: bool,
}

impl SequentialColorScale {
    pub fn new(domain: (f64, f64), interpolator: Interpolator) -> Self {
        Self {
            domain,
            interpolator,
            inverted: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn normalize(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let t = if d0 == d1 { 0.0 } else { (value - d0) / (d1 - d0) };
        if self.inverted { 1.0 - t } else { t }
    }

    pub fn color(&self, value: f64) -> Rgb {
        self.interpolator.color(self.normalize(value))
    }
}
