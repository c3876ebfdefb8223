//! Pixel-to-wheel conversion and the uinput scroll sink.
//!
//! Frames arrive in pixels. Downstream, one legacy wheel detent stands for
//! `pixels_per_detent` pixels and is worth 120 high-resolution units, so
//! every pixel becomes `120 / pixels_per_detent` hi-res units. Fractions
//! are carried between frames, and legacy `REL_WHEEL` detents are emitted
//! each time the accumulated hi-res value crosses a full detent, for
//! applications that ignore the hi-res axes.

use glide_platform_core::event::ScrollAxis;

/// High-resolution wheel units per legacy detent.
pub const HI_RES_UNITS_PER_DETENT: i32 = 120;

/// Wheel values to emit for one axis of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelUpdate {
    pub hi_res: i32,
    pub detents: i32,
}

/// Converts pixel deltas to hi-res and legacy wheel values.
#[derive(Debug, Clone)]
pub struct HiResConverter {
    units_per_pixel: f64,
    carry: [f64; 2],
    accumulated: [i32; 2],
}

impl HiResConverter {
    pub fn new(pixels_per_detent: f64) -> Self {
        let pixels_per_detent = if pixels_per_detent.is_finite() && pixels_per_detent > 0.0 {
            pixels_per_detent
        } else {
            tracing::warn!(pixels_per_detent, "Invalid pixels_per_detent, using 76");
            76.0
        };
        Self {
            units_per_pixel: f64::from(HI_RES_UNITS_PER_DETENT) / pixels_per_detent,
            carry: [0.0; 2],
            accumulated: [0; 2],
        }
    }

    /// Convert `pixels` on `axis`.
    pub fn convert(&mut self, axis: ScrollAxis, pixels: i32) -> WheelUpdate {
        let i = axis_index(axis);
        let exact = f64::from(pixels) * self.units_per_pixel + self.carry[i];
        let hi_res = exact.trunc();
        self.carry[i] = exact - hi_res;
        let hi_res = hi_res as i32;

        self.accumulated[i] = self.accumulated[i].saturating_add(hi_res);
        let detents = self.accumulated[i] / HI_RES_UNITS_PER_DETENT;
        self.accumulated[i] -= detents * HI_RES_UNITS_PER_DETENT;

        WheelUpdate { hi_res, detents }
    }

    /// Forget fractions at the end of a gesture.
    pub fn reset(&mut self) {
        self.carry = [0.0; 2];
        self.accumulated = [0; 2];
    }
}

fn axis_index(axis: ScrollAxis) -> usize {
    match axis {
        ScrollAxis::Vertical => 0,
        ScrollAxis::Horizontal => 1,
    }
}

#[cfg(target_os = "linux")]
pub use uinput::UinputScrollSink;

#[cfg(target_os = "linux")]
mod uinput {
    use evdev::RelativeAxisType;
    use glide_common::error::GlideResult;
    use glide_platform_core::event::{ScrollAxis, ScrollOutput, ScrollPhase};
    use glide_platform_core::sink::ScrollSink;

    use super::HiResConverter;
    use crate::virtual_pointer::VirtualPointer;

    /// Posts scroll frames through the virtual pointer.
    #[derive(Debug)]
    pub struct UinputScrollSink {
        pointer: VirtualPointer,
        converter: HiResConverter,
    }

    impl UinputScrollSink {
        pub fn new(pointer: VirtualPointer, pixels_per_detent: f64) -> Self {
            Self {
                pointer,
                converter: HiResConverter::new(pixels_per_detent),
            }
        }
    }

    impl ScrollSink for UinputScrollSink {
        fn post(&mut self, output: &ScrollOutput) -> GlideResult<()> {
            if output.phase == ScrollPhase::End {
                self.converter.reset();
                return Ok(());
            }

            let vertical = self.converter.convert(ScrollAxis::Vertical, output.dy);
            let horizontal = self.converter.convert(ScrollAxis::Horizontal, output.dx);
            self.pointer.emit_relative(&[
                (RelativeAxisType::REL_WHEEL_HI_RES, vertical.hi_res),
                (RelativeAxisType::REL_WHEEL, vertical.detents),
                (RelativeAxisType::REL_HWHEEL_HI_RES, horizontal.hi_res),
                (RelativeAxisType::REL_HWHEEL, horizontal.detents),
            ])
        }

        fn name(&self) -> &str {
            "uinput"
        }
    }
}
