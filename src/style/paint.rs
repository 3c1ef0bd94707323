//! Paint descriptors resolved against an evaluation context at draw
//! time.

use smallvec::SmallVec;

use super::EvaluationContext;
use super::color::Color;
use super::stops::StyleProp;

/// Whether a paint fills or strokes the geometry it is applied to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PaintStyle {
    Fill,
    Stroke,
}

/// One paint of a style layer.
///
/// Properties are either constants or zoom-stopped functions; both
/// resolve through [`VectorPaint::properties`], so constant and stopped
/// declarations behave identically at any fixed zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPaint {
    style: PaintStyle,
    color: StyleProp<Color>,
    opacity: StyleProp<f32>,
    width: StyleProp<f32>,
    dash: Option<SmallVec<[f32; 4]>>,
}

impl VectorPaint {
    pub fn fill(color: impl Into<StyleProp<Color>>) -> Self {
        VectorPaint {
            style: PaintStyle::Fill,
            color: color.into(),
            opacity: StyleProp::Constant(1.0),
            width: StyleProp::Constant(0.0),
            dash: None,
        }
    }

    pub fn stroke(color: impl Into<StyleProp<Color>>, width: impl Into<StyleProp<f32>>) -> Self {
        VectorPaint {
            style: PaintStyle::Stroke,
            color: color.into(),
            opacity: StyleProp::Constant(1.0),
            width: width.into(),
            dash: None,
        }
    }

    pub fn with_opacity(mut self, opacity: impl Into<StyleProp<f32>>) -> Self {
        self.opacity = opacity.into();
        self
    }

    pub fn with_dash(mut self, dash: impl IntoIterator<Item = f32>) -> Self {
        self.dash = Some(dash.into_iter().collect());
        self
    }

    pub fn style(&self) -> PaintStyle {
        self.style
    }

    /// Resolves every property for the context's zoom. Opacity
    /// multiplies into the color's alpha.
    pub fn properties(&self, context: &EvaluationContext) -> PaintProperties {
        let zoom = context.zoom;
        let color = self.color.resolve(zoom);
        let opacity = self.opacity.resolve(zoom).clamp(0.0, 1.0);

        PaintProperties {
            style: self.style,
            color: color.with_alpha(color.a * opacity),
            width: self.width.resolve(zoom),
            dash: self.dash.clone(),
        }
    }
}

/// Concrete paint parameters handed to the drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintProperties {
    pub style: PaintStyle,
    pub color: Color,
    pub width: f32,
    pub dash: Option<SmallVec<[f32; 4]>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::stops::Stops;

    #[test]
    fn opacity_multiplies_into_alpha() {
        let paint = VectorPaint::fill(Color::from_rgb8(0, 0, 255)).with_opacity(0.5);
        let props = paint.properties(&EvaluationContext::new(10.0));

        assert_eq!(props.style, PaintStyle::Fill);
        assert_eq!(props.color.a, 0.5);
        assert_eq!(props.color.b, 1.0);
    }

    #[test]
    fn stopped_width_changes_with_zoom() {
        let width = Stops::new([(5.0, 1.0f32), (12.0, 4.0)]).unwrap();
        let paint = VectorPaint::stroke(Color::BLACK, StyleProp::Stopped(width));

        assert_eq!(paint.properties(&EvaluationContext::new(3.0)).width, 1.0);
        assert_eq!(paint.properties(&EvaluationContext::new(11.9)).width, 1.0);
        assert_eq!(paint.properties(&EvaluationContext::new(12.0)).width, 4.0);
    }

    #[test]
    fn constant_and_single_stop_agree() {
        let constant = VectorPaint::stroke(Color::BLACK, 2.0);
        let stopped = VectorPaint::stroke(
            Color::BLACK,
            StyleProp::Stopped(Stops::new([(0.0, 2.0f32)]).unwrap()),
        );

        for zoom in [0.0, 7.5, 14.0, 22.0] {
            let context = EvaluationContext::new(zoom);
            assert_eq!(
                constant.properties(&context).width,
                stopped.properties(&context).width
            );
        }
    }

    #[test]
    fn dash_pattern_is_carried() {
        let paint = VectorPaint::stroke(Color::BLACK, 1.0).with_dash([4.0, 6.0]);
        let props = paint.properties(&EvaluationContext::new(10.0));
        assert_eq!(props.dash.as_deref(), Some(&[4.0, 6.0][..]));
    }
}
