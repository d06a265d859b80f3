use eframe::egui::Color32;
use palette::{Darken, Hsl, IntoColor, Lighten, Srgb};

// ---------------------------------------------------------------------------
// Density colour ramp
// ---------------------------------------------------------------------------

/// Six-step yellow → red ramp used for hexagon density.
const YL_OR_RD: [[u8; 3]; 6] = [
    [255, 255, 178],
    [254, 217, 118],
    [254, 178, 76],
    [253, 141, 60],
    [240, 59, 32],
    [189, 0, 38],
];

/// Quantised colour scale: bin colour index → colour.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    steps: Vec<[u8; 3]>,
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self {
            steps: YL_OR_RD.to_vec(),
        }
    }
}

impl ColorRamp {
    pub fn new(steps: Vec<[u8; 3]>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// RGB triples, as exported in scene JSON.
    pub fn rgb(&self) -> &[[u8; 3]] {
        &self.steps
    }

    /// Colour for a bin. Out-of-range indices clamp to the last step.
    pub fn color(&self, index: usize) -> Color32 {
        match self.steps.get(index).or(self.steps.last()) {
            Some(&[r, g, b]) => Color32::from_rgb(r, g, b),
            None => Color32::GRAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Shading
// ---------------------------------------------------------------------------

/// Side faces of an extruded hexagon: same hue, less light.
pub fn shade(color: Color32, amount: f32) -> Color32 {
    let hsl: Hsl = to_srgb(color).into_color();
    from_hsl(hsl.darken(amount), color.a())
}

/// Hover highlight.
pub fn highlight(color: Color32, amount: f32) -> Color32 {
    let hsl: Hsl = to_srgb(color).into_color();
    from_hsl(hsl.lighten(amount), color.a())
}

fn to_srgb(color: Color32) -> Srgb {
    Srgb::new(color.r(), color.g(), color.b()).into_format()
}

fn from_hsl(hsl: Hsl, alpha: u8) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgba_unmultiplied(rgb.red, rgb.green, rgb.blue, alpha)
}
