//! Background chroma keying

use tiny_skia::{Pixmap, PremultipliedColorU8};

use crate::ui::theme::Rgb;

/// Rule deciding whether a pixel counts as the key colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMatch {
    /// All three channels equal the key
    #[default]
    Exact,
    /// Every channel within `n` of the key
    Tolerance(u8),
}

impl ColorMatch {
    pub fn matches(&self, pixel: Rgb, key: Rgb) -> bool {
        match *self {
            ColorMatch::Exact => pixel == key,
            ColorMatch::Tolerance(n) => {
                pixel.r.abs_diff(key.r) <= n
                    && pixel.g.abs_diff(key.g) <= n
                    && pixel.b.abs_diff(key.b) <= n
            }
        }
    }
}

/// Makes every pixel matching `key` fully transparent
///
/// Pixels are compared on their demultiplied colour. Pixels that are already
/// fully transparent are left alone. Returns the number of pixels keyed.
pub fn chroma_key(pixmap: &mut Pixmap, key: Rgb, rule: ColorMatch) -> usize {
    let mut keyed = 0;
    for pixel in pixmap.pixels_mut() {
        if pixel.alpha() == 0 {
            continue;
        }
        let color = pixel.demultiply();
        if rule.matches(Rgb::new(color.red(), color.green(), color.blue()), key) {
            *pixel = PremultipliedColorU8::TRANSPARENT;
            keyed += 1;
        }
    }
    keyed
}
