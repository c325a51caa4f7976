//! Decorative patient avatars.
//!
//! Avatars are a pure function of a seed (the patient id): the same seed always yields the
//! same image. [`AvatarGenerator`] keeps the image style swappable; [`IdenticonAvatars`] is the
//! built-in style, a mirrored 5x5 block pattern coloured from the seed's SHA-256 digest.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Rendering options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AvatarOptions {
    /// Width and height in pixels.
    pub size: u32,
    /// Corner radius as a percentage of the size (0 = square, 50 = circle).
    pub radius: u32,
}

impl AvatarOptions {
    pub fn new(size: u32, radius: u32) -> Self {
        Self {
            size,
            radius: radius.min(50),
        }
    }
}

/// A generated avatar image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Avatar {
    svg: String,
    colour: String,
}

impl Avatar {
    pub fn new(svg: String, colour: String) -> Self {
        Self { svg, colour }
    }

    /// SVG markup.
    pub fn svg(&self) -> &str {
        &self.svg
    }

    /// Dominant colour as `#rrggbb`, used where the image itself cannot be shown.
    pub fn colour(&self) -> &str {
        &self.colour
    }

    /// `data:image/svg+xml;base64,...` URI suitable for an `<img src>`.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/svg+xml;base64,{}", STANDARD.encode(&self.svg))
    }
}

/// Produces a deterministic avatar for a seed.
pub trait AvatarGenerator: Send + Sync {
    fn generate(&self, seed: &str, options: AvatarOptions) -> Avatar;
}

/// Mirrored 5x5 identicons.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdenticonAvatars;

const GRID: usize = 5;
const BACKGROUND: &str = "#f0f0f0";

impl AvatarGenerator for IdenticonAvatars {
    fn generate(&self, seed: &str, options: AvatarOptions) -> Avatar {
        let digest = Sha256::digest(seed.as_bytes());
        let colour = format!("#{}", hex::encode(&digest[..3]));

        // Columns 0..=2 come from the digest; 3 and 4 mirror 1 and 0.
        let mut cells = [[false; GRID]; GRID];
        for (row, cells_row) in cells.iter_mut().enumerate() {
            for col in 0..3 {
                let on = digest[3 + row * 3 + col] & 1 == 1;
                cells_row[col] = on;
                cells_row[GRID - 1 - col] = on;
            }
        }

        let rx = GRID as f64 * f64::from(options.radius) / 100.0;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {GRID} {GRID}" shape-rendering="crispEdges">"#,
            size = options.size
        );
        let _ = write!(
            svg,
            r#"<clipPath id="c"><rect width="{GRID}" height="{GRID}" rx="{rx}"/></clipPath><g clip-path="url(#c)"><rect width="{GRID}" height="{GRID}" fill="{BACKGROUND}"/>"#
        );
        for (y, cells_row) in cells.iter().enumerate() {
            for (x, on) in cells_row.iter().enumerate() {
                if *on {
                    let _ = write!(
                        svg,
                        r#"<rect x="{x}" y="{y}" width="1" height="1" fill="{colour}"/>"#
                    );
                }
            }
        }
        svg.push_str("</g></svg>");

        Avatar::new(svg, colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_avatar() {
        let gen = IdenticonAvatars;
        let options = AvatarOptions::new(100, 50);
        assert_eq!(
            gen.generate("patient-1", options),
            gen.generate("patient-1", options)
        );
    }

    #[test]
    fn different_seeds_differ() {
        let gen = IdenticonAvatars;
        let options = AvatarOptions::new(100, 50);
        assert_ne!(
            gen.generate("patient-1", options).svg(),
            gen.generate("patient-2", options).svg()
        );
    }

    #[test]
    fn colour_is_hex_triplet() {
        let avatar = IdenticonAvatars.generate("abc", AvatarOptions::new(150, 0));
        assert_eq!(avatar.colour().len(), 7);
        assert!(avatar.colour().starts_with('#'));
        assert!(avatar.svg().contains(r#"width="150""#));
        assert!(avatar.svg().contains(r#"rx="0""#));
    }

    #[test]
    fn radius_is_capped_at_circle() {
        assert_eq!(AvatarOptions::new(100, 80).radius, 50);
    }

    #[test]
    fn data_uri_is_base64_svg() {
        let avatar = IdenticonAvatars.generate("abc", AvatarOptions::new(100, 50));
        let uri = avatar.to_data_uri();
        let encoded = uri
            .strip_prefix("data:image/svg+xml;base64,")
            .expect("data uri prefix");
        let decoded = STANDARD.decode(encoded).expect("valid base64");
        assert_eq!(decoded, avatar.svg().as_bytes());
    }
}
