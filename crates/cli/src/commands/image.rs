//! Cloudinary URL helper.
//!
//! Needs `CLOUDINARY_CLOUD_NAME` in the environment (or `.env`).

use std::io::Write;

use alltagsgold_storefront::images::{ImageOptimizer, ImagePreset, Transform};

/// What to print for the source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Image,
    Video,
    Responsive,
}

/// Print the rewritten URL(s).
///
/// # Errors
///
/// Returns an error for an unknown preset, a missing cloud name, or if
/// stdout is closed.
pub fn print_url(
    url: &str,
    preset: Option<&str>,
    transform: Option<&str>,
    output: Output,
) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cloud_name = std::env::var("CLOUDINARY_CLOUD_NAME")
        .ok()
        .filter(|c| !c.trim().is_empty())
        .ok_or("CLOUDINARY_CLOUD_NAME not set")?;
    let optimizer = ImageOptimizer::new(cloud_name);

    let transform = match (preset, transform) {
        (Some(name), _) => Transform::Preset(name.parse::<ImagePreset>()?),
        (None, Some(raw)) => Transform::Raw(raw),
        (None, None) => Transform::Preset(ImagePreset::default()),
    };

    let mut stdout = std::io::stdout().lock();
    match output {
        Output::Image => writeln!(stdout, "{}", optimizer.image_url(url, transform))?,
        Output::Video => {
            let raw = match transform {
                Transform::Raw(raw) => Some(raw),
                Transform::Preset(_) => None,
            };
            writeln!(stdout, "{}", optimizer.video_url(url, raw))?;
        }
        Output::Responsive => {
            let sizes = optimizer.responsive_sizes(url);
            writeln!(stdout, "{}", serde_json::to_string_pretty(&sizes)?)?;
        }
    }
    Ok(())
}
